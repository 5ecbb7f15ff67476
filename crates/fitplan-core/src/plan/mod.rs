//! Plan authoring: the TOML file format, its parser, the service layer
//! that writes plans and slots, and export back to TOML.

pub mod export;
pub mod parser;
pub mod service;
pub mod toml_format;

pub use export::{export_plan_toml, plan_to_toml};
pub use parser::{PlanParseError, check_slot, parse_plan_toml, validate_plan};
pub use service::{create_plan_from_toml, delete_plan, get_plan_with_slots, replace_plan_slots};
pub use toml_format::{PlanMeta, PlanToml, SlotToml};
