//! Per-table query functions.
//!
//! Functions that only ever run a single statement accept any
//! [`sqlx::PgExecutor`], so callers can pass either `&PgPool` or
//! `&mut *tx` from an open transaction.

pub mod food_entries;
pub mod nutrition_goals;
pub mod plan_slots;
pub mod plans;
pub mod recent_foods;
pub mod scheduled_workouts;
pub mod subscriptions;
pub mod users;
pub mod workouts;
