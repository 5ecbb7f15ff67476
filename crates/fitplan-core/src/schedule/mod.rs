//! Expansion of plan templates into dated, user-owned schedules, and the
//! subscription workflows built on it.

mod generator;
pub mod lifecycle;

pub use generator::{ScheduledWorkoutDraft, WorkoutLookup, end_date, generate, slot_date};
pub use lifecycle::{
    GenerationSummary, get_subscription, list_subscriptions, regenerate, reschedule, subscribe,
    unsubscribe, update_status,
};
