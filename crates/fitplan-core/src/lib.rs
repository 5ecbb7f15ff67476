//! Domain logic for fitplan: plan expansion into dated schedules, the
//! subscription lifecycle, plan authoring, access tokens, the nutrition
//! catalog and the diet diary.

pub mod diet;
pub mod error;
pub mod nutrition;
pub mod plan;
pub mod schedule;
pub mod token;
pub mod workout;
pub mod workout_log;

pub use error::ServiceError;
