//! Core data models for the statistics engine.

mod badge;
mod hypothesis;
mod ids;
mod player;
mod ranking;
mod stats;

pub use badge::*;
pub use hypothesis::*;
pub use ids::*;
pub use player::*;
pub use ranking::*;
pub use stats::*;
