//! Core data models.

mod ids;
mod opponent;
mod record;
mod stats;

pub use ids::*;
pub use opponent::*;
pub use record::*;
pub use stats::*;
