//! Shared types used across the API and service layers.

mod date_range;
mod response;

pub use date_range::DateRange;
pub use response::{Created, MessageResponse};
