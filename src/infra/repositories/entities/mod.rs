//! SeaORM entity definitions.
//!
//! Database rows are kept separate from the domain models; each module
//! converts its `Model` into the matching domain type.

pub mod category;
pub mod history;
pub mod order;
pub mod product;
pub mod user;
