//! Command-line interface: `serve`, `migrate` and `admin`.

pub mod args;

pub use args::{Cli, Commands};
