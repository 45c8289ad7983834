//! CLI subcommand implementations.

pub mod observe;
pub mod reset;
pub mod rules;
pub mod stats;
pub mod util;
