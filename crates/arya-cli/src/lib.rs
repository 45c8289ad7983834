//! Desktop activity recorder CLI library.
//!
//! This crate provides the command-line host for the arya recorder.

mod cli;
pub mod commands;
mod config;
pub mod session;

pub use cli::{Cli, Commands, FocusArgs, RulesAction};
pub use config::Config;
