//! `bangler` command-line front end: interactive and one-shot quoting over
//! the wizard and pricing engine.

pub mod args;
pub mod commands;
pub mod display;
pub mod session;

pub use args::{Cli, Commands, PriceArgs};
pub use commands::App;
