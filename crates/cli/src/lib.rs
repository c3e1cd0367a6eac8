//! `invoice-builder` command-line front end.
//!
//! The binary is a thin shell: every decision lives in the domain and infra
//! crates, this crate only parses input and renders text.

pub mod action;
pub mod app;
pub mod args;
pub mod render;
pub mod repl;

pub use app::{EXIT_ENVIRONMENT, EXIT_OK, EXIT_USAGE, execute, exit_code, load_config, run};
pub use args::{Cli, Command};
