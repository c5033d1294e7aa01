//! # Command Line Interface
//!
//! `queryset exec`, `queryset validate` and `queryset serve`. Each command
//! boots from a JSON config file, prints one JSON document to stdout and
//! logs to stderr.

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{parse_var, Cli, Command};
pub use commands::{boot, exec, run, run_command, serve, validate, Booted};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_json_to};
