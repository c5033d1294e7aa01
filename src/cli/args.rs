//! CLI argument definitions using clap
//!
//! Commands:
//! - queryset exec --config <path> --set <name> [--var k=v]... [--explain]
//! - queryset validate --config <path>
//! - queryset serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// queryset - execute parameterized, chained aggregation query sets
#[derive(Parser, Debug)]
#[command(name = "queryset")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines instead of text
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one set and print its result
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./queryset.json")]
        config: PathBuf,

        /// Name of the set to execute
        #[arg(long)]
        set: String,

        /// Input variable, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Print substituted pipelines instead of running them
        #[arg(long)]
        explain: bool,
    },

    /// Load every definition and check cross references
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./queryset.json")]
        config: PathBuf,
    },

    /// Start the HTTP execution server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./queryset.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Split `key=value`. The value may itself contain `=`.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{}\"", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("id=42021").unwrap(),
            ("id".to_string(), "42021".to_string())
        );
        assert_eq!(
            parse_var("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_var("empty=").unwrap().1, "");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_exec_args() {
        let cli = Cli::try_parse_from([
            "queryset", "exec", "--set", "stations", "--var", "id=42021", "--var", "from=2020-01-01",
            "--explain",
        ])
        .unwrap();

        match cli.command {
            Command::Exec {
                config,
                set,
                vars,
                explain,
            } => {
                assert_eq!(config, PathBuf::from("./queryset.json"));
                assert_eq!(set, "stations");
                assert_eq!(vars.len(), 2);
                assert!(explain);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_exec_requires_set() {
        assert!(Cli::try_parse_from(["queryset", "exec"]).is_err());
    }
}
