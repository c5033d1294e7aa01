//! CLI command implementations
//!
//! Every command boots the same way: load config, load definitions into a
//! registry, seed the in-memory store, build the executor.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;

use crate::definition::{DefinitionLoader, DefinitionRegistry, SetLookup};
use crate::engine::{ExecOptions, ExecutionContext, SetExecutor, SetResult};
use crate::http_server::{ExecState, HttpServer};
use crate::masking::MaskType;
use crate::observability::{init_logging, Event, DEFAULT_LOG_FILTER};
use crate::store::{InMemoryStore, SessionPool};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Everything a command needs after boot
pub struct Booted {
    pub registry: Arc<DefinitionRegistry>,
    pub executor: Arc<SetExecutor>,
    pub query_timeout: Duration,
}

impl Booted {
    /// HTTP state sharing this boot's registry and executor
    pub fn exec_state(&self) -> ExecState {
        ExecState::new(
            self.registry.clone(),
            self.executor.clone(),
            self.query_timeout,
        )
    }
}

/// Parse arguments, install logging and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(DEFAULT_LOG_FILTER, cli.json_logs);
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Exec {
            config,
            set,
            vars,
            explain,
        } => exec(&config, &set, vars.into_iter().collect(), explain),
        Command::Validate { config } => validate(&config),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Load definitions and data described by `config` and build an executor
pub fn boot(config: &Config) -> CliResult<Booted> {
    let registry = Arc::new(DefinitionRegistry::new());
    let summary = DefinitionLoader::new(config.definitions_path()).load_into(&registry)?;

    let store = InMemoryStore::new();
    let collections = store.load_dir(config.data_path())?;

    let pool = SessionPool::new(Arc::new(store), config.max_sessions);
    let executor = SetExecutor::new(pool, registry.clone(), registry.clone(), registry.clone());

    info!(
        event = Event::BootComplete.as_str(),
        sets = summary.sets,
        scripts = summary.scripts,
        regexes = summary.regexes,
        masks = summary.masks,
        collections = collections,
        max_sessions = config.max_sessions
    );

    Ok(Booted {
        registry,
        executor: Arc::new(executor),
        query_timeout: config.query_timeout(),
    })
}

/// Execute one set and print its result.
///
/// The result is printed even when it is an error result; the command then
/// also fails so the exit code reflects it.
pub fn exec(
    config_path: &Path,
    set_name: &str,
    vars: HashMap<String, String>,
    explain: bool,
) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let booted = boot(&config)?;

    let result = match booted.registry.set_by_name(set_name) {
        Ok(set) => {
            let rt = runtime()?;
            rt.block_on(async {
                let ctx = ExecutionContext::new().with_timeout(booted.query_timeout);
                booted
                    .executor
                    .execute(&set, vars, &ctx, &ExecOptions { explain })
                    .await
            })
        }
        Err(e) => SetResult::Failure(e.to_string()),
    };

    write_json(&result)?;

    match result.error_message() {
        Some(message) => Err(CliError::exec_failed(message)),
        None => Ok(()),
    }
}

/// Load every definition and data file, then check cross references and
/// mask types.
pub fn validate(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let booted = boot(&config)?;
    let registry = &booted.registry;

    let mut problems = registry.unresolved_references()?;
    for mask in registry.masks()? {
        if let Err(reason) = MaskType::from_str(&mask.mask_type) {
            problems.push(format!(
                "mask \"{}.{}\": {}",
                mask.collection, mask.field, reason
            ));
        }
    }

    let (sets, scripts, regexes, masks) = registry.counts()?;
    write_json(&json!({
        "valid": problems.is_empty(),
        "sets": sets,
        "scripts": scripts,
        "regexes": regexes,
        "masks": masks,
        "problems": problems,
    }))?;

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CliError::definition_error(format!(
            "{} definition problem(s) found",
            problems.len()
        )))
    }
}

/// Start the HTTP execution server and block until it stops
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }
    let booted = boot(&config)?;

    let server = HttpServer::new(config.http.clone(), booted.exec_state());

    let rt = runtime()?;
    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}
