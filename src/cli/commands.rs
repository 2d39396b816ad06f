//! CLI command implementations
//!
//! Every command builds the same service state: the standard dataset
//! registry, an in-memory store with one table per dataset layout, the
//! configured fixtures loaded into it, and the token registry.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiError, ApiHandler, EpidataResponse, QueryParams, ServiceState, DEFAULT_ROW_CAP};
use crate::auth::{TokenConfig, TokenRegistry};
use crate::datasets::DatasetRegistry;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::LogFormat;
use crate::stream::MemoryStore;

use super::args::{Command, RequestArgs};
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    /// Maximum rows per response (default 3650)
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub tokens: TokenConfig,

    /// JSON fixture files loaded into the store at startup; relative paths
    /// are resolved against the config file's directory
    #[serde(default)]
    pub fixtures: Vec<PathBuf>,
}

fn default_row_cap() -> usize {
    DEFAULT_ROW_CAP
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            row_cap: default_row_cap(),
            log_format: LogFormat::default(),
            tokens: TokenConfig::default(),
            fixtures: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        if let Some(base) = path.parent() {
            config.fixtures = config
                .fixtures
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.row_cap == 0 {
            return Err(CliError::config_error("row_cap must be > 0"));
        }
        if self.tokens.max_comparisons == 0 {
            return Err(CliError::config_error("tokens.max_comparisons must be > 0"));
        }
        Ok(())
    }
}

/// Builds the handler: registry, store, fixtures, tokens.
pub fn build_handler(config: &Config) -> CliResult<ApiHandler> {
    let datasets = DatasetRegistry::standard();
    let store = MemoryStore::new();
    for layout in datasets.layouts() {
        store
            .create_table(layout)
            .map_err(|e| CliError::boot_failed(e.to_string()))?;
    }
    for fixture in &config.fixtures {
        store
            .load_fixture(fixture)
            .map_err(|e| CliError::boot_failed(e.to_string()))?;
    }

    let tokens = TokenRegistry::from_config(&config.tokens);
    let state = ServiceState::new(Arc::new(store), Arc::new(datasets), Arc::new(tokens))
        .with_row_cap(config.row_cap);
    Ok(ApiHandler::new(state))
}

/// Dispatches a parsed command.
pub fn run_command(config: &Config, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { port } => serve(config, port),
        Command::Query(args) => query(config, &args, &mut io::stdout().lock()),
        Command::Explain(args) => explain(config, &args, &mut io::stdout().lock()),
    }
}

/// Serves the HTTP API until the process is stopped.
pub fn serve(config: &Config, port: Option<u16>) -> CliResult<()> {
    let handler = build_handler(config)?;
    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }

    let server = HttpServer::new(server_config, handler);
    info!(
        addr = %server.socket_addr(),
        row_cap = config.row_cap,
        fixtures = config.fixtures.len(),
        "starting epidata server"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Runs one request and writes the response body.
pub fn query<W: Write>(config: &Config, args: &RequestArgs, out: &mut W) -> CliResult<()> {
    let handler = build_handler(config)?;
    let params = QueryParams::from_pairs(args.params.iter().cloned());
    let response = handler.handle(&args.source, &params);

    out.write_all(&response.body)?;
    if !response.body.ends_with(b"\n") {
        writeln!(out)?;
    }
    out.flush()?;

    if response.status != 200 {
        return Err(CliError::request_failed(response.status));
    }
    Ok(())
}

/// Prints the planned sub-queries and their SQL without touching storage.
pub fn explain<W: Write>(config: &Config, args: &RequestArgs, out: &mut W) -> CliResult<()> {
    let params = QueryParams::from_pairs(args.params.iter().cloned());
    let datasets = DatasetRegistry::standard();

    let plan = plan_json(&datasets, &args.source, &params, config.row_cap);
    let (value, status) = match plan {
        Ok(value) => (value, 200),
        Err(err) => {
            let response = EpidataResponse::error(&err);
            (serde_json::from_slice(&response.body)?, response.status)
        }
    };

    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)?;
    out.flush()?;

    if status != 200 {
        return Err(CliError::request_failed(status));
    }
    Ok(())
}

fn plan_json(
    datasets: &DatasetRegistry,
    source: &str,
    params: &QueryParams,
    row_cap: usize,
) -> Result<Value, ApiError> {
    let dataset = datasets
        .get(source)
        .ok_or_else(|| ApiError::unknown_source(source))?;
    dataset.check_required(params)?;

    let mut queries = Vec::new();
    for query in dataset.plan(params)? {
        let sql = query.to_sql(row_cap + 1)?;
        queries.push(json!({
            "label": query.label,
            "table": query.layout.name(),
            "version": query.version.describe(),
            "sql": sql.text,
            "params": sql.params,
        }));
    }
    Ok(json!({ "source": source, "sub_queries": queries }))
}
