//! Argument parsing and command dispatch for the `brezel` binary.

use anyhow::{Context, Result};
use brezel_client::model::EntityHandle;
use brezel_client::{Client, ClientConfig, ListQuery};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "brezel")]
#[command(about = "Query a Brezel system from the command line")]
pub struct Args {
    /// Base URL of the Brezel API
    #[arg(long, env = "BREZEL_API_URL")]
    pub api_url: String,

    /// System (tenant) to address
    #[arg(short, long, env = "BREZEL_SYSTEM")]
    pub system: String,

    /// API key, sent as X-API-Key
    #[arg(long, env = "BREZEL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bearer token, used when no API key is given
    #[arg(long, env = "BREZEL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL for share links
    #[arg(long, env = "BREZEL_SHARE_URL")]
    pub share_url: Option<String>,

    /// Act as this user id
    #[arg(long)]
    pub impersonate: Option<i64>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the system's general information
    Info,
    /// List the entities of a module
    List {
        module: String,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Pre-filters as a JSON object, e.g. '{"status":"open"}'
        #[arg(long, value_parser = parse_filters)]
        filters: Option<Map<String, Value>>,
        #[arg(long)]
        results: Option<u32>,
        /// Relations to load, comma separated
        #[arg(long, value_delimiter = ',')]
        with: Vec<String>,
    },
    /// Fetch one entity
    Get { module: String, id: i64 },
    /// Print the public URL of a shared file
    ShareUrl { token: String },
}

fn parse_filters(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(e.to_string()),
    }
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            system: self.system.clone(),
            api_key: self.api_key.clone(),
            bearer_token: self.token.clone(),
            share_url: self.share_url.clone(),
            impersonate_user_id: self.impersonate,
            timeout_secs: self.timeout,
            ..Default::default()
        }
    }
}

impl Command {
    /// The listing parameters of a `list` command.
    pub fn list_query(&self) -> Option<ListQuery> {
        let Command::List { page, filters, results, with, .. } = self else {
            return None;
        };
        let mut query = ListQuery::new().page(*page);
        if let Some(filters) = filters {
            query.filters = filters.clone();
        }
        query.results = *results;
        query.with = with.iter().filter(|w| !w.is_empty()).cloned().collect();
        Some(query)
    }
}

/// Runs `command` against `client` and returns what to print.
pub async fn run(client: &Client, command: &Command) -> Result<Value> {
    debug!(?command, system = client.system(), "running command");
    match command {
        Command::Info => client
            .get_general_info()
            .await
            .context("failed to fetch general info"),
        Command::List { module, .. } => {
            let query = command.list_query().unwrap_or_default();
            let entities = client
                .get_entities(module, &query)
                .await
                .with_context(|| format!("failed to list {module}"))?;
            Ok(Value::Array(
                entities.iter().map(|e| Value::Object(e.to_exportable())).collect(),
            ))
        }
        Command::Get { module, id } => {
            let entity = client
                .get_entity(module, *id)
                .await
                .with_context(|| format!("failed to fetch {module}/{id}"))?;
            match entity {
                Some(entity) => Ok(Value::Object(entity.to_exportable())),
                None => {
                    warn!(module = %module, id, "entity not found");
                    Ok(Value::Null)
                }
            }
        }
        Command::ShareUrl { token } => Ok(Value::String(client.get_shared_file_url(token))),
    }
}
