//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{AccessConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::http::{static_headers, Headers, Request, Resource, Transport};
use crate::pagination::Paginator;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Get {
                uri,
                no_cache,
                headers,
            } => self.get(uri, *no_cache, headers).await,
            Commands::Pages {
                uri,
                items,
                max_pages,
                headers,
            } => self.pages(uri, *items, *max_pages, headers).await,
            Commands::CheckConfig => self.check_config(),
        }
    }

    /// Load the access config, or defaults when none was given
    fn load_config(&self) -> Result<AccessConfig> {
        match &self.cli.config {
            Some(path) => AccessConfig::load(path),
            None => Ok(AccessConfig::default()),
        }
    }

    async fn get(&self, uri: &str, no_cache: bool, headers: &[String]) -> Result<()> {
        let transport = self.load_config()?.build()?;
        let mut request = Request::get(uri).static_headers(parse_headers(headers)?);
        if no_cache {
            request = request.no_cache();
        }

        let start = Instant::now();
        let resource = transport.execute(request).await?;
        debug!(
            "GET {uri} -> {} in {}ms",
            resource.status(),
            start.elapsed().as_millis()
        );

        self.output_message(&json!({
            "type": "RESOURCE",
            "resource": resource_json(&resource),
        }));
        Ok(())
    }

    async fn pages(
        &self,
        uri: &str,
        items: bool,
        max_pages: Option<usize>,
        headers: &[String],
    ) -> Result<()> {
        let transport: Arc<dyn Transport> = self.load_config()?.build()?;
        let paginator =
            Paginator::new(transport, uri).with_headers(static_headers(parse_headers(headers)?));
        let limit = max_pages.unwrap_or(usize::MAX);

        let start = Instant::now();
        let mut pages = paginator.pages();
        let mut records = 0usize;
        while pages.pages_fetched() < limit && pages.has_next().await? {
            let page = pages.next_page().await?;
            if items {
                for item in page.into_items() {
                    records += 1;
                    self.output_message(&json!({ "type": "RECORD", "record": item }));
                }
            } else {
                self.output_message(&json!({
                    "type": "PAGE",
                    "page": pages.pages_fetched(),
                    "resource": resource_json(&page),
                }));
            }
        }

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Fetched {} pages ({} records) in {}ms",
                    pages.pages_fetched(),
                    records,
                    start.elapsed().as_millis()
                )
            }
        }));
        Ok(())
    }

    fn check_config(&self) -> Result<()> {
        let config = self.load_config()?;
        // Opening the store surfaces unreadable paths and database errors.
        config.open_store()?;

        let store = match &config.store {
            StoreConfig::Memory => "memory".to_string(),
            StoreConfig::File { path } => format!("file {}", path.display()),
            StoreConfig::Duckdb { path: Some(path) } => format!("duckdb {}", path.display()),
            StoreConfig::Duckdb { path: None } => "duckdb (in-memory)".to_string(),
        };

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Config is valid: base_url={}, store={store}, cache={}, anonymous={}",
                    config.http.base_url.as_deref().unwrap_or("none"),
                    if config.cache.enabled { "enabled" } else { "disabled" },
                    config.credentials.is_anonymous()
                )
            }
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Parse `Name: value` header arguments
fn parse_headers(args: &[String]) -> Result<Headers> {
    args.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once(':')
                .ok_or_else(|| Error::invalid_header(arg, "expected 'Name: value'"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::invalid_header(arg, "empty header name"));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn resource_json(resource: &Resource) -> Value {
    let mut headers = Map::new();
    for (name, value) in resource.headers().iter() {
        if let Value::Array(values) = headers
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            values.push(Value::String(value.to_string()));
        }
    }

    json!({
        "status": resource.status(),
        "headers": headers,
        "body": resource.body(),
    })
}
