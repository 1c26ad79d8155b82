//! Source definitions
//!
//! A definition is a YAML document naming one page source plus the
//! pagination limits to apply to it:
//!
//! ```yaml
//! name: incidents
//! batch_size: 100
//! max_rows: 1000
//! source:
//!   type: http
//!   url: "https://{{ config.project }}.supabase.co/rest/v1/incidents"
//!   offset_style: { type: range_header }
//!   headers: { apikey: "{{ env.SUPABASE_KEY }}" }
//! ```
//!
//! Definitions are loaded and validated as written, then resolved against a
//! [`TemplateContext`] before a fetcher is built from them.

use crate::database::{
    mask_password, DatabaseConnection, DatabaseEngine, DatabasePageFetcher, DatabaseSource, DbType,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, HttpPageFetcher, OffsetStyle, RateLimiterConfig};
use crate::pagination::{BoundedPaginator, DynValueFetcher, PaginationConfig};
use crate::template::{self, render_field, TemplateContext};
use crate::types::{BackoffType, StringMap};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Replacement shown for secrets in [`SourceDefinition::masked`]
pub const MASK: &str = "********";

// ============================================================================
// Definition
// ============================================================================

/// Complete source definition loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Source name, used in logs
    pub name: String,

    /// `batch_size` / `max_rows` at the top level of the document
    #[serde(flatten)]
    pub pagination: PaginationConfig,

    /// Where pages come from
    pub source: SourceConfig,
}

/// Page source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON REST endpoint
    Http(HttpSourceConfig),
    /// SQL table or query
    Database(DatabaseSourceConfig),
}

impl SourceConfig {
    /// Source kind as written in YAML
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Database(_) => "database",
        }
    }
}

/// HTTP source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Endpoint URL
    pub url: String,

    /// Dot path to the records array (root when absent)
    #[serde(default)]
    pub records_path: Option<String>,

    /// How offsets are sent
    #[serde(default)]
    pub offset_style: OffsetStyle,

    /// Static headers sent with every page request
    #[serde(default)]
    pub headers: StringMap,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per page request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Optional client-side rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl HttpSourceConfig {
    /// Settings for `url` with every other field defaulted
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            records_path: None,
            offset_style: OffsetStyle::default(),
            headers: StringMap::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            rate_limit: None,
        }
    }

    /// HTTP client configuration for this source
    pub fn client_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(self.backoff, defaults.initial_backoff, defaults.max_backoff);

        if let Some(ref rate_limit) = self.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

/// Database source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSourceConfig {
    /// Database engine
    #[serde(default)]
    pub engine: DbType,

    /// Connection string or parameters
    #[serde(flatten)]
    pub connection: DatabaseConnection,

    /// Table or query, plus ordering
    #[serde(flatten)]
    pub source: DatabaseSource,
}

// ============================================================================
// Loading
// ============================================================================

/// Load a definition from a YAML file
pub fn load_definition(path: impl AsRef<Path>) -> Result<SourceDefinition> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read definition '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_definition_from_str(&content)
}

/// Load a definition from a YAML string
pub fn load_definition_from_str(yaml: &str) -> Result<SourceDefinition> {
    let def: SourceDefinition = serde_yaml::from_str(yaml)?;
    def.validate()?;
    Ok(def)
}

impl SourceDefinition {
    /// Check required fields
    ///
    /// Non-positive limits pass: they resolve to an empty fetch and are
    /// reported by [`SourceDefinition::warnings`] instead.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("Source name cannot be empty"));
        }

        match &self.source {
            SourceConfig::Http(http) => {
                if http.url.trim().is_empty() {
                    return Err(Error::config(format!(
                        "Source '{}' url cannot be empty",
                        self.name
                    )));
                }
                if let Some(ref rate_limit) = http.rate_limit {
                    if rate_limit.requests_per_second == 0 {
                        return Err(Error::invalid_value(
                            "rate_limit.requests_per_second",
                            "must be greater than 0",
                        ));
                    }
                }
            }
            SourceConfig::Database(db) => db.source.validate()?,
        }

        Ok(())
    }

    /// Problems that do not prevent loading but make fetches return nothing
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.pagination.batch_size <= 0 {
            warnings.push(format!(
                "batch_size is {}; fetches will return no rows",
                self.pagination.batch_size
            ));
        }
        if self.pagination.max_rows <= 0 {
            warnings.push(format!(
                "max_rows is {}; fetches will return no rows",
                self.pagination.max_rows
            ));
        }
        if let SourceConfig::Database(ref db) = self.source {
            if db.source.order_by.is_none() {
                warnings.push(
                    "no order_by set; page boundaries depend on the database's row order"
                        .to_string(),
                );
            }
        }
        warnings
    }

    /// Template variables referenced anywhere in the source
    pub fn variables(&self) -> Vec<String> {
        self.template_fields()
            .into_iter()
            .flat_map(template::extract_variables)
            .collect()
    }

    fn template_fields(&self) -> Vec<&str> {
        match &self.source {
            SourceConfig::Http(http) => std::iter::once(http.url.as_str())
                .chain(http.records_path.as_deref())
                .chain(http.headers.values().map(String::as_str))
                .collect(),
            SourceConfig::Database(db) => [
                db.connection.connection_string.as_deref(),
                db.connection.host.as_deref(),
                db.connection.database.as_deref(),
                db.connection.user.as_deref(),
                db.connection.password.as_deref(),
                db.source.table.as_deref(),
                db.source.query.as_deref(),
                db.source.order_by.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }

    /// Render every templated string field against `ctx`
    pub fn resolve(&self, ctx: &TemplateContext) -> Result<Self> {
        let mut resolved = self.clone();
        match &mut resolved.source {
            SourceConfig::Http(http) => {
                http.url = template::render(&http.url, ctx)?;
                render_field(&mut http.records_path, ctx)?;
                for value in http.headers.values_mut() {
                    *value = template::render(value, ctx)?;
                }
            }
            SourceConfig::Database(db) => {
                render_field(&mut db.connection.connection_string, ctx)?;
                render_field(&mut db.connection.host, ctx)?;
                render_field(&mut db.connection.database, ctx)?;
                render_field(&mut db.connection.user, ctx)?;
                render_field(&mut db.connection.password, ctx)?;
                render_field(&mut db.source.table, ctx)?;
                render_field(&mut db.source.query, ctx)?;
                render_field(&mut db.source.order_by, ctx)?;
            }
        }
        Ok(resolved)
    }

    /// Copy with header values and database credentials hidden
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        match &mut masked.source {
            SourceConfig::Http(http) => {
                for value in http.headers.values_mut() {
                    *value = MASK.to_string();
                }
            }
            SourceConfig::Database(db) => {
                if db.connection.password.is_some() {
                    db.connection.password = Some(MASK.to_string());
                }
                if let Some(ref conn_str) = db.connection.connection_string {
                    db.connection.connection_string = Some(mask_password(conn_str));
                }
            }
        }
        masked
    }

    /// Paginator configured with this definition's limits
    pub fn paginator(&self) -> BoundedPaginator {
        BoundedPaginator::new(self.pagination)
    }

    /// Build the page fetcher for a resolved definition
    pub fn build_fetcher(&self) -> Result<Box<DynValueFetcher>> {
        match &self.source {
            SourceConfig::Http(http) => {
                url::Url::parse(&http.url)?;
                let client = HttpClient::with_config(http.client_config())?;
                let mut fetcher = HttpPageFetcher::new(client, &http.url)
                    .with_offset_style(http.offset_style.clone());
                if let Some(ref path) = http.records_path {
                    fetcher = fetcher.with_records_path(path);
                }
                Ok(Box::new(fetcher))
            }
            SourceConfig::Database(db) => {
                let engine = DatabaseEngine::open(db.engine, &db.connection)?;
                Ok(Box::new(DatabasePageFetcher::new(engine, &db.source)?))
            }
        }
    }
}
