//! REST page fetcher
//!
//! Maps a [`PageRequest`] onto a JSON endpoint, either as offset/limit query
//! parameters or as a PostgREST-style `Range` header.

use super::client::{HttpClient, PageParams};
use crate::error::{Error, Result};
use crate::pagination::{PageFetcher, PageRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How `(offset, limit)` is encoded in the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OffsetStyle {
    /// `?offset=N&limit=M`
    Query {
        /// Query parameter name for offset
        #[serde(default = "default_offset_param")]
        offset_param: String,
        /// Query parameter name for limit
        #[serde(default = "default_limit_param")]
        limit_param: String,
    },
    /// `Range-Unit: items` + `Range: N-(N+M-1)`
    RangeHeader,
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

impl Default for OffsetStyle {
    fn default() -> Self {
        Self::Query {
            offset_param: default_offset_param(),
            limit_param: default_limit_param(),
        }
    }
}

impl OffsetStyle {
    /// Query parameter style with custom names (e.g. `skip` / `take`)
    pub fn query(offset_param: impl Into<String>, limit_param: impl Into<String>) -> Self {
        Self::Query {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
        }
    }

    /// Query parameters and headers for a page
    pub fn page_params(&self, request: PageRequest) -> PageParams {
        match self {
            Self::Query {
                offset_param,
                limit_param,
            } => PageParams::new()
                .query(offset_param, request.offset.to_string())
                .query(limit_param, request.limit.to_string()),
            Self::RangeHeader => PageParams::new()
                .header("Range-Unit", "items")
                .header(
                    "Range",
                    format!("{}-{}", request.offset, request.last_index()),
                ),
        }
    }
}

/// Page fetcher over a JSON REST endpoint
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: HttpClient,
    url: String,
    records_path: Option<String>,
    offset_style: OffsetStyle,
}

impl HttpPageFetcher {
    /// Create a fetcher for the absolute endpoint `url`
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            records_path: None,
            offset_style: OffsetStyle::default(),
        }
    }

    /// Read records from a nested array instead of the body root
    #[must_use]
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Set how offsets are encoded
    #[must_use]
    pub fn with_offset_style(mut self, style: OffsetStyle) -> Self {
        self.offset_style = style;
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    type Item = Value;
    type Error = Error;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Value>> {
        debug!(
            url = %self.url,
            offset = request.offset,
            limit = request.limit,
            "Fetching page"
        );

        let params = self.offset_style.page_params(request);
        let body = match self.client.get_page(&self.url, request, &params).await {
            Ok(body) => body,
            // PostgREST answers a range past the end with 416 instead of an empty array
            Err(Error::HttpStatus { status: 416, .. })
                if self.offset_style == OffsetStyle::RangeHeader =>
            {
                debug!(offset = request.offset, "Range not satisfiable, treating as end of data");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let records = extract_records(body, self.records_path.as_deref())?;
        debug!(count = records.len(), "Fetched page");
        Ok(records)
    }
}

/// Pull the record array out of a response body
///
/// `path` is a dotted object path such as `data.items` or `$.data.items`.
/// With no path the body itself must be an array.
pub fn extract_records(body: Value, path: Option<&str>) -> Result<Vec<Value>> {
    let path = path
        .map(|p| p.strip_prefix("$.").unwrap_or(p))
        .filter(|p| !p.is_empty() && *p != "$");

    let mut current = body;
    if let Some(path) = path {
        for part in path.split('.') {
            current = match current {
                Value::Object(mut map) => map.remove(part).ok_or_else(|| {
                    Error::record_extraction(path, format!("missing field '{part}'"))
                })?,
                _ => {
                    return Err(Error::record_extraction(
                        path,
                        format!("cannot index '{part}' into a non-object"),
                    ))
                }
            };
        }
    }

    match current {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::record_extraction(
            path.unwrap_or("$"),
            format!("expected an array, found {}", json_type_name(&other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
