//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_definition, SourceDefinition};
use crate::error::{Error, Result, ResultExt};
use crate::pagination::{DynValueFetcher, PageRequest};
use crate::template::TemplateContext;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

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
            Commands::Fetch {
                batch_size,
                max_rows,
                output,
            } => self.fetch(*batch_size, *max_rows, output.as_deref()).await,
            Commands::Check => self.check().await,
            Commands::Validate => self.validate(),
            Commands::Show => self.show(),
        }
    }

    /// Load the definition as written
    fn load_definition(&self) -> Result<SourceDefinition> {
        let path = self
            .cli
            .definition
            .as_ref()
            .ok_or_else(|| Error::config("Definition file not specified (use -d flag)"))?;
        load_definition(path)
    }

    /// Load template configuration
    fn load_config(&self) -> Result<Value> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        Ok(json!({}))
    }

    /// Load the definition and render its templates
    fn resolve_definition(&self) -> Result<SourceDefinition> {
        let definition = self.load_definition()?;
        let context = TemplateContext::with_config(self.load_config()?).with_process_env();
        definition
            .resolve(&context)
            .with_context(|| format!("Failed to resolve source '{}'", definition.name))
    }

    /// Fetch rows and write them out
    async fn fetch(
        &self,
        batch_size: Option<i64>,
        max_rows: Option<i64>,
        output: Option<&Path>,
    ) -> Result<()> {
        let mut definition = self.resolve_definition()?;
        if let Some(batch_size) = batch_size {
            definition.pagination = definition.pagination.with_batch_size(batch_size);
        }
        if let Some(max_rows) = max_rows {
            definition.pagination = definition.pagination.with_max_rows(max_rows);
        }
        for warning in definition.warnings() {
            warn!(source = %definition.name, "{warning}");
        }

        let fetcher = definition.build_fetcher()?;
        let paginator = definition.paginator();

        info!(
            source = %definition.name,
            kind = definition.source.kind(),
            batch_size = definition.pagination.batch_size,
            max_rows = definition.pagination.max_rows,
            "Starting fetch"
        );
        let start = Instant::now();
        let rows = paginator
            .fetch_all_values(fetcher.as_ref())
            .await
            .with_context(|| format!("Fetch from '{}' failed", definition.name))?;
        info!(
            source = %definition.name,
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch complete"
        );

        let rendered = render_rows(&rows, self.cli.format)?;
        match output {
            Some(path) => {
                fs::write(path, rendered)?;
                info!("Wrote {} rows to {}", rows.len(), path.display());
            }
            None => print!("{rendered}"),
        }
        Ok(())
    }

    /// Fetch one row to test the source
    async fn check(&self) -> Result<()> {
        let definition = self.resolve_definition()?;
        info!("Checking source {}", definition.name);

        let status = match definition.build_fetcher() {
            Ok(fetcher) => check_fetcher(fetcher.as_ref()).await,
            Err(e) => Err(e),
        };

        let message = match status {
            Ok(rows) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "source": definition.name,
                    "message": format!("Fetched {rows} row(s)")
                }
            }),
            Err(e) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "FAILED",
                    "source": definition.name,
                    "message": format!("Check failed: {e}")
                }
            }),
        };
        self.output_message(&message);

        Ok(())
    }

    /// Validate the definition as written
    fn validate(&self) -> Result<()> {
        let definition = self.load_definition()?;
        let warnings = definition.warnings();
        for warning in &warnings {
            warn!(source = %definition.name, "{warning}");
        }

        self.output_message(&json!({
            "type": "VALIDATION",
            "validation": {
                "status": "VALID",
                "name": definition.name,
                "source": definition.source.kind(),
                "batch_size": definition.pagination.batch_size,
                "max_rows": definition.pagination.max_rows,
                "variables": definition.variables(),
                "warnings": warnings
            }
        }));

        Ok(())
    }

    /// Print the resolved definition with secrets masked
    fn show(&self) -> Result<()> {
        let definition = self.resolve_definition()?;
        let value = serde_json::to_value(definition.masked())?;
        self.output_message(&value);
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

/// Request a single-row page; returns how many rows came back
async fn check_fetcher(fetcher: &DynValueFetcher) -> Result<usize> {
    let page = fetcher.fetch_page(PageRequest::new(0, 1)).await?;
    Ok(page.len())
}

/// Serialize rows: one compact JSON value per line, or a pretty JSON array
pub fn render_rows(rows: &[Value], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&serde_json::to_string(row)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Pretty => {
            let mut out = serde_json::to_string_pretty(rows)?;
            out.push('\n');
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::value_fetcher_fn;
    use clap::Parser;
    use futures::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const DEFINITION: &str = r#"
name: numbers
batch_size: 3
max_rows: 5
source:
  type: database
  connection_string: ":memory:"
  query: "SELECT * FROM range(10) AS t(n)"
  order_by: n
"#;

    fn definition_file(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_render_rows_json_lines() {
        let rows = vec![json!({"id": 1}), json!({"id": 2})];
        assert_eq!(
            render_rows(&rows, OutputFormat::Json).unwrap(),
            "{\"id\":1}\n{\"id\":2}\n"
        );
        assert_eq!(render_rows(&[], OutputFormat::Json).unwrap(), "");
    }

    #[test]
    fn test_render_rows_pretty() {
        let rows = vec![json!({"id": 1})];
        let out = render_rows(&rows, OutputFormat::Pretty).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_check_fetcher_requests_one_row() {
        let fetcher = value_fetcher_fn(|request: PageRequest| -> BoxFuture<'static, Result<Vec<Value>>> {
            Box::pin(async move {
                assert_eq!(request, PageRequest::new(0, 1));
                Ok(vec![json!({"id": 1})])
            })
        });
        assert_eq!(check_fetcher(&fetcher).await.unwrap(), 1);

        let failing = value_fetcher_fn(|_: PageRequest| -> BoxFuture<'static, Result<Vec<Value>>> {
            Box::pin(async { Err(Error::http_status(401, "unauthorized")) })
        });
        assert!(matches!(
            check_fetcher(&failing).await,
            Err(Error::HttpStatus { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_writes_capped_rows() {
        let file = definition_file(DEFINITION);
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("rows.jsonl");

        let cli = Cli::try_parse_from([
            "bounded-pager",
            "-d",
            file.path().to_str().unwrap(),
            "fetch",
            "-o",
            out_path.to_str().unwrap(),
        ])
        .unwrap();
        Runner::new(cli).run().await.unwrap();

        let written = fs::read_to_string(&out_path).unwrap();
        let rows: Vec<Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4], json!({"n": 4}));
    }

    #[tokio::test]
    async fn test_fetch_flag_overrides_limits() {
        let file = definition_file(DEFINITION);
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("rows.jsonl");

        let cli = Cli::try_parse_from([
            "bounded-pager",
            "-d",
            file.path().to_str().unwrap(),
            "fetch",
            "--max-rows",
            "0",
            "-o",
            out_path.to_str().unwrap(),
        ])
        .unwrap();
        Runner::new(cli).run().await.unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "");
    }

    #[test]
    fn test_inline_config_takes_precedence() {
        let config_file = definition_file(r#"{"project": "from-file"}"#);
        let cli = Cli::try_parse_from([
            "bounded-pager",
            "-C",
            config_file.path().to_str().unwrap(),
            "--config-json",
            r#"{"project": "inline"}"#,
            "validate",
        ])
        .unwrap();

        let config = Runner::new(cli).load_config().unwrap();
        assert_eq!(config, json!({"project": "inline"}));
    }

    #[tokio::test]
    async fn test_missing_definition_flag() {
        let cli = Cli::try_parse_from(["bounded-pager", "validate"]).unwrap();
        let err = Runner::new(cli).run().await.unwrap_err();
        assert!(err.to_string().contains("-d"));
    }
}
