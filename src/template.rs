//! Template interpolation for source definitions
//!
//! Handles `{{ variable }}` interpolation in definition strings:
//! `{{ config.project }}` reads the JSON config passed on the command line,
//! `{{ env.SUPABASE_KEY }}` reads an environment variable.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// User configuration values
    pub config: Value,
    /// Environment variables visible to templates
    pub env: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with config values
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Set config values
    pub fn set_config(&mut self, config: Value) -> &mut Self {
        self.config = config;
        self
    }

    /// Set a single environment variable
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Capture the process environment
    pub fn with_process_env(mut self) -> Self {
        self.env.extend(std::env::vars());
        self
    }

    /// Resolve a variable path (e.g. "config.project" or "env.API_KEY")
    pub fn get(&self, path: &str) -> Option<String> {
        let mut parts = path.split('.');
        match parts.next()? {
            "env" => {
                let name = parts.next()?;
                if parts.next().is_some() {
                    return None;
                }
                self.env.get(name).cloned()
            }
            "config" => {
                let rest: Vec<&str> = parts.collect();
                get_nested_value(&self.config, &rest).map(value_to_string)
            }
            // Bare names read from config
            _ => {
                let all: Vec<&str> = path.split('.').collect();
                get_nested_value(&self.config, &all).map(value_to_string)
            }
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let var_path = &cap[1];
        ctx.get(var_path).unwrap_or_else(|| {
            missing.push(var_path.to_string());
            String::new()
        })
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Render an optional field in place
pub fn render_field(field: &mut Option<String>, ctx: &TemplateContext) -> Result<()> {
    if let Some(value) = field.as_mut() {
        *value = render(value, ctx)?;
    }
    Ok(())
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_substitution() {
        let ctx = TemplateContext::with_config(json!({
            "project": "abcd1234",
            "table": "incidents"
        }));

        let result = render(
            "https://{{ config.project }}.supabase.co/rest/v1/{{ config.table }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "https://abcd1234.supabase.co/rest/v1/incidents");
    }

    #[test]
    fn test_env_substitution() {
        let mut ctx = TemplateContext::new();
        ctx.set_env("SUPABASE_KEY", "anon-key");

        assert_eq!(render("{{ env.SUPABASE_KEY }}", &ctx).unwrap(), "anon-key");
        assert!(render("{{ env.OTHER_KEY }}", &ctx).is_err());
    }

    #[test]
    fn test_nested_and_bare_values() {
        let ctx = TemplateContext::with_config(json!({
            "db": {"user": "reader", "port": 5432}
        }));

        assert_eq!(
            render("{{ config.db.user }}:{{ db.port }}", &ctx).unwrap(),
            "reader:5432"
        );
    }

    #[test]
    fn test_undefined_variables_are_all_reported() {
        let ctx = TemplateContext::new();
        let err = render("{{ config.a }}/{{ config.b }}", &ctx).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { .. }));
        assert!(err.to_string().contains("config.a, config.b"));
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_config(json!({"key": "value"}));

        assert_eq!(render("{{config.key}}", &ctx).unwrap(), "value");
        assert_eq!(render("{{  config.key  }}", &ctx).unwrap(), "value");
        assert_eq!(render("plain", &ctx).unwrap(), "plain");
    }

    #[test]
    fn test_render_field() {
        let ctx = TemplateContext::with_config(json!({"path": "./data.db"}));

        let mut field = Some("{{ config.path }}".to_string());
        render_field(&mut field, &ctx).unwrap();
        assert_eq!(field.as_deref(), Some("./data.db"));

        let mut empty: Option<String> = None;
        render_field(&mut empty, &ctx).unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_has_templates_and_extract() {
        assert!(has_templates("prefix {{ env.KEY }} suffix"));
        assert!(!has_templates("{ not a template }"));
        assert_eq!(
            extract_variables("{{ config.a }} and {{ env.B }}"),
            vec!["config.a", "env.B"]
        );
    }
}
