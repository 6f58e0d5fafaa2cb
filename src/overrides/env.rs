//! Environment variable overrides
//!
//! With prefix `MYAPP`, the key `bodyParser.jsonLimit` is read from
//! `MYAPP_BODYPARSER_JSONLIMIT`.

use super::insert_at;
use crate::config::{SettingMetadata, SettingType};
use crate::env::{DefaultEnvSource, EnvSource};
use crate::error::{Error, Result};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Reads per-key overrides from environment variables
#[derive(Clone)]
pub struct EnvOverrides {
    prefix: String,
    source: Arc<dyn EnvSource>,
    allow_sensitive: bool,
}

impl std::fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvOverrides")
            .field("prefix", &self.prefix)
            .field("allow_sensitive", &self.allow_sensitive)
            .finish_non_exhaustive()
    }
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_source(prefix, DefaultEnvSource)
    }

    /// Read overrides from an arbitrary variable source
    pub fn with_source(prefix: impl Into<String>, source: impl EnvSource + 'static) -> Self {
        Self {
            prefix: prefix.into(),
            source: Arc::new(source),
            allow_sensitive: false,
        }
    }

    /// Allow overriding keys marked sensitive (e.g. signing keys in CI)
    ///
    /// Off by default.
    #[must_use]
    pub fn allow_sensitive(mut self, allow: bool) -> Self {
        self.allow_sensitive = allow;
        self
    }

    /// Variable name for a dotted key: `{PREFIX}_{KEY}`, uppercase, dots to underscores
    pub fn var_name(&self, key: &str) -> String {
        let env_key = key.replace('.', "_").to_uppercase();
        format!("{}_{}", self.prefix.to_uppercase(), env_key)
    }

    /// Raw override for a key, parsed but not validated
    pub fn get(&self, key: &str) -> Option<Value> {
        self.source
            .var(&self.var_name(key))
            .ok()
            .map(|raw| parse_env_value(&raw))
    }

    /// Collect all overrides for a schema into one overlay object
    ///
    /// Read-only keys are ignored, sensitive keys are skipped unless allowed,
    /// and a value that fails validation is an error.
    pub fn collect<S: std::hash::BuildHasher>(
        &self,
        schema: &HashMap<String, SettingMetadata, S>,
    ) -> Result<Value> {
        let mut overlay = Value::Object(Map::new());

        let mut keys: Vec<&String> = schema.keys().collect();
        keys.sort();

        for key in keys {
            let metadata = &schema[key];
            let Ok(raw) = self.source.var(&self.var_name(key)) else {
                continue;
            };

            if metadata.setting_type == SettingType::Info {
                warn!("Ignoring {} ('{key}' is read-only)", self.var_name(key));
                continue;
            }
            if metadata.is_sensitive() && !self.allow_sensitive {
                warn!(
                    "Ignoring {} ('{key}' is sensitive and sensitive overrides are disabled)",
                    self.var_name(key)
                );
                continue;
            }

            let value = coerce(metadata, &raw);
            metadata
                .validate(&value)
                .map_err(|reason| Error::InvalidSettingValue {
                    key: key.clone(),
                    reason: format!("{reason} (from {})", self.var_name(key)),
                })?;

            debug!("Env override for '{key}' from {}", self.var_name(key));
            insert_at(&mut overlay, key, value)?;
        }

        Ok(overlay)
    }
}

/// Parse a raw variable: JSON first, then booleans, integers, floats, plain string
pub fn parse_env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| {
        if raw.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else if let Ok(n) = raw.parse::<i64>() {
            Value::Number(n.into())
        } else if let Ok(n) = raw.parse::<f64>() {
            serde_json::Number::from_f64(n)
                .map_or_else(|| Value::String(raw.to_string()), Value::Number)
        } else {
            Value::String(raw.to_string())
        }
    })
}

/// Text-like settings take the raw string unless it is a quoted JSON string
fn coerce(metadata: &SettingMetadata, raw: &str) -> Value {
    let parsed = parse_env_value(raw);
    match metadata.setting_type {
        SettingType::Text | SettingType::Select if !parsed.is_string() => {
            Value::String(raw.to_string())
        }
        SettingType::List if !parsed.is_array() => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => parsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_info::{AppInfo, Environment};
    use crate::config::Settings;
    use crate::env::MapEnvSource;
    use serde_json::json;

    fn schema() -> HashMap<String, SettingMetadata> {
        Settings::metadata(&AppInfo::new("demo", "/app", Environment::Local, "/home/u"))
    }

    #[test]
    fn test_var_name() {
        let overrides = EnvOverrides::with_source("myapp", MapEnvSource::new());
        assert_eq!(overrides.var_name("bodyParser.jsonLimit"), "MYAPP_BODYPARSER_JSONLIMIT");
        assert_eq!(
            overrides.var_name("cluster.listen.port"),
            "MYAPP_CLUSTER_LISTEN_PORT"
        );
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("true"), json!(true));
        assert_eq!(parse_env_value("FALSE"), json!(false));
        assert_eq!(parse_env_value("42"), json!(42));
        assert_eq!(parse_env_value("[\"a\"]"), json!(["a"]));
        assert_eq!(parse_env_value("hello"), json!("hello"));
    }

    #[test]
    fn test_collect_builds_nested_overlay() {
        let source = MapEnvSource::new()
            .with("APP_CLUSTER_LISTEN_PORT", "8080")
            .with("APP_LOGGER_LEVEL", "WARN")
            .with("APP_JSONP_CALLBACK", "cb, jsonp");
        let overlay = EnvOverrides::with_source("APP", source)
            .collect(&schema())
            .unwrap();

        assert_eq!(
            overlay,
            json!({
                "cluster": {"listen": {"port": 8080}},
                "logger": {"level": "WARN"},
                "jsonp": {"callback": ["cb", "jsonp"]}
            })
        );
    }

    #[test]
    fn test_text_values_stay_strings() {
        let source = MapEnvSource::new().with("APP_CLUSTER_LISTEN_HOSTNAME", "127");
        let overlay = EnvOverrides::with_source("APP", source)
            .collect(&schema())
            .unwrap();
        assert_eq!(overlay["cluster"]["listen"]["hostname"], json!("127"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let source = MapEnvSource::new().with("APP_BODYPARSER_JSONLIMIT", "huge");
        let err = EnvOverrides::with_source("APP", source)
            .collect(&schema())
            .unwrap_err();
        assert!(err.to_string().contains("APP_BODYPARSER_JSONLIMIT"));
    }

    #[test]
    fn test_sensitive_and_read_only_skipped() {
        let source = MapEnvSource::new()
            .with("APP_KEYS", "secret-a,secret-b")
            .with("APP_NAME", "other");
        let overrides = EnvOverrides::with_source("APP", source);
        assert_eq!(overrides.collect(&schema()).unwrap(), json!({}));

        let overlay = overrides.allow_sensitive(true).collect(&schema()).unwrap();
        assert_eq!(overlay, json!({"keys": "secret-a,secret-b"}));
    }
}
