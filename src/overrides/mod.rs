//! Layering values on top of the defaults
//!
//! The bundle is merged in its serialized form: objects merge key by key,
//! anything else in the overlay (arrays, scalars, `null`) replaces what was
//! there. The merged value is deserialized and validated again, so a layer
//! can never produce a bundle the consumers would reject. Unknown keys and
//! changes to keys derived from the descriptor (`env`, `name`, directories,
//! `pkg`) are errors.

mod env;

pub use env::{EnvOverrides, parse_env_value};

use crate::config::{SettingType, Settings};
use crate::error::{Error, Result};
use log::debug;
use serde_json::{Map, Value};

/// Deep-merge `overlay` into `base`
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Find a value by dotted key
pub fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_object()?.get(part))
}

/// Set a value by dotted key, creating intermediate objects
pub fn insert_at(target: &mut Value, key: &str, value: Value) -> Result<()> {
    let mut parts = key.split('.').peekable();
    let mut current = target;

    while let Some(part) = parts.next() {
        let map = current.as_object_mut().ok_or_else(|| Error::InvalidSettingValue {
            key: key.to_string(),
            reason: format!("'{part}' is not inside an object"),
        })?;

        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Err(Error::SettingNotFound(key.to_string()))
}

impl Settings {
    /// Return a new bundle with `overlay` deep-merged on top
    ///
    /// # Example
    /// ```rust
    /// use webapp_defaults::{AppInfo, Environment, Settings};
    /// use serde_json::json;
    ///
    /// let app = AppInfo::new("demo", "/app", Environment::Prod, "/home/u");
    /// let settings = Settings::defaults(&app)
    ///     .merged(json!({"logger": {"level": "WARN"}}))
    ///     .unwrap();
    /// assert_eq!(settings.logger.level.as_str(), "WARN");
    /// ```
    pub fn merged(&self, overlay: Value) -> Result<Settings> {
        if !overlay.is_object() {
            return Err(Error::Config("override layer must be a JSON object".into()));
        }

        let original = self.to_value()?;
        let mut value = original.clone();
        merge_values(&mut value, overlay);

        let merged: Settings =
            serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;
        merged.reject_read_only_changes(&original)?;
        merged.validate()?;

        debug!("Merged override layer into settings for '{}'", merged.name);
        Ok(merged)
    }

    /// Keys derived from the descriptor must come out of a merge unchanged
    fn reject_read_only_changes(&self, original: &Value) -> Result<()> {
        let current = self.to_value()?;
        let schema = Settings::metadata(&self.app_info());

        let mut keys: Vec<&String> = schema
            .iter()
            .filter(|(_, metadata)| metadata.setting_type == SettingType::Info)
            .map(|(key, _)| key)
            .collect();
        keys.sort();

        match keys
            .into_iter()
            .find(|key| lookup(&current, key) != lookup(original, key))
        {
            Some(key) => Err(Error::InvalidSettingValue {
                key: key.clone(),
                reason: "read-only, derived from the application descriptor".into(),
            }),
            None => Ok(()),
        }
    }

    /// Return a new bundle with environment variable overrides applied
    pub fn with_env_overrides(&self, overrides: &EnvOverrides) -> Result<Settings> {
        let schema = Settings::metadata(&self.app_info());
        let overlay = overrides.collect(&schema)?;
        if overlay.as_object().is_some_and(Map::is_empty) {
            return Ok(self.clone());
        }
        self.merged(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_info::{AppInfo, Environment};
    use serde_json::json;

    fn defaults() -> Settings {
        Settings::defaults(&AppInfo::new("demo", "/app", Environment::Local, "/home/u"))
    }

    #[test]
    fn test_merge_objects_recursively() {
        let mut base = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
        merge_values(&mut base, json!({"a": {"c": 3}, "d": [9], "e": null}));
        assert_eq!(base, json!({"a": {"b": 1, "c": 3}, "d": [9], "e": null}));
    }

    #[test]
    fn test_lookup() {
        let value = json!({"a": {"b": {"c": true}}});
        assert_eq!(lookup(&value, "a.b.c"), Some(&json!(true)));
        assert_eq!(lookup(&value, "a.x"), None);
        assert_eq!(lookup(&value, "a.b.c.d"), None);
    }

    #[test]
    fn test_insert_at_creates_parents() {
        let mut value = json!({});
        insert_at(&mut value, "logger.level", json!("WARN")).unwrap();
        assert_eq!(value, json!({"logger": {"level": "WARN"}}));

        let mut scalar = json!({"logger": 1});
        assert!(insert_at(&mut scalar, "logger.level", json!("WARN")).is_err());
    }

    #[test]
    fn test_merged_replaces_lists() {
        let merged = defaults()
            .merged(json!({"coreMiddleware": ["meta", "bodyParser"]}))
            .unwrap();
        assert_eq!(merged.core_middleware, vec!["meta", "bodyParser"]);
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let original = defaults();
        let merged = original
            .merged(json!({"bodyParser": {"jsonLimit": "1mb"}}))
            .unwrap();
        assert_eq!(merged.body_parser.json_limit.to_string(), "1mb");
        assert_eq!(original.body_parser.json_limit.to_string(), "100kb");
        assert_eq!(merged.body_parser.form_limit, original.body_parser.form_limit);
    }

    #[test]
    fn test_merged_rejects_bad_shapes() {
        let base = defaults();
        assert!(matches!(base.merged(json!(["x"])), Err(Error::Config(_))));
        assert!(matches!(
            base.merged(json!({"logger": {"level": "LOUD"}})),
            Err(Error::Parse(_))
        ));
        assert!(base.merged(json!({"jsonp": {"limit": 0}})).is_err());
    }

    #[test]
    fn test_merged_rejects_read_only_keys() {
        let base = defaults();
        let err = base
            .merged(json!({"name": "other", "baseDir": "/elsewhere"}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSettingValue { ref key, .. } if key == "baseDir"));

        for (overlay, expected) in [
            (json!({"env": "prod"}), "env"),
            (json!({"HOME": "/root"}), "HOME"),
            (json!({"pkg": {"name": "other"}}), "pkg"),
            (json!({"logger": {"env": "prod"}}), "logger.env"),
        ] {
            let err = base.merged(overlay).unwrap_err();
            assert!(
                matches!(err, Error::InvalidSettingValue { ref key, .. } if key == expected),
                "{expected}: {err}"
            );
        }
    }

    #[test]
    fn test_merged_accepts_unchanged_read_only_keys() {
        let base = defaults();
        let merged = base
            .merged(json!({"name": "demo", "env": "LOCAL", "logger": {"level": "WARN"}}))
            .unwrap();
        assert_eq!(merged.env, Environment::Local);
        assert_eq!(merged.logger.dir, base.logger.dir);
    }

    #[test]
    fn test_merged_rejects_unknown_keys() {
        let base = defaults();
        let err = base
            .merged(json!({"bodyParser": {"jsonLimt": "1mb"}}))
            .unwrap_err();
        assert!(matches!(err, Error::Parse(ref msg) if msg.contains("jsonLimt")));

        assert!(matches!(base.merged(json!({"loger": {}})), Err(Error::Parse(_))));
        assert!(matches!(
            base.merged(json!({"cluster": {"listen": {"prot": 80}}})),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_merged_extends_open_maps() {
        let merged = defaults()
            .merged(json!({
                "siteFile": {"/robots.txt": "https://cdn.example.com/robots.txt"},
                "logger": {"coreLogger": {"httpclient": {"level": "WARN"}}}
            }))
            .unwrap();

        assert!(merged.site_file.files.contains_key("/robots.txt"));
        assert_eq!(
            merged.logger.core_logger["httpclient"],
            json!({"level": "WARN"})
        );
    }
}
