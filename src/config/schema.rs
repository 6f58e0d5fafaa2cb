//! Metadata describing each overridable setting
//!
//! Every leaf a deployment may change is described by a [`SettingMetadata`]
//! keyed by its dotted path. The metadata drives validation of merged and
//! env-provided values, the sensitive-key rules of overrides, and the
//! generated reference docs.
//!
//! ```rust
//! use webapp_defaults::{SettingMetadata, opt};
//! use serde_json::json;
//!
//! let port = SettingMetadata::integer(7001).min(1.0).max(65535.0).category("cluster");
//! let level = SettingMetadata::select("INFO", vec![opt("INFO", "Info"), opt("WARN", "Warn")]);
//!
//! assert!(port.validate(&json!(8080)).is_ok());
//! assert!(port.validate(&json!(80.5)).is_err());
//! assert!(level.validate(&json!("TRACE")).is_err());
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Kind of value a setting holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Toggle,
    #[default]
    Text,
    Number,
    /// One of a fixed set of options
    Select,
    /// Derived from the descriptor, never overridden
    Info,
    /// List of strings
    List,
}

/// Numeric bounds of a `Number` setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Whole numbers only
    #[serde(default)]
    pub integer: bool,
    /// `null` accepted, e.g. an unbounded socket count
    #[serde(default)]
    pub nullable: bool,
}

impl Bounds {
    fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() && self.nullable {
            return Ok(());
        }
        let n = value
            .as_f64()
            .ok_or_else(|| format!("expected a number, got {value}"))?;

        if self.integer && n.fract() != 0.0 {
            return Err(format!("expected a whole number, got {n}"));
        }
        if let Some(min) = self.min.filter(|min| n < *min) {
            return Err(format!("{n} is below the minimum of {min}"));
        }
        if let Some(max) = self.max.filter(|max| n > *max) {
            return Err(format!("{n} is above the maximum of {max}"));
        }
        Ok(())
    }
}

/// Annotations read by overrides, dumps and docs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingFlags {
    /// Env overrides skip it unless allowed; docs hide its default
    #[serde(default)]
    pub sensitive: bool,
    /// Left out of docs unless advanced settings are requested
    #[serde(default)]
    pub advanced: bool,
    /// Default depends on the environment tag or the directories
    #[serde(default)]
    pub env_dependent: bool,
}

/// Description of one overridable setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingMetadata {
    #[serde(rename = "type")]
    pub setting_type: SettingType,

    /// Default, in the bundle's serialized form
    pub default: Value,

    /// Docs section; `general` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub bounds: Bounds,

    /// Regex a `Text` value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Allowed values of a `Select` setting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SettingOption>,

    #[serde(default)]
    pub flags: SettingFlags,
}

impl SettingMetadata {
    fn of(setting_type: SettingType, default: Value) -> Self {
        Self {
            setting_type,
            default,
            category: None,
            description: None,
            bounds: Bounds::default(),
            pattern: None,
            options: Vec::new(),
            flags: SettingFlags::default(),
        }
    }

    pub fn text(default: impl Into<String>) -> Self {
        Self::of(SettingType::Text, Value::String(default.into()))
    }

    /// Whole-number setting (counts, ports, milliseconds)
    pub fn integer(default: u64) -> Self {
        let mut setting = Self::of(SettingType::Number, json!(default));
        setting.bounds.integer = true;
        setting
    }

    /// Whole-number setting where `None` (serialized as `null`) means unbounded
    pub fn nullable_integer(default: Option<u64>) -> Self {
        let mut setting = Self::integer(0);
        setting.default = default.map_or(Value::Null, Value::from);
        setting.bounds.nullable = true;
        setting
    }

    pub fn toggle(default: bool) -> Self {
        Self::of(SettingType::Toggle, Value::Bool(default))
    }

    pub fn select(default: impl Into<String>, options: Vec<SettingOption>) -> Self {
        let mut setting = Self::of(SettingType::Select, Value::String(default.into()));
        setting.options = options;
        setting
    }

    /// Read-only value taken from the descriptor
    pub fn info(value: Value) -> Self {
        Self::of(SettingType::Info, value)
    }

    pub fn list<S: AsRef<str>>(default: &[S]) -> Self {
        let items: Vec<&str> = default.iter().map(AsRef::as_ref).collect();
        Self::of(SettingType::List, json!(items))
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.bounds.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.bounds.max = Some(max);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Env overrides skip it unless allowed, dumps mask it, docs hide it
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    #[must_use]
    pub fn advanced(mut self) -> Self {
        self.flags.advanced = true;
        self
    }

    #[must_use]
    pub fn env_dependent(mut self) -> Self {
        self.flags.env_dependent = true;
        self
    }

    pub fn is_sensitive(&self) -> bool {
        self.flags.sensitive
    }

    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or("general")
    }

    /// Check a candidate value
    ///
    /// `Info` settings accept anything since they are never overridden.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self.setting_type {
            SettingType::Info => Ok(()),
            SettingType::Toggle if value.is_boolean() => Ok(()),
            SettingType::Toggle => Err(format!("expected true or false, got {value}")),
            SettingType::Number => self.bounds.check(value),
            SettingType::Text => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a string, got {value}"))?;
                match self.pattern.as_deref() {
                    Some(pattern) => {
                        let re = Regex::new(pattern)
                            .map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
                        if re.is_match(text) {
                            Ok(())
                        } else {
                            Err(format!("'{text}' does not match {pattern}"))
                        }
                    }
                    None => Ok(()),
                }
            }
            SettingType::Select => {
                if self.options.iter().any(|option| option.value == *value) {
                    return Ok(());
                }
                let allowed: Vec<String> =
                    self.options.iter().map(|option| option.value.to_string()).collect();
                Err(format!("{value} is not one of {}", allowed.join(", ")))
            }
            SettingType::List => match value.as_array() {
                Some(items) if items.iter().all(Value::is_string) => Ok(()),
                Some(_) => Err("expected a list of strings".to_string()),
                None => Err(format!("expected a list, got {value}")),
            },
        }
    }

    /// Check the metadata itself
    ///
    /// A select needs options, bounds must be ordered, the pattern must
    /// compile, and the default must pass [`validate`](Self::validate).
    pub fn validate_schema(&self) -> Result<(), String> {
        if self.setting_type == SettingType::Select && self.options.is_empty() {
            return Err("select setting without options".to_string());
        }
        if let (Some(min), Some(max)) = (self.bounds.min, self.bounds.max) {
            if min > max {
                return Err(format!("minimum {min} is above maximum {max}"));
            }
        }
        if let Some(pattern) = &self.pattern {
            Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
        }
        self.validate(&self.default)
            .map_err(|e| format!("default rejected: {e}"))
    }
}

/// One allowed value of a `Select` setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingOption {
    pub value: Value,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SettingOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: Value::String(value.into()),
            label: label.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Shorthand for [`SettingOption::new`]
pub fn opt(value: impl Into<String>, label: impl Into<String>) -> SettingOption {
    SettingOption::new(value, label)
}

/// Build a metadata `HashMap` from `key => metadata` pairs
///
/// ```rust
/// use webapp_defaults::{settings, SettingMetadata};
///
/// let schema = settings! {
///     "meta.enable" => SettingMetadata::toggle(true),
///     "jsonp.limit" => SettingMetadata::integer(50).min(1.0),
/// };
/// assert_eq!(schema.len(), 2);
/// ```
#[macro_export]
macro_rules! settings {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), $value);
        )*
        map
    }};
}
