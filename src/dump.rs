//! Writing the effective settings into the run directory
//!
//! The dump lets operators see what an instance actually started with.
//! Values under keys listed in `dump.ignore` are replaced by a short
//! description, and inline site assets are summarized by their length.

use crate::config::{SiteAsset, Settings};
use crate::error::{Error, Result};
use crate::security;
use crate::storage::{DumpFormat, JsonFormat};
use log::info;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::path::PathBuf;

/// File name (without extension) of the dump
pub const DUMP_FILE_STEM: &str = "application_config";

/// Writes masked settings dumps
#[derive(Debug, Clone)]
pub struct ConfigDumper<F: DumpFormat = JsonFormat> {
    format: F,
    file_stem: String,
}

impl Default for ConfigDumper<JsonFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDumper<JsonFormat> {
    /// Pretty JSON dumper
    pub fn new() -> Self {
        Self::with_format(JsonFormat::new())
    }
}

impl<F: DumpFormat> ConfigDumper<F> {
    pub fn with_format(format: F) -> Self {
        Self {
            format,
            file_stem: DUMP_FILE_STEM.to_string(),
        }
    }

    /// Change the dump file name (default: `application_config`)
    #[must_use]
    pub fn file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Where a dump of `settings` is written
    pub fn dump_path(&self, settings: &Settings) -> PathBuf {
        settings
            .rundir
            .join(format!("{}.{}", self.file_stem, self.format.extension()))
    }

    /// The bundle as it will be written
    pub fn masked_value(&self, settings: &Settings) -> Result<Value> {
        let rules = compile_ignore(&settings.dump.ignore)?;
        let mut value = settings.to_value()?;
        mask(&mut value, &rules);

        if let Some(site) = value.get_mut("siteFile").and_then(Value::as_object_mut) {
            for (path, asset) in &settings.site_file.files {
                if let SiteAsset::Inline(bytes) = asset {
                    site.insert(
                        path.clone(),
                        Value::String(format!("<Buffer len: {}>", bytes.len())),
                    );
                }
            }
        }

        Ok(value)
    }

    /// Write the masked bundle to `<rundir>/<stem>.<ext>` and return the path
    pub fn dump(&self, settings: &Settings) -> Result<PathBuf> {
        let value = self.masked_value(settings)?;
        security::ensure_private_dir(&settings.rundir)?;

        let path = self.dump_path(settings);
        self.format.save(&path, &value)?;

        info!("Dumped settings for '{}' to {}", settings.name, path.display());
        Ok(path)
    }
}

/// One `dump.ignore` entry
///
/// `/pattern/` and `/pattern/i` are regexes; anything else is an exact key name.
#[derive(Debug)]
enum IgnoreRule {
    Name(String),
    Pattern(Regex),
}

impl IgnoreRule {
    fn parse(entry: &str) -> Result<Self> {
        let Some((pattern, flags)) = entry
            .strip_prefix('/')
            .and_then(|rest| rest.rsplit_once('/'))
        else {
            return Ok(IgnoreRule::Name(entry.to_string()));
        };

        let invalid = |reason: String| Error::InvalidSettingValue {
            key: "dump.ignore".into(),
            reason: format!("invalid pattern '{entry}': {reason}"),
        };
        if flags.chars().any(|flag| flag != 'i') {
            return Err(invalid(format!("unsupported flags '{flags}'")));
        }
        RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .build()
            .map(IgnoreRule::Pattern)
            .map_err(|e| invalid(e.to_string()))
    }

    fn matches(&self, key: &str) -> bool {
        match self {
            IgnoreRule::Name(name) => name == key,
            IgnoreRule::Pattern(re) => re.is_match(key),
        }
    }
}

fn compile_ignore(entries: &[String]) -> Result<Vec<IgnoreRule>> {
    entries.iter().map(|entry| IgnoreRule::parse(entry)).collect()
}

fn mask(value: &mut Value, rules: &[IgnoreRule]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if rules.iter().any(|rule| rule.matches(key)) {
                    *child = describe(child);
                } else {
                    mask(child, rules);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| mask(item, rules)),
        _ => {}
    }
}

/// Replacement for a masked value
fn describe(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.is_empty() => Value::String(String::new()),
        Value::String(s) => Value::String(format!("<String len: {}>", s.chars().count())),
        Value::Array(items) => Value::String(format!("<Array len: {}>", items.len())),
        Value::Object(_) => Value::String("<Object>".into()),
        Value::Number(_) => Value::String("<Number>".into()),
        Value::Bool(_) => Value::String("<Boolean>".into()),
    }
}
