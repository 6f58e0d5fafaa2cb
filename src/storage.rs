//! File formats a settings dump can be written in
//!
//! A format only turns a JSON value into text and back; [`write_private`]
//! takes care of putting the text on disk.

use crate::error::{Error, Result};
use crate::security;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Text encoding of a dumped bundle
pub trait DumpFormat: Clone + Send + Sync {
    /// File extension, without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, value: &Value) -> Result<String>;

    fn parse(&self, content: &str) -> Result<Value>;

    /// Read a dump written in this format
    fn load(&self, path: &Path) -> Result<Value> {
        self.parse(&crate::error::read_to_string(path)?)
    }

    /// Render `value` and write it to `path` (see [`write_private`])
    fn save(&self, path: &Path, value: &Value) -> Result<()> {
        write_private(path, &self.render(value)?)
    }
}

/// Write `contents` to `path`, readable by the owner only
///
/// The text goes to `<path>.tmp` first and is renamed over `path`, so a
/// reader never sees a half-written dump. Missing parent directories are
/// created.
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    let Some(file_name) = path.file_name() else {
        return Err(Error::Config(format!(
            "dump path {} has no file name",
            path.display()
        )));
    };
    if let Some(parent) = path.parent() {
        crate::error::create_dir(parent)?;
    }

    let mut temp_name = OsString::from(file_name);
    temp_name.push(".tmp");
    let temp: PathBuf = path.with_file_name(temp_name);

    std::fs::write(&temp, contents).map_err(|source| Error::FileWrite {
        path: temp.clone(),
        source,
    })?;
    security::restrict_file(&temp)?;
    std::fs::rename(&temp, path).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON, pretty-printed unless built with [`JsonFormat::compact`]
#[derive(Debug, Clone)]
pub struct JsonFormat {
    pretty: bool,
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormat {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Everything on one line
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl DumpFormat for JsonFormat {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, value: &Value) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn parse(&self, content: &str) -> Result<Value> {
        Ok(serde_json::from_str(content)?)
    }
}

/// TOML
///
/// TOML has no null, so null entries are left out of the output.
#[cfg(feature = "toml")]
#[derive(Debug, Clone, Default)]
pub struct TomlFormat;

#[cfg(feature = "toml")]
impl TomlFormat {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "toml")]
impl DumpFormat for TomlFormat {
    fn extension(&self) -> &'static str {
        "toml"
    }

    fn render(&self, value: &Value) -> Result<String> {
        let mut value = value.clone();
        strip_nulls(&mut value);
        toml::to_string_pretty(&value).map_err(|e| Error::Parse(format!("TOML: {e}")))
    }

    fn parse(&self, content: &str) -> Result<Value> {
        toml::from_str(content).map_err(|e| Error::Parse(format!("TOML: {e}")))
    }
}

#[cfg(feature = "toml")]
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}

/// YAML
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Default)]
pub struct YamlFormat;

#[cfg(feature = "yaml")]
impl YamlFormat {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "yaml")]
impl DumpFormat for YamlFormat {
    fn extension(&self) -> &'static str {
        "yaml"
    }

    fn render(&self, value: &Value) -> Result<String> {
        serde_yaml::to_string(value).map_err(|e| Error::Parse(format!("YAML: {e}")))
    }

    fn parse(&self, content: &str) -> Result<Value> {
        serde_yaml::from_str(content).map_err(|e| Error::Parse(format!("YAML: {e}")))
    }
}
