//! Application descriptor
//!
//! [`AppInfo`] is what the hosting framework knows about the application at
//! startup: its name, where it lives, which environment it runs in, the
//! process home directory and its package manifest. The settings factory is a
//! pure function of this value.

use crate::env::{DefaultEnvSource, EnvSource};
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Variable selecting the environment tag directly
pub const SERVER_ENV_VAR: &str = "APP_SERVER_ENV";
/// Coarse environment variable, mapped onto a tag when `APP_SERVER_ENV` is unset
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Home directory variable
pub const HOME_VAR: &str = "HOME";

// =============================================================================
// Environment
// =============================================================================

/// Environment tag selecting environment-specific defaults
///
/// Serialized lowercase; deserialized with the same rules as [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine
    #[default]
    Local,
    /// Test runner
    Unittest,
    /// Shared test deployment
    Test,
    /// Production deployment
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Local,
        Environment::Unittest,
        Environment::Test,
        Environment::Prod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Unittest => "unittest",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    /// Runs on a developer machine or under a test runner.
    ///
    /// Runtime artifacts stay inside the application's base directory here.
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Local | Environment::Unittest)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }

    /// Map a coarse `APP_ENV` value onto a tag
    pub fn from_app_env(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Prod,
            Some(v) if v.eq_ignore_ascii_case("test") => Environment::Unittest,
            _ => Environment::Local,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "unittest" => Ok(Environment::Unittest),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(Error::InvalidEnvironment(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AppInfo
// =============================================================================

/// Application descriptor supplied by the hosting framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Application name
    pub name: String,
    /// Application base directory
    pub base_dir: PathBuf,
    /// Environment tag
    pub env: Environment,
    /// Process home directory
    #[serde(rename = "HOME")]
    pub home: PathBuf,
    /// Package manifest metadata
    #[serde(default)]
    pub pkg: Map<String, Value>,
}

impl AppInfo {
    pub fn new(
        name: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        env: Environment,
        home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            env,
            home: home.into(),
            pkg: Map::new(),
        }
    }

    /// Create a new builder for AppInfo
    ///
    /// # Example
    /// ```rust
    /// use webapp_defaults::{AppInfo, Environment};
    ///
    /// let app = AppInfo::builder("demo", "/app")
    ///     .env(Environment::Prod)
    ///     .home("/home/u")
    ///     .build();
    /// assert_eq!(app.root(), std::path::Path::new("/home/u"));
    /// ```
    pub fn builder(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> AppInfoBuilder {
        AppInfoBuilder::new(name, base_dir)
    }

    /// Root directory for runtime artifacts (logs, run state)
    ///
    /// The base directory in `local` and `unittest`, the home directory otherwise.
    pub fn root(&self) -> &Path {
        if self.env.is_development() {
            &self.base_dir
        } else {
            &self.home
        }
    }

    /// Resolve the descriptor from the process environment
    pub fn from_env(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::from_env_source(base_dir, &DefaultEnvSource)
    }

    /// Resolve the descriptor from an arbitrary variable source
    ///
    /// - env: `APP_SERVER_ENV`, else mapped from `APP_ENV`
    /// - HOME: `HOME`, else the user's home directory, else the base directory
    /// - pkg: manifest found in the base directory (see [`load_package`])
    /// - name: `pkg.name`, else the base directory's last component
    pub fn from_env_source(base_dir: impl Into<PathBuf>, source: &dyn EnvSource) -> Result<Self> {
        let base_dir = base_dir.into();

        let env = match source.var(SERVER_ENV_VAR) {
            Ok(tag) if !tag.trim().is_empty() => tag.parse()?,
            _ => Environment::from_app_env(source.var(APP_ENV_VAR).ok().as_deref()),
        };

        let home = source
            .var(HOME_VAR)
            .ok()
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| base_dir.clone());

        let pkg = load_package(&base_dir)?;
        let name = pkg
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| {
                base_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "app".to_string());

        debug!("Resolved application '{name}' in {env} (base: {})", base_dir.display());

        Ok(Self {
            name,
            base_dir,
            env,
            home,
            pkg,
        })
    }
}

/// Builder for creating AppInfo with a fluent API
#[derive(Debug, Clone)]
pub struct AppInfoBuilder {
    name: String,
    base_dir: PathBuf,
    env: Environment,
    home: Option<PathBuf>,
    pkg: Map<String, Value>,
}

impl AppInfoBuilder {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            env: Environment::default(),
            home: None,
            pkg: Map::new(),
        }
    }

    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Set the home directory
    ///
    /// Defaults to the user's home directory, falling back to the base directory.
    pub fn home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Set the package metadata. Non-object values are ignored.
    pub fn pkg(mut self, pkg: Value) -> Self {
        if let Value::Object(map) = pkg {
            self.pkg = map;
        }
        self
    }

    pub fn build(self) -> AppInfo {
        let home = self
            .home
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| self.base_dir.clone());

        AppInfo {
            name: self.name,
            base_dir: self.base_dir,
            env: self.env,
            home,
            pkg: self.pkg,
        }
    }
}

// =============================================================================
// Package manifest
// =============================================================================

/// Load package metadata from a base directory
///
/// Reads `package.json`; with the `toml` feature, falls back to the
/// `[package]` table of `Cargo.toml`. No manifest yields an empty map.
pub fn load_package(base_dir: &Path) -> Result<Map<String, Value>> {
    let json_path = base_dir.join("package.json");
    if json_path.is_file() {
        let content = crate::error::read_to_string(&json_path)?;
        return match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Parse(format!(
                "{} must contain a JSON object",
                json_path.display()
            ))),
            Err(e) => Err(Error::Parse(format!("{}: {e}", json_path.display()))),
        };
    }

    #[cfg(feature = "toml")]
    {
        let cargo_path = base_dir.join("Cargo.toml");
        if cargo_path.is_file() {
            let content = crate::error::read_to_string(&cargo_path)?;
            let table: toml::Table = toml::from_str(&content)
                .map_err(|e| Error::Parse(format!("{}: {e}", cargo_path.display())))?;
            return match table.get("package") {
                Some(package) => match serde_json::to_value(package)? {
                    Value::Object(map) => Ok(map),
                    _ => Ok(Map::new()),
                },
                None => Ok(Map::new()),
            };
        }
    }

    Ok(Map::new())
}
