//! # webapp-defaults
//!
//! Default settings for web application instances.
//!
//! Given what the hosting framework knows about an application at startup
//! (its [`AppInfo`]), [`Settings::defaults`] builds the nested settings bundle
//! the framework's subsystems consume: paths, body-parsing limits, logging
//! options, HTTP client pooling, middleware ordering and so on.
//!
//! ## Features
//!
//! - **Defaults**: One typed bundle, serialized in the exact option shape consumers expect
//! - **Environment-aware**: Logs and run state under the base directory in `local`/`unittest`, under `HOME` elsewhere
//! - **Schema**: Type, default and constraints for every overridable key
//! - **Overrides**: Deep-merged JSON layers and `PREFIX_KEY` environment variables, validated
//! - **Dumps**: Masked snapshot of the effective settings in the run directory
//! - **Docs**: Markdown reference generated from the schema
//!
//! ## Quick Start
//!
//! ```rust
//! use webapp_defaults::{AppInfo, Environment, Settings};
//! use std::path::Path;
//!
//! let app = AppInfo::builder("demo", "/app")
//!     .env(Environment::Prod)
//!     .home("/home/u")
//!     .build();
//!
//! let settings = Settings::defaults(&app);
//! assert_eq!(settings.logger.dir, Path::new("/home/u/logs/demo"));
//! assert!(settings.notfound.enable_redirect);
//! ```
//!
//! ## Overrides
//!
//! ```rust,no_run
//! use webapp_defaults::{AppInfo, EnvOverrides, Settings};
//! use serde_json::json;
//!
//! # fn example() -> webapp_defaults::Result<()> {
//! let app = AppInfo::from_env("/srv/shop")?;
//! let settings = Settings::defaults(&app)
//!     .merged(json!({"bodyParser": {"jsonLimit": "1mb"}}))?
//!     .with_env_overrides(&EnvOverrides::new("SHOP"))?; // SHOP_LOGGER_LEVEL=WARN
//! # Ok(())
//! # }
//! ```
//!
//! ## Dumping
//!
//! ```rust,no_run
//! use webapp_defaults::{AppInfo, ConfigDumper, Settings};
//!
//! # fn example() -> webapp_defaults::Result<()> {
//! let settings = Settings::defaults(&AppInfo::from_env("/srv/shop")?);
//! let path = ConfigDumper::new().dump(&settings)?; // <rundir>/application_config.json
//! # Ok(())
//! # }
//! ```

mod app_info;
mod docs;
mod dump;
mod error;
pub mod env;
pub mod overrides;
pub mod security;
pub mod size;
pub mod storage;

pub mod config;

pub use app_info::{
    APP_ENV_VAR, AppInfo, AppInfoBuilder, Environment, HOME_VAR, SERVER_ENV_VAR, load_package,
};
pub use docs::{DocsConfig, generate_docs, generate_docs_from_metadata};
pub use dump::{ConfigDumper, DUMP_FILE_STEM};
pub use env::{DefaultEnvSource, EnvSource, MapEnvSource};
pub use error::{Error, Result};
pub use overrides::{EnvOverrides, merge_values};
pub use size::ByteSize;
pub use storage::{DumpFormat, JsonFormat};

#[cfg(feature = "toml")]
pub use storage::TomlFormat;
#[cfg(feature = "yaml")]
pub use storage::YamlFormat;

pub use config::{
    BodyParserConfig, ClusterClientConfig, ClusterConfig, CustomLoggerConfig, DumpConfig,
    HttpClientConfig, JsonpConfig, ListenConfig, LogLevel, LoggerConfig, MetaConfig,
    NotFoundConfig, QueryStringConfig, SettingMetadata, SettingOption, SettingType, Settings,
    SiteAsset, SiteFileConfig, TOP_LEVEL_KEYS, default_settings, opt,
};
