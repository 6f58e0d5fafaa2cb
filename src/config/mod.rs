//! The settings bundle
//!
//! - `Settings` - The nested default configuration and its factory
//! - `SettingMetadata` - Type, default and constraints of each overridable key
//! - Group types consumed by the body parser, logger, HTTP client and friends

mod logger;
mod schema;
mod settings;
mod site_file;
mod types;

pub use logger::{CustomLoggerConfig, LogLevel, LoggerConfig, default_custom_loggers};
pub use schema::{Bounds, SettingFlags, SettingMetadata, SettingOption, SettingType, opt};
pub use settings::{Settings, TOP_LEVEL_KEYS, default_settings};
pub use site_file::{DEFAULT_CACHE_CONTROL, DEFAULT_FAVICON, FAVICON_PATH, SiteAsset, SiteFileConfig};
pub use types::{
    BodyParserConfig, CORE_MIDDLEWARE, ClusterClientConfig, ClusterConfig, DEFAULT_DUMP_IGNORE,
    DumpConfig, DumpTimingConfig, HttpClientConfig, JsonpConfig, ListenConfig, MetaConfig,
    NotFoundConfig, QueryStringConfig, WORKER_START_TIMEOUT,
};
