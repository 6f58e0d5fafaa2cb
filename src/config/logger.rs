//! Logging destinations and levels

use crate::app_info::AppInfo;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Log level understood by the logging transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::None => "NONE",
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidSettingValue {
                key: "logger.level".into(),
                reason: format!("unknown log level '{s}'"),
            })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for the application loggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggerConfig {
    /// Directory all log files are written to
    pub dir: PathBuf,
    pub encoding: String,
    pub env: String,
    pub level: LogLevel,
    pub console_level: LogLevel,
    /// Stop console output once the application reports ready
    pub disable_console_after_ready: bool,
    #[serde(rename = "outputJSON")]
    pub output_json: bool,
    pub buffer: bool,
    pub app_log_name: String,
    pub core_log_name: String,
    pub agent_log_name: String,
    pub error_log_name: String,
    /// Per-option overrides for the framework's core logger
    pub core_logger: serde_json::Map<String, serde_json::Value>,
    pub allow_debug_at_prod: bool,
}

impl LoggerConfig {
    /// Logger defaults for an application
    ///
    /// Files go to `<root>/logs/<name>`.
    pub fn for_app(app: &AppInfo) -> Self {
        Self {
            dir: app.root().join("logs").join(&app.name),
            encoding: "utf8".into(),
            env: app.env.to_string(),
            level: LogLevel::Info,
            console_level: LogLevel::Info,
            disable_console_after_ready: !app.env.is_development(),
            output_json: false,
            buffer: true,
            app_log_name: format!("{}-web.log", app.name),
            core_log_name: "core-web.log".into(),
            agent_log_name: "core-agent.log".into(),
            error_log_name: "common-error.log".into(),
            core_logger: serde_json::Map::new(),
            allow_debug_at_prod: false,
        }
    }
}

/// A logger registered in addition to the built-in ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomLoggerConfig {
    pub console_level: LogLevel,
    pub file: String,
}

/// Extra loggers keyed by name
pub fn default_custom_loggers() -> BTreeMap<String, CustomLoggerConfig> {
    BTreeMap::from([(
        "scheduleLogger".to_string(),
        CustomLoggerConfig {
            console_level: LogLevel::None,
            file: "core-schedule.log".into(),
        },
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_info::Environment;
    use serde_json::json;

    #[test]
    fn test_level_parse_and_serde() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(serde_json::to_value(LogLevel::None).unwrap(), json!("NONE"));
    }

    #[test]
    fn test_logger_dir_and_names() {
        let app = AppInfo::new("demo", "/app", Environment::Test, "/home/u");
        let logger = LoggerConfig::for_app(&app);

        assert_eq!(logger.dir, PathBuf::from("/home/u/logs/demo"));
        assert_eq!(logger.app_log_name, "demo-web.log");
        assert_eq!(logger.env, "test");
        assert!(logger.disable_console_after_ready);
    }

    #[test]
    fn test_console_stays_on_in_development() {
        let app = AppInfo::new("demo", "/app", Environment::Unittest, "/home/u");
        assert!(!LoggerConfig::for_app(&app).disable_console_after_ready);
    }

    #[test]
    fn test_logger_shape() {
        let app = AppInfo::new("demo", "/app", Environment::Local, "/home/u");
        let value = serde_json::to_value(LoggerConfig::for_app(&app)).unwrap();
        assert_eq!(value["outputJSON"], json!(false));
        assert_eq!(value["consoleLevel"], json!("INFO"));
        assert_eq!(value["coreLogger"], json!({}));
    }
}
