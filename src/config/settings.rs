//! The settings bundle and its factory

use super::logger::{CustomLoggerConfig, LogLevel, LoggerConfig, default_custom_loggers};
use super::schema::{SettingMetadata, SettingOption, SettingType};
use super::site_file::SiteFileConfig;
use super::types::{
    BodyParserConfig, CORE_MIDDLEWARE, ClusterClientConfig, ClusterConfig, DumpConfig,
    HttpClientConfig, JsonpConfig, MetaConfig, NotFoundConfig, WORKER_START_TIMEOUT, duration_ms,
};
use crate::app_info::{AppInfo, Environment};
use crate::error::{Error, Result};
use crate::overrides::lookup;
use crate::settings;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level keys of a serialized bundle, in declaration order
pub const TOP_LEVEL_KEYS: &[&str] = &[
    "env",
    "name",
    "keys",
    "pkg",
    "baseDir",
    "HOME",
    "rundir",
    "proxy",
    "maxProxyCount",
    "protocolHeaders",
    "ipHeaders",
    "hostHeaders",
    "notfound",
    "siteFile",
    "bodyParser",
    "logger",
    "customLogger",
    "httpclient",
    "meta",
    "coreMiddleware",
    "jsonp",
    "workerStartTimeout",
    "cluster",
    "clusterClient",
    "dump",
];

/// Accepted forms for body size limits
const BYTE_SIZE_PATTERN: &str = r"(?i)^\s*\d+(\.\d+)?\s*(b|kb|mb|gb|tb)?\s*$";

/// Default settings bundle for one application instance
///
/// Serializes to the option shape the framework's subsystems consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    // Identity
    pub env: Environment,
    pub name: String,
    /// Signing keys, filled in by the application
    pub keys: String,
    pub pkg: Map<String, Value>,
    pub base_dir: PathBuf,
    #[serde(rename = "HOME")]
    pub home: PathBuf,

    /// Runtime state directory
    pub rundir: PathBuf,

    // Reverse proxy trust
    pub proxy: bool,
    pub max_proxy_count: u32,
    pub protocol_headers: String,
    pub ip_headers: String,
    pub host_headers: String,

    pub notfound: NotFoundConfig,
    pub site_file: SiteFileConfig,
    pub body_parser: BodyParserConfig,
    pub logger: LoggerConfig,
    pub custom_logger: BTreeMap<String, CustomLoggerConfig>,
    pub httpclient: HttpClientConfig,
    pub meta: MetaConfig,
    /// Built-in middleware names, in pipeline order
    pub core_middleware: Vec<String>,
    pub jsonp: JsonpConfig,
    #[serde(with = "duration_ms")]
    pub worker_start_timeout: Duration,
    pub cluster: ClusterConfig,
    pub cluster_client: ClusterClientConfig,
    pub dump: DumpConfig,
}

/// Build the default settings bundle for an application
///
/// Shorthand for [`Settings::defaults`].
pub fn default_settings(app: &AppInfo) -> Settings {
    Settings::defaults(app)
}

impl Settings {
    /// Build the default settings bundle for an application
    ///
    /// Runtime artifacts (logs, run state) live under [`AppInfo::root`]; the
    /// not-found redirect is only enabled in `prod`.
    ///
    /// # Example
    /// ```rust
    /// use webapp_defaults::{AppInfo, Environment, Settings};
    /// use std::path::Path;
    ///
    /// let app = AppInfo::new("demo", "/app", Environment::Local, "/home/u");
    /// let settings = Settings::defaults(&app);
    ///
    /// assert_eq!(settings.logger.dir, Path::new("/app/logs/demo"));
    /// assert!(!settings.notfound.enable_redirect);
    /// ```
    pub fn defaults(app: &AppInfo) -> Self {
        debug!(
            "Building default settings for '{}' ({}, root: {})",
            app.name,
            app.env,
            app.root().display()
        );

        Self {
            env: app.env,
            name: app.name.clone(),
            keys: String::new(),
            pkg: app.pkg.clone(),
            base_dir: app.base_dir.clone(),
            home: app.home.clone(),
            rundir: app.root().join("run"),
            proxy: false,
            max_proxy_count: 0,
            protocol_headers: "x-forwarded-proto".into(),
            ip_headers: "x-forwarded-for".into(),
            host_headers: String::new(),
            notfound: NotFoundConfig {
                page_url: String::new(),
                enable_redirect: app.env.is_production(),
            },
            site_file: SiteFileConfig::default(),
            body_parser: BodyParserConfig::default(),
            logger: LoggerConfig::for_app(app),
            custom_logger: default_custom_loggers(),
            httpclient: HttpClientConfig::default(),
            meta: MetaConfig::default(),
            core_middleware: CORE_MIDDLEWARE.iter().map(|s| s.to_string()).collect(),
            jsonp: JsonpConfig::default(),
            worker_start_timeout: WORKER_START_TIMEOUT,
            cluster: ClusterConfig::default(),
            cluster_client: ClusterClientConfig::default(),
            dump: DumpConfig::default(),
        }
    }

    /// Serialize to the consumer's JSON shape
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Read a value by dotted key (e.g. `bodyParser.jsonLimit`)
    pub fn get(&self, key: &str) -> Result<Value> {
        let value = self.to_value()?;
        lookup(&value, key)
            .cloned()
            .ok_or_else(|| Error::SettingNotFound(key.to_string()))
    }

    /// Check every described key against its metadata
    ///
    /// Also rejects an empty or duplicated middleware list.
    pub fn validate(&self) -> Result<()> {
        let value = self.to_value()?;
        let schema = Self::metadata(&self.app_info());

        let mut keys: Vec<&String> = schema.keys().collect();
        keys.sort();
        for key in keys {
            let metadata = &schema[key];
            metadata
                .validate_schema()
                .map_err(|reason| Error::InvalidSettingMetadata {
                    key: key.clone(),
                    reason,
                })?;
            if metadata.setting_type == SettingType::Info {
                continue;
            }
            let current =
                lookup(&value, key).ok_or_else(|| Error::SettingNotFound(key.clone()))?;
            metadata
                .validate(current)
                .map_err(|reason| Error::InvalidSettingValue {
                    key: key.clone(),
                    reason,
                })?;
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self
            .core_middleware
            .iter()
            .find(|name| name.is_empty() || !seen.insert(name.as_str()))
        {
            return Err(Error::InvalidSettingValue {
                key: "coreMiddleware".into(),
                reason: format!("invalid or duplicated middleware name '{dup}'"),
            });
        }

        Ok(())
    }

    /// The descriptor this bundle was built from
    pub fn app_info(&self) -> AppInfo {
        AppInfo {
            name: self.name.clone(),
            base_dir: self.base_dir.clone(),
            env: self.env,
            home: self.home.clone(),
            pkg: self.pkg.clone(),
        }
    }

    /// Metadata for every overridable key, keyed by dotted path
    ///
    /// Defaults match [`Settings::defaults`] for the same descriptor.
    pub fn metadata(app: &AppInfo) -> HashMap<String, SettingMetadata> {
        let d = Self::defaults(app);
        let path = |p: &PathBuf| p.to_string_lossy().into_owned();
        let schedule = d.custom_logger.get("scheduleLogger");

        settings! {
            // Identity
            "env" => SettingMetadata::info(Value::String(d.env.as_str().to_string()))
                .category("identity")
                .description("Environment tag the bundle was built for; rebuild from the descriptor to change it")
                .env_dependent(),
            "name" => SettingMetadata::info(Value::String(d.name.clone()))
                .category("identity")
                .description("Application name"),
            "keys" => SettingMetadata::text(d.keys.clone())
                .category("identity")
                .description("Comma-separated cookie signing keys, supplied by the application")
                .sensitive(),
            "pkg" => SettingMetadata::info(Value::Object(d.pkg.clone()))
                .category("identity")
                .description("Package manifest metadata")
                .advanced(),
            "baseDir" => SettingMetadata::info(Value::String(path(&d.base_dir)))
                .category("identity")
                .description("Application base directory"),
            "HOME" => SettingMetadata::info(Value::String(path(&d.home)))
                .category("identity")
                .description("Process home directory"),
            "rundir" => SettingMetadata::text(path(&d.rundir))
                .category("paths")
                .description("Runtime state directory; under the base directory in local and unittest, under HOME otherwise")
                .env_dependent(),

            // Proxy
            "proxy" => SettingMetadata::toggle(d.proxy)
                .category("proxy")
                .description("Trust forwarding headers set by a reverse proxy"),
            "maxProxyCount" => SettingMetadata::integer(d.max_proxy_count.into())
                .min(0.0)
                .category("proxy")
                .description("Number of trusted proxies in front of the application (0: no limit)"),
            "protocolHeaders" => SettingMetadata::text(d.protocol_headers.clone())
                .category("proxy"),
            "ipHeaders" => SettingMetadata::text(d.ip_headers.clone())
                .category("proxy"),
            "hostHeaders" => SettingMetadata::text(d.host_headers.clone())
                .category("proxy"),

            // Not found
            "notfound.pageUrl" => SettingMetadata::text(d.notfound.page_url.clone())
                .category("notfound")
                .description("Page unmatched requests are redirected to"),
            "notfound.enableRedirect" => SettingMetadata::toggle(d.notfound.enable_redirect)
                .category("notfound")
                .description("Redirect unmatched requests to pageUrl; on only in prod")
                .env_dependent(),

            // Site files
            "siteFile.cacheControl" => SettingMetadata::text(d.site_file.cache_control.clone())
                .category("siteFile")
                .description("Cache-Control header for site files"),

            // Body parser
            "bodyParser.enable" => SettingMetadata::toggle(d.body_parser.enable)
                .category("bodyParser"),
            "bodyParser.encoding" => SettingMetadata::text(d.body_parser.encoding.clone())
                .category("bodyParser"),
            "bodyParser.formLimit" => SettingMetadata::text(d.body_parser.form_limit.to_string())
                .pattern(BYTE_SIZE_PATTERN)
                .category("bodyParser")
                .description("Maximum urlencoded body size"),
            "bodyParser.jsonLimit" => SettingMetadata::text(d.body_parser.json_limit.to_string())
                .pattern(BYTE_SIZE_PATTERN)
                .category("bodyParser")
                .description("Maximum JSON body size"),
            "bodyParser.textLimit" => SettingMetadata::text(d.body_parser.text_limit.to_string())
                .pattern(BYTE_SIZE_PATTERN)
                .category("bodyParser")
                .description("Maximum text body size"),
            "bodyParser.strict" => SettingMetadata::toggle(d.body_parser.strict)
                .category("bodyParser")
                .description("Only accept arrays and objects as JSON bodies"),
            "bodyParser.enableTypes" => SettingMetadata::list(&d.body_parser.enable_types)
                .category("bodyParser"),
            "bodyParser.queryString.arrayLimit" => SettingMetadata::integer(d.body_parser.query_string.array_limit.into())
                .min(0.0)
                .category("bodyParser"),
            "bodyParser.queryString.depth" => SettingMetadata::integer(d.body_parser.query_string.depth.into())
                .min(1.0)
                .category("bodyParser"),
            "bodyParser.queryString.parameterLimit" => SettingMetadata::integer(d.body_parser.query_string.parameter_limit.into())
                .min(1.0)
                .category("bodyParser"),

            // Logger
            "logger.dir" => SettingMetadata::text(path(&d.logger.dir))
                .category("logger")
                .description("Log directory; <root>/logs/<name>")
                .env_dependent(),
            "logger.encoding" => SettingMetadata::text(d.logger.encoding.clone())
                .category("logger"),
            "logger.env" => SettingMetadata::info(Value::String(d.logger.env.clone()))
                .category("logger"),
            "logger.level" => SettingMetadata::select(d.logger.level.as_str(), level_options())
                .category("logger")
                .description("Minimum level written to log files"),
            "logger.consoleLevel" => SettingMetadata::select(d.logger.console_level.as_str(), level_options())
                .category("logger")
                .description("Minimum level written to the console"),
            "logger.disableConsoleAfterReady" => SettingMetadata::toggle(d.logger.disable_console_after_ready)
                .category("logger")
                .description("Stop console output once ready; on outside local and unittest")
                .env_dependent(),
            "logger.outputJSON" => SettingMetadata::toggle(d.logger.output_json)
                .category("logger"),
            "logger.buffer" => SettingMetadata::toggle(d.logger.buffer)
                .category("logger"),
            "logger.appLogName" => SettingMetadata::text(d.logger.app_log_name.clone())
                .category("logger"),
            "logger.coreLogName" => SettingMetadata::text(d.logger.core_log_name.clone())
                .category("logger"),
            "logger.agentLogName" => SettingMetadata::text(d.logger.agent_log_name.clone())
                .category("logger"),
            "logger.errorLogName" => SettingMetadata::text(d.logger.error_log_name.clone())
                .category("logger"),
            "logger.allowDebugAtProd" => SettingMetadata::toggle(d.logger.allow_debug_at_prod)
                .category("logger")
                .advanced(),
            "customLogger.scheduleLogger.consoleLevel" => SettingMetadata::select(
                schedule.map_or(LogLevel::None, |l| l.console_level).as_str(),
                level_options(),
            )
            .category("logger"),
            "customLogger.scheduleLogger.file" => SettingMetadata::text(
                schedule.map(|l| l.file.clone()).unwrap_or_default(),
            )
            .category("logger"),

            // HTTP client
            "httpclient.keepAlive" => SettingMetadata::toggle(d.httpclient.keep_alive)
                .category("httpclient"),
            "httpclient.freeSocketKeepAliveTimeout" => SettingMetadata::integer(d.httpclient.free_socket_keep_alive_timeout)
                .min(0.0)
                .category("httpclient")
                .description("Idle socket lifetime in milliseconds"),
            "httpclient.timeout" => SettingMetadata::integer(d.httpclient.timeout)
                .min(1.0)
                .category("httpclient")
                .description("Request timeout in milliseconds"),
            "httpclient.maxSockets" => SettingMetadata::nullable_integer(d.httpclient.max_sockets.map(u64::from))
                .min(1.0)
                .category("httpclient")
                .description("Maximum sockets per host (null: unbounded)"),
            "httpclient.maxFreeSockets" => SettingMetadata::integer(d.httpclient.max_free_sockets.into())
                .min(0.0)
                .category("httpclient"),
            "httpclient.enableDNSCache" => SettingMetadata::toggle(d.httpclient.enable_dns_cache)
                .category("httpclient"),
            "httpclient.dnsCacheMaxLength" => SettingMetadata::integer(d.httpclient.dns_cache_max_length.into())
                .min(1.0)
                .category("httpclient")
                .advanced(),
            "httpclient.dnsCacheLookupInterval" => SettingMetadata::integer(d.httpclient.dns_cache_lookup_interval)
                .min(0.0)
                .category("httpclient")
                .advanced(),

            // Middleware
            "meta.enable" => SettingMetadata::toggle(d.meta.enable)
                .category("middleware"),
            "meta.logging" => SettingMetadata::toggle(d.meta.logging)
                .category("middleware"),
            "coreMiddleware" => SettingMetadata::list(&d.core_middleware)
                .category("middleware")
                .description("Built-in middleware in pipeline order"),

            // JSONP
            "jsonp.limit" => SettingMetadata::integer(d.jsonp.limit.into())
                .min(1.0)
                .category("jsonp")
                .description("Maximum callback name length"),
            "jsonp.callback" => SettingMetadata::list(&d.jsonp.callback)
                .category("jsonp")
                .description("Query parameters carrying the callback name"),
            "jsonp.csrf" => SettingMetadata::toggle(d.jsonp.csrf)
                .category("jsonp"),

            // Cluster
            "workerStartTimeout" => SettingMetadata::integer(duration_millis(d.worker_start_timeout))
                .min(0.0)
                .category("cluster")
                .description("Milliseconds to wait for a worker to become ready"),
            "cluster.listen.path" => SettingMetadata::text(d.cluster.listen.path.clone())
                .category("cluster"),
            "cluster.listen.port" => SettingMetadata::integer(d.cluster.listen.port.into())
                .min(0.0)
                .max(65535.0)
                .category("cluster"),
            "cluster.listen.hostname" => SettingMetadata::text(d.cluster.listen.hostname.clone())
                .category("cluster"),
            "clusterClient.maxWaitTime" => SettingMetadata::integer(d.cluster_client.max_wait_time)
                .min(0.0)
                .category("cluster")
                .advanced(),
            "clusterClient.responseTimeout" => SettingMetadata::integer(d.cluster_client.response_timeout)
                .min(0.0)
                .category("cluster")
                .advanced(),

            // Dump
            "dump.ignore" => SettingMetadata::list(&d.dump.ignore)
                .category("dump")
                .description("Key patterns masked when the config is dumped"),
            "dump.timing.slowBootActionMinDuration" => SettingMetadata::integer(d.dump.timing.slow_boot_action_min_duration)
                .min(0.0)
                .category("dump")
                .advanced(),
        }
    }
}

fn level_options() -> Vec<SettingOption> {
    LogLevel::ALL
        .iter()
        .map(|level| SettingOption::new(level.as_str(), level.as_str()))
        .collect()
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::site_file::{DEFAULT_FAVICON, FAVICON_PATH};
    use serde_json::json;
    use std::path::Path;

    fn app(env: Environment) -> AppInfo {
        AppInfo::new("demo", "/app", env, "/home/u")
    }

    #[test]
    fn test_local_defaults() {
        let settings = Settings::defaults(&app(Environment::Local));

        assert_eq!(settings.logger.dir, Path::new("/app/logs/demo"));
        assert_eq!(settings.rundir, Path::new("/app/run"));
        assert!(!settings.notfound.enable_redirect);
    }

    #[test]
    fn test_prod_defaults() {
        let settings = Settings::defaults(&app(Environment::Prod));

        assert_eq!(settings.logger.dir, Path::new("/home/u/logs/demo"));
        assert_eq!(settings.rundir, Path::new("/home/u/run"));
        assert!(settings.notfound.enable_redirect);
    }

    #[test]
    fn test_redirect_only_in_prod() {
        for env in Environment::ALL {
            let settings = Settings::defaults(&app(env));
            assert_eq!(settings.notfound.enable_redirect, env == Environment::Prod, "env {env}");
        }
    }

    #[test]
    fn test_top_level_keys_exact() {
        let value = Settings::defaults(&app(Environment::Test)).to_value().unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

        let mut expected = TOP_LEVEL_KEYS.to_vec();
        let mut actual = keys.clone();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_fixed_values() {
        let value = Settings::defaults(&app(Environment::Local)).to_value().unwrap();

        assert_eq!(value["keys"], json!(""));
        assert_eq!(value["workerStartTimeout"], json!(600_000));
        assert_eq!(
            value["coreMiddleware"],
            json!(["meta", "siteFile", "notfound", "bodyParser", "overrideMethod"])
        );
        assert_eq!(value["jsonp"]["callback"], json!(["_callback", "callback"]));
        assert_eq!(value["bodyParser"]["queryString"]["depth"], json!(5));
        assert_eq!(value["httpclient"]["maxFreeSockets"], json!(256));
        assert_eq!(value["logger"]["level"], json!("INFO"));
    }

    #[test]
    fn test_favicon_preloaded() {
        let settings = Settings::defaults(&app(Environment::Local));
        assert_eq!(settings.site_file.files[FAVICON_PATH].bytes(), Some(DEFAULT_FAVICON));
    }

    #[test]
    fn test_defaults_idempotent() {
        let info = app(Environment::Prod);
        assert_eq!(Settings::defaults(&info), Settings::defaults(&info));
    }

    #[test]
    fn test_serde_roundtrip_keeps_bundle() {
        let settings = Settings::defaults(&app(Environment::Unittest));
        let back: Settings = serde_json::from_value(settings.to_value().unwrap()).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_get_by_dotted_key() {
        let settings = Settings::defaults(&app(Environment::Local));
        assert_eq!(settings.get("bodyParser.jsonLimit").unwrap(), json!("100kb"));
        assert!(settings.get("bodyParser.nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_metadata_defaults_match_bundle() {
        for env in Environment::ALL {
            let info = app(env);
            let value = Settings::defaults(&info).to_value().unwrap();
            for (key, metadata) in Settings::metadata(&info) {
                let actual = lookup(&value, &key).unwrap_or_else(|| panic!("missing {key}"));
                assert_eq!(&metadata.default, actual, "default mismatch for {key} in {env}");
            }
        }
    }

    #[test]
    fn test_metadata_is_well_formed() {
        for (key, metadata) in Settings::metadata(&app(Environment::Prod)) {
            assert!(metadata.validate_schema().is_ok(), "bad metadata for {key}");
        }
    }

    #[test]
    fn test_descriptor_keys_are_read_only() {
        let schema = Settings::metadata(&app(Environment::Local));
        for key in ["env", "name", "baseDir", "HOME", "pkg", "logger.env"] {
            assert_eq!(schema[key].setting_type, SettingType::Info, "{key}");
        }
    }

    #[test]
    fn test_defaults_validate() {
        for env in Environment::ALL {
            Settings::defaults(&app(env)).validate().unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_middleware() {
        let mut settings = Settings::defaults(&app(Environment::Local));
        settings.core_middleware.push("meta".into());
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidSettingValue { ref key, .. } if key == "coreMiddleware"));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = Settings::defaults(&app(Environment::Local));
        settings.jsonp.limit = 0;
        assert!(settings.validate().is_err());
    }
}
