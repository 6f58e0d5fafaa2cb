//! Default groups consumed by the framework's built-in subsystems
//!
//! Each struct mirrors the option shape its consumer expects, so the field
//! names serialize in camelCase.

use crate::size::ByteSize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Not-found handling
// =============================================================================

/// Options for the not-found middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotFoundConfig {
    /// Page to redirect to for unmatched requests (empty: none)
    pub page_url: String,
    /// Redirect to `page_url` instead of rendering a 404 body
    pub enable_redirect: bool,
}

// =============================================================================
// Body parsing
// =============================================================================

/// Limits applied when parsing nested query strings in form bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryStringConfig {
    pub array_limit: u32,
    pub depth: u32,
    pub parameter_limit: u32,
}

impl Default for QueryStringConfig {
    fn default() -> Self {
        Self {
            array_limit: 100,
            depth: 5,
            parameter_limit: 1000,
        }
    }
}

/// Options for the request body parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BodyParserConfig {
    pub enable: bool,
    pub encoding: String,
    pub form_limit: ByteSize,
    pub json_limit: ByteSize,
    pub text_limit: ByteSize,
    /// Only accept arrays and objects as JSON bodies
    pub strict: bool,
    pub enable_types: Vec<String>,
    pub query_string: QueryStringConfig,
}

impl Default for BodyParserConfig {
    fn default() -> Self {
        Self {
            enable: true,
            encoding: "utf8".into(),
            form_limit: ByteSize::kb(100),
            json_limit: ByteSize::kb(100),
            text_limit: ByteSize::kb(100),
            strict: true,
            enable_types: vec!["json".into(), "form".into()],
            query_string: QueryStringConfig::default(),
        }
    }
}

// =============================================================================
// Outbound HTTP client
// =============================================================================

/// Connection pooling defaults for the outbound HTTP client
///
/// Durations are in milliseconds. `max_sockets: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpClientConfig {
    pub keep_alive: bool,
    pub free_socket_keep_alive_timeout: u64,
    pub timeout: u64,
    pub max_sockets: Option<u32>,
    pub max_free_sockets: u32,
    #[serde(rename = "enableDNSCache")]
    pub enable_dns_cache: bool,
    #[serde(rename = "dnsCacheMaxLength")]
    pub dns_cache_max_length: u32,
    #[serde(rename = "dnsCacheLookupInterval")]
    pub dns_cache_lookup_interval: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            free_socket_keep_alive_timeout: 4000,
            timeout: 30_000,
            max_sockets: None,
            max_free_sockets: 256,
            enable_dns_cache: false,
            dns_cache_max_length: 1000,
            dns_cache_lookup_interval: 10_000,
        }
    }
}

// =============================================================================
// JSONP
// =============================================================================

/// JSONP callback constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonpConfig {
    /// Maximum callback name length
    pub limit: u32,
    /// Query parameters that may carry the callback name, in lookup order
    pub callback: Vec<String>,
    pub csrf: bool,
}

impl Default for JsonpConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            callback: vec!["_callback".into(), "callback".into()],
            csrf: false,
        }
    }
}

// =============================================================================
// Meta middleware
// =============================================================================

/// Options for the `meta` middleware (response timing headers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    pub enable: bool,
    pub logging: bool,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            enable: true,
            logging: false,
        }
    }
}

// =============================================================================
// Cluster
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    /// Unix socket path (empty: listen on TCP)
    pub path: String,
    pub port: u16,
    pub hostname: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            port: 7001,
            hostname: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub listen: ListenConfig,
}

/// Timeouts for the inter-process cluster client, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterClientConfig {
    pub max_wait_time: u64,
    pub response_timeout: u64,
}

impl Default for ClusterClientConfig {
    fn default() -> Self {
        Self {
            max_wait_time: 60_000,
            response_timeout: 60_000,
        }
    }
}

// =============================================================================
// Config dump
// =============================================================================

/// Keys masked when the bundle is dumped
///
/// Plain entries name a key exactly; `/pattern/i` entries are case-insensitive regexes.
pub const DEFAULT_DUMP_IGNORE: &[&str] = &[
    "pass",
    "pwd",
    "passd",
    "passwd",
    "password",
    "keys",
    "masterKey",
    "accessKey",
    "/secret/i",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DumpTimingConfig {
    /// Boot actions slower than this (ms) are reported
    pub slow_boot_action_min_duration: u64,
}

impl Default for DumpTimingConfig {
    fn default() -> Self {
        Self {
            slow_boot_action_min_duration: 5000,
        }
    }
}

/// What the config dump masks and reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// Key names, or `/regex/` and `/regex/i` entries, whose values are masked
    pub ignore: Vec<String>,
    pub timing: DumpTimingConfig,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_DUMP_IGNORE.iter().map(|s| s.to_string()).collect(),
            timing: DumpTimingConfig::default(),
        }
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Built-in middleware, in the order the pipeline installs them
pub const CORE_MIDDLEWARE: &[&str] = &["meta", "siteFile", "notfound", "bodyParser", "overrideMethod"];

/// How long the master waits for a worker to report ready
pub const WORKER_START_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Serde adapter exchanging a [`Duration`] as integer milliseconds
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
