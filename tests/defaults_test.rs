//! Default Settings Integration Tests
//!
//! Properties of the factory across environments:
//! - Runtime root selection (base directory vs HOME)
//! - Not-found redirect only in prod
//! - Exact top-level key set and documented values
//! - Idempotence

mod common;

use common::{AppFixture, fixed_app};
use serde_json::json;
use std::path::Path;
use webapp_defaults::{
    AppInfo, ByteSize, Environment, LogLevel, Settings, TOP_LEVEL_KEYS, default_settings,
};

// =============================================================================
// Environment-dependent values
// =============================================================================

#[test]
fn test_local_example() {
    let settings = Settings::defaults(&fixed_app(Environment::Local));

    let value = settings.to_value().unwrap();
    assert_eq!(value["logger"]["dir"], json!("/app/logs/demo"));
    assert_eq!(value["notfound"]["enableRedirect"], json!(false));
}

#[test]
fn test_prod_example() {
    let settings = Settings::defaults(&fixed_app(Environment::Prod));

    let value = settings.to_value().unwrap();
    assert_eq!(value["logger"]["dir"], json!("/home/u/logs/demo"));
    assert_eq!(value["notfound"]["enableRedirect"], json!(true));
}

#[test]
fn test_runtime_root_per_environment() {
    for env in Environment::ALL {
        let fixture = AppFixture::new(env);
        let settings = fixture.settings();
        let root = fixture.expected_root();

        assert_eq!(settings.rundir, root.join("run"), "rundir in {env}");
        assert_eq!(settings.logger.dir, root.join("logs").join("demo"), "logger.dir in {env}");
    }
}

#[test]
fn test_development_environments_never_touch_home() {
    for env in [Environment::Local, Environment::Unittest] {
        let fixture = AppFixture::new(env);
        let settings = fixture.settings();

        assert!(settings.rundir.starts_with(fixture.base_dir()));
        assert!(settings.logger.dir.starts_with(fixture.base_dir()));
        assert!(!settings.logger.dir.starts_with(fixture.home_dir()));
    }
}

#[test]
fn test_redirect_iff_prod() {
    for env in Environment::ALL {
        let settings = Settings::defaults(&fixed_app(env));
        assert_eq!(settings.notfound.enable_redirect, env.is_production());
    }
}

// =============================================================================
// Shape and documented values
// =============================================================================

#[test]
fn test_exact_top_level_keys() {
    for env in Environment::ALL {
        let value = Settings::defaults(&fixed_app(env)).to_value().unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), TOP_LEVEL_KEYS.len());
        for key in TOP_LEVEL_KEYS {
            assert!(object.contains_key(*key), "missing {key} in {env}");
        }
    }
}

#[test]
fn test_identity_fields_copied() {
    let fixture = AppFixture::new(Environment::Test);
    let value = fixture.settings().to_value().unwrap();

    assert_eq!(value["env"], json!("test"));
    assert_eq!(value["name"], json!("demo"));
    assert_eq!(value["keys"], json!(""));
    assert_eq!(value["pkg"]["version"], json!("1.0.0"));
    assert_eq!(value["baseDir"], json!(fixture.base_dir()));
    assert_eq!(value["HOME"], json!(fixture.home_dir()));
}

#[test]
fn test_documented_group_defaults() {
    let settings = default_settings(&fixed_app(Environment::Local));

    assert_eq!(settings.notfound.page_url, "");
    assert!(settings.body_parser.enable);
    assert_eq!(settings.body_parser.encoding, "utf8");
    assert_eq!(settings.body_parser.form_limit, ByteSize::kb(100));
    assert_eq!(settings.body_parser.json_limit, ByteSize::kb(100));
    assert!(settings.body_parser.strict);
    assert_eq!(settings.body_parser.query_string.array_limit, 100);
    assert_eq!(settings.body_parser.query_string.depth, 5);
    assert_eq!(settings.body_parser.query_string.parameter_limit, 1000);

    assert_eq!(settings.logger.level, LogLevel::Info);
    assert_eq!(settings.logger.console_level, LogLevel::Info);
    assert_eq!(settings.logger.app_log_name, "demo-web.log");
    assert_eq!(settings.logger.error_log_name, "common-error.log");
    assert!(settings.logger.buffer);
    assert!(!settings.logger.output_json);

    assert!(settings.httpclient.keep_alive);
    assert_eq!(settings.httpclient.free_socket_keep_alive_timeout, 4000);
    assert_eq!(settings.httpclient.timeout, 30_000);
    assert_eq!(settings.httpclient.max_sockets, None);
    assert_eq!(settings.httpclient.max_free_sockets, 256);
    assert!(!settings.httpclient.enable_dns_cache);

    assert_eq!(
        settings.core_middleware,
        ["meta", "siteFile", "notfound", "bodyParser", "overrideMethod"]
    );
    assert_eq!(settings.jsonp.limit, 50);
    assert_eq!(settings.jsonp.callback, ["_callback", "callback"]);
    assert_eq!(settings.worker_start_timeout.as_secs(), 600);
}

#[test]
fn test_site_file_carries_favicon() {
    let value = Settings::defaults(&fixed_app(Environment::Prod))
        .to_value()
        .unwrap();

    assert!(value["siteFile"]["/favicon.ico"]["base64"].is_string());
    assert_eq!(value["siteFile"]["cacheControl"], json!("public, max-age=2592000"));
}

// =============================================================================
// Purity
// =============================================================================

#[test]
fn test_factory_is_idempotent() {
    let app = fixed_app(Environment::Unittest);
    let first = Settings::defaults(&app);
    let second = Settings::defaults(&app);

    assert_eq!(first, second);
    assert_eq!(first.to_value().unwrap(), second.to_value().unwrap());
}

#[test]
fn test_descriptor_roundtrip_through_bundle() {
    let app = AppInfo::builder("demo", "/srv/demo")
        .env(Environment::Test)
        .home("/home/svc")
        .build();
    assert_eq!(Settings::defaults(&app).app_info(), app);
}

#[test]
fn test_defaults_pass_validation() {
    for env in Environment::ALL {
        assert!(Settings::defaults(&fixed_app(env)).validate().is_ok());
    }
}

#[test]
fn test_home_used_verbatim() {
    let app = AppInfo::new("api", "/srv/api", Environment::Prod, "/var/lib/api");
    let settings = Settings::defaults(&app);
    assert_eq!(settings.logger.dir, Path::new("/var/lib/api/logs/api"));
    assert_eq!(settings.rundir, Path::new("/var/lib/api/run"));
}
