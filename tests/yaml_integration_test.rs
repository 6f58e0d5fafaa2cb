//! YAML Integration Tests
//!
//! Requires the `yaml` feature.

mod common;

use common::AppFixture;
use serde_json::Value;
use webapp_defaults::{ConfigDumper, DumpFormat, Environment, YamlFormat};

#[test]
fn test_yaml_dump_reads_back() {
    let fixture = AppFixture::new(Environment::Test);
    let settings = fixture.settings();
    let dumper = ConfigDumper::with_format(YamlFormat::new());

    let path = dumper.dump(&settings).unwrap();
    assert_eq!(path, fixture.home_dir().join("run/application_config.yaml"));

    let loaded = YamlFormat::new().load(&path).unwrap();
    assert_eq!(loaded["env"], "test");
    assert_eq!(loaded["httpclient"]["maxSockets"], Value::Null);
    assert_eq!(loaded["bodyParser"]["jsonLimit"], "100kb");
}
