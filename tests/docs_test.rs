//! Reference docs generated for a concrete application

mod common;

use common::fixed_app;
use webapp_defaults::{DocsConfig, Environment, Settings, generate_docs, generate_docs_from_metadata};

#[test]
fn test_docs_reflect_environment() {
    let local = generate_docs(&fixed_app(Environment::Local), DocsConfig::new());
    let prod = generate_docs(&fixed_app(Environment::Prod), DocsConfig::new());

    assert!(local.contains("`\"/app/logs/demo\"`"));
    assert!(prod.contains("`\"/home/u/logs/demo\"`"));
}

#[test]
fn test_docs_from_metadata_cover_every_key() {
    let metadata = Settings::metadata(&fixed_app(Environment::Test));
    let docs = generate_docs_from_metadata(&metadata, DocsConfig::new());

    for key in metadata.keys() {
        assert!(docs.contains(&format!("### `{key}`")), "missing {key}");
    }
}
