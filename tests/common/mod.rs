//! Common test utilities for webapp-defaults integration tests
//!
//! Provides descriptor fixtures backed by temporary directories.

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use webapp_defaults::{AppInfo, Environment, Settings};

/// Initialise logging once; output is captured by the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Application living in its own temporary base and home directories
pub struct AppFixture {
    pub base: TempDir,
    pub home: TempDir,
    pub app: AppInfo,
}

impl AppFixture {
    pub fn new(env: Environment) -> Self {
        init_logging();
        let base = TempDir::new().expect("Failed to create base dir");
        let home = TempDir::new().expect("Failed to create home dir");
        let app = AppInfo::builder("demo", base.path())
            .env(env)
            .home(home.path())
            .pkg(json!({"name": "demo", "version": "1.0.0"}))
            .build();

        Self { base, home, app }
    }

    pub fn settings(&self) -> Settings {
        Settings::defaults(&self.app)
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base.path().to_path_buf()
    }

    pub fn home_dir(&self) -> PathBuf {
        self.home.path().to_path_buf()
    }

    /// Directory runtime artifacts are expected under
    pub fn expected_root(&self) -> &Path {
        if matches!(self.app.env, Environment::Local | Environment::Unittest) {
            self.base.path()
        } else {
            self.home.path()
        }
    }
}

/// Descriptor with fixed, non-existent paths
pub fn fixed_app(env: Environment) -> AppInfo {
    AppInfo::new("demo", "/app", env, "/home/u")
}
