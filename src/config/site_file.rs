//! Static site files served by the `siteFile` middleware

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// Favicon shipped with the crate
pub const DEFAULT_FAVICON: &[u8] = include_bytes!("../../assets/favicon.png");

/// Request path the bundled favicon is served under
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Long-lived caching for site files (30 days)
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=2592000";

/// Content served for a site file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteAsset {
    /// Bytes served directly
    Inline(Vec<u8>),
    /// URL the request is redirected to
    Redirect(String),
}

impl SiteAsset {
    /// Read an asset from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::read(path)
            .map(SiteAsset::Inline)
            .map_err(|e| Error::AssetRead {
                path: path.to_path_buf(),
                source: e,
            })
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            SiteAsset::Inline(bytes) => Some(bytes),
            SiteAsset::Redirect(_) => None,
        }
    }
}

impl Serialize for SiteAsset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        match self {
            SiteAsset::Redirect(url) => serializer.serialize_str(url),
            SiteAsset::Inline(bytes) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("base64", &STANDARD.encode(bytes))?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SiteAsset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Url(String),
            Inline { base64: String },
        }

        match Raw::deserialize(deserializer)? {
            Raw::Url(url) => Ok(SiteAsset::Redirect(url)),
            Raw::Inline { base64 } => STANDARD
                .decode(base64.as_bytes())
                .map(SiteAsset::Inline)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Options for the `siteFile` middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteFileConfig {
    /// Request path to asset
    #[serde(flatten)]
    pub files: BTreeMap<String, SiteAsset>,
    pub cache_control: String,
}

impl SiteFileConfig {
    /// Replace or add the asset for a path
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, asset: SiteAsset) -> Self {
        self.files.insert(path.into(), asset);
        self
    }
}

impl Default for SiteFileConfig {
    fn default() -> Self {
        Self {
            files: BTreeMap::from([(
                FAVICON_PATH.to_string(),
                SiteAsset::Inline(DEFAULT_FAVICON.to_vec()),
            )]),
            cache_control: DEFAULT_CACHE_CONTROL.into(),
        }
    }
}
