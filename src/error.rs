//! Error types for webapp-defaults
//!
//! Building the default bundle cannot fail. Errors come from resolving a
//! descriptor from the environment, from applying overrides, and from
//! writing dumps.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Filesystem
    #[error("cannot read site asset {}: {source}", path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Encoding
    #[error("JSON encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed settings input: {0}")]
    Parse(String),

    // Descriptor
    #[error("unknown environment tag '{0}' (expected local, unittest, test or prod)")]
    InvalidEnvironment(String),

    #[error("'{value}' is not a byte size: {reason}")]
    InvalidByteSize { value: String, reason: String },

    // Settings
    #[error("no setting at '{0}'")]
    SettingNotFound(String),

    #[error("rejected value for '{key}': {reason}")]
    InvalidSettingValue { key: String, reason: String },

    #[error("bad metadata for '{key}': {reason}")]
    InvalidSettingMetadata { key: String, reason: String },

    #[error("{0}")]
    Config(String),
}

impl Error {
    /// A dotted key that does not exist in the bundle
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SettingNotFound(_))
    }

    /// A value (or tag, or size) that was read fine but is not acceptable
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSettingValue { .. }
                | Error::InvalidSettingMetadata { .. }
                | Error::InvalidByteSize { .. }
                | Error::InvalidEnvironment(_)
        )
    }
}

/// `create_dir_all` with the path attached to the error
pub(crate) fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::DirectoryCreate {
        path: path.into(),
        source,
    })
}

/// `read_to_string` with the path attached to the error
pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::SettingNotFound("logger.level".into()).is_not_found());
        assert!(Error::InvalidEnvironment("staging".into()).is_validation_error());
        assert!(!Error::Config("x".into()).is_validation_error());
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_to_string(Path::new("/nonexistent/file.json")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/file.json"));
    }

    #[test]
    fn test_messages_name_the_key() {
        let err = Error::InvalidSettingValue {
            key: "jsonp.limit".into(),
            reason: "0 is below the minimum of 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "rejected value for 'jsonp.limit': 0 is below the minimum of 1"
        );
    }
}
