//! Owner-only permissions for files written into the run directory
//!
//! Dumped configuration can still reveal deployment details even with
//! sensitive keys masked, so it is readable by the owning user only.

use crate::error::Result;
use std::path::Path;

/// Mode applied to dumped files
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Mode applied to the run directory
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Restrict a file to its owner (Unix: 0o600). No-op elsewhere.
pub fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    set_mode(path, FILE_MODE)?;
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Create a directory (and parents) and restrict it to its owner (Unix: 0o700)
pub fn ensure_private_dir(path: &Path) -> Result<()> {
    crate::error::create_dir(path)?;

    #[cfg(unix)]
    set_mode(path, DIR_MODE)?;

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use crate::error::Error;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(mode);

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
