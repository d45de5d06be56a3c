//! File system helpers: upload payloads and the config directory.

use crate::utils::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A local file read into memory, ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Bare file name sent as the multipart filename
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Ensures a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {:?}", path),
        )
        .into());
    }
    Ok(())
}

/// Directory holding `cpo.toml` when it is not in the working directory.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cpo"))
}

/// Reads a file that is about to be uploaded.
///
/// A missing path or a directory is reported as [`Error::MissingResource`] so the
/// caller can refuse the request before anything touches the network.
pub fn load_upload<P: AsRef<Path>>(path: P) -> Result<UploadFile> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingResource(format!("file not found: {}", path.display())));
    }
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::MissingResource(format!("no file name in {}", path.display())))?;
    Ok(UploadFile { file_name, bytes })
}
