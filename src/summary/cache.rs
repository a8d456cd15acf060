use crate::error::OrbisError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Cached summary PNG on local disk. Not authoritative; always regenerable.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    path: PathBuf,
}

impl SummaryCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Option<Vec<u8>>, OrbisError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the cached image. Writes a sibling temp file, then renames over the target.
    pub async fn write(&self, png: &[u8]) -> Result<(), OrbisError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("png.tmp");
        fs::write(&tmp, png).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn invalidate(&self) -> Result<(), OrbisError> {
        match fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
