use crate::domain::ports::FileStore;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Upload bytes kept as flat files in one directory.
#[derive(Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// Opens the upload directory, creating it if needed.
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_of(&self, stored_name: &str) -> Result<PathBuf> {
        let valid = !stored_name.is_empty()
            && stored_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !stored_name.starts_with('.');
        if !valid {
            return Err(PortalError::ValidationError(format!(
                "Invalid stored file name {stored_name}"
            )));
        }
        Ok(self.root.join(stored_name))
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn save(&self, stored_name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(stored_name)?;
        fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Upload written");
        Ok(())
    }

    async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(stored_name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PortalError::not_found("File", stored_name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, stored_name: &str) -> Result<()> {
        let path = self.path_of(stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
