use crate::domain::ports::{FileStore, RepositoryRef};
use crate::domain::record::{Document, Id, sort_newest_first};
use crate::domain::upload::StoredFile;
use crate::error::{PortalError, Result};
use std::sync::Arc;
use tracing::info;

/// Uploaded files: bytes in the file store, metadata in the database.
pub struct UploadService {
    files: RepositoryRef<StoredFile>,
    store: Arc<dyn FileStore>,
}

impl UploadService {
    pub fn new(files: RepositoryRef<StoredFile>, store: Arc<dyn FileStore>) -> Self {
        Self { files, store }
    }

    pub async fn upload(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        let file = StoredFile::new(original_name, content_type, bytes.len() as u64)?;
        // Bytes first: metadata never points at a missing file.
        self.store.save(&file.stored_name, bytes).await?;
        self.files.store(file.clone()).await?;
        info!(file = %file.id, size = file.size, content_type = %file.content_type, "File uploaded");
        Ok(file)
    }

    pub async fn download(&self, id: &Id) -> Result<(StoredFile, Vec<u8>)> {
        let file = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| PortalError::not_found(StoredFile::KIND, id))?;
        let bytes = self.store.load(&file.stored_name).await?;
        Ok((file, bytes))
    }

    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut files = self.files.get_all().await?;
        sort_newest_first(&mut files);
        Ok(files)
    }

    pub async fn delete(&self, id: &Id) -> Result<()> {
        let file = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| PortalError::not_found(StoredFile::KIND, id))?;
        self.files.delete(id).await?;
        self.store.remove(&file.stored_name).await?;
        info!(file = %file.id, "File deleted");
        Ok(())
    }
}
