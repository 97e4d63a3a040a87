use crate::domain::content::{Announcement, Club, Video};
use crate::domain::event::Event;
use crate::domain::ports::{Repository, Stores};
use crate::domain::product::Product;
use crate::domain::purchase::Purchase;
use crate::domain::record::{Document, Id};
use crate::domain::submission::FormSubmission;
use crate::domain::upload::StoredFile;
use crate::domain::webhook::ProcessedWebhook;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// One column family per document collection.
pub const COLLECTIONS: &[&str] = &[
    Product::COLLECTION,
    Event::COLLECTION,
    FormSubmission::COLLECTION,
    Purchase::COLLECTION,
    Announcement::COLLECTION,
    Club::COLLECTION,
    Video::COLLECTION,
    StoredFile::COLLECTION,
    ProcessedWebhook::COLLECTION,
];

/// A persistent store implementation using RocksDB.
///
/// Every collection lives in its own column family, keyed by document id,
/// with the document serialized as JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that a column family exists for every collection.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLLECTIONS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Repositories for every collection, all backed by this database.
    pub fn stores(&self) -> Stores {
        Stores {
            products: Arc::new(self.clone()),
            events: Arc::new(self.clone()),
            submissions: Arc::new(self.clone()),
            purchases: Arc::new(self.clone()),
            announcements: Arc::new(self.clone()),
            clubs: Arc::new(self.clone()),
            videos: Arc::new(self.clone()),
            files: Arc::new(self.clone()),
            webhooks: Arc::new(self.clone()),
        }
    }

    fn missing_cf(name: &str) -> PortalError {
        PortalError::InternalError(Box::new(std::io::Error::other(format!(
            "Column family {name} not found"
        ))))
    }
}

#[async_trait]
impl<T: Document> Repository<T> for RocksDBStore {
    async fn store(&self, doc: T) -> Result<()> {
        let cf = self
            .db
            .cf_handle(T::COLLECTION)
            .ok_or_else(|| Self::missing_cf(T::COLLECTION))?;

        let value = serde_json::to_vec(&doc)?;
        self.db.put_cf(&cf, doc.id().as_str().as_bytes(), value)?;

        Ok(())
    }

    async fn get(&self, id: &Id) -> Result<Option<T>> {
        let cf = self
            .db
            .cf_handle(T::COLLECTION)
            .ok_or_else(|| Self::missing_cf(T::COLLECTION))?;

        match self.db.get_cf(&cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<T>> {
        let cf = self
            .db
            .cf_handle(T::COLLECTION)
            .ok_or_else(|| Self::missing_cf(T::COLLECTION))?;

        let mut docs = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            docs.push(serde_json::from_slice(&value)?);
        }

        Ok(docs)
    }

    async fn delete(&self, id: &Id) -> Result<bool> {
        let cf = self
            .db
            .cf_handle(T::COLLECTION)
            .ok_or_else(|| Self::missing_cf(T::COLLECTION))?;

        let key = id.as_str().as_bytes();
        // Just check if the key exists without copying the value
        let existed = self.db.get_pinned_cf(&cf, key)?.is_some();
        if existed {
            self.db.delete_cf(&cf, key)?;
        }
        Ok(existed)
    }

    async fn exists(&self, id: &Id) -> Result<bool> {
        let cf = self
            .db
            .cf_handle(T::COLLECTION)
            .ok_or_else(|| Self::missing_cf(T::COLLECTION))?;

        Ok(self.db.get_pinned_cf(&cf, id.as_str().as_bytes())?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::tests::hoodie;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLLECTIONS {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_product_repository() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let product = hoodie(5);

        Repository::<Product>::store(&store, product.clone()).await.unwrap();

        let retrieved = Repository::<Product>::get(&store, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, product);

        let all = Repository::<Product>::get_all(&store).await.unwrap();
        assert_eq!(all.len(), 1);

        // Collections do not leak into each other.
        assert!(Repository::<Event>::get_all(&store).await.unwrap().is_empty());

        assert!(Repository::<Product>::delete(&store, &product.id).await.unwrap());
        assert!(!Repository::<Product>::exists(&store, &product.id).await.unwrap());
    }
}
