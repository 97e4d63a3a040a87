use crate::domain::ports::{Email, Mailer, Repository, Stores};
use crate::domain::record::{Document, Id};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A thread-safe in-memory collection of documents.
///
/// Uses `Arc<RwLock<HashMap<Id, T>>>` to allow shared concurrent access.
/// Used when no database path is configured and throughout the tests.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    docs: Arc<RwLock<HashMap<Id, T>>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> InMemoryRepository<T> {
    /// Creates a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InMemoryRepository<T> {
    async fn store(&self, doc: T) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.insert(doc.id().clone(), doc);
        Ok(())
    }

    async fn get(&self, id: &Id) -> Result<Option<T>> {
        let docs = self.docs.read().await;
        Ok(docs.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<T>> {
        let docs = self.docs.read().await;
        Ok(docs.values().cloned().collect())
    }

    async fn delete(&self, id: &Id) -> Result<bool> {
        let mut docs = self.docs.write().await;
        Ok(docs.remove(id).is_some())
    }

    async fn exists(&self, id: &Id) -> Result<bool> {
        let docs = self.docs.read().await;
        Ok(docs.contains_key(id))
    }
}

/// Fresh in-memory repositories for every collection.
pub fn stores() -> Stores {
    Stores {
        products: Arc::new(InMemoryRepository::new()),
        events: Arc::new(InMemoryRepository::new()),
        submissions: Arc::new(InMemoryRepository::new()),
        purchases: Arc::new(InMemoryRepository::new()),
        announcements: Arc::new(InMemoryRepository::new()),
        clubs: Arc::new(InMemoryRepository::new()),
        videos: Arc::new(InMemoryRepository::new()),
        files: Arc::new(InMemoryRepository::new()),
        webhooks: Arc::new(InMemoryRepository::new()),
    }
}

/// Keeps every email instead of delivering it.
#[derive(Default, Clone)]
pub struct OutboxMailer {
    sent: Arc<RwLock<Vec<Email>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, address: &str) -> Vec<Email> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|email| email.to == address)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        debug!(to = %email.to, subject = %email.subject, "Email queued in outbox");
        self.sent.write().await.push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Product;
    use crate::domain::product::tests::hoodie;

    #[tokio::test]
    async fn test_in_memory_repository() {
        let store = InMemoryRepository::<Product>::new();
        let product = hoodie(4);

        store.store(product.clone()).await.unwrap();
        let retrieved = store.get(&product.id).await.unwrap().unwrap();
        assert_eq!(retrieved, product);

        assert!(store.get(&Id::from("missing")).await.unwrap().is_none());
        assert!(store.exists(&product.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_replaces_same_id() {
        let store = InMemoryRepository::<Product>::new();
        let mut product = hoodie(4);
        store.store(product.clone()).await.unwrap();

        product.stock = 1;
        store.store(product.clone()).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].stock, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryRepository::<Product>::new();
        let product = hoodie(4);
        store.store(product.clone()).await.unwrap();

        assert!(store.delete(&product.id).await.unwrap());
        assert!(!store.delete(&product.id).await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outbox_mailer() {
        let mailer = OutboxMailer::new();
        mailer
            .send(&Email {
                to: "dana@students.example.org".to_string(),
                subject: "Hi".to_string(),
                text: "Hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(mailer.sent().await.len(), 1);
        assert_eq!(mailer.sent_to("dana@students.example.org").await.len(), 1);
        assert!(mailer.sent_to("someone@else.org").await.is_empty());
    }
}
