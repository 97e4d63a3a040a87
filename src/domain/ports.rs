use super::content::{Announcement, Club, Video};
use super::event::Event;
use super::product::Product;
use super::purchase::{CheckoutSession, Purchase};
use super::record::{Document, Id};
use super::submission::FormSubmission;
use super::upload::StoredFile;
use super::webhook::ProcessedWebhook;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Inserts or replaces the document with the same id.
    async fn store(&self, doc: T) -> Result<()>;
    async fn get(&self, id: &Id) -> Result<Option<T>>;
    async fn get_all(&self) -> Result<Vec<T>>;
    /// Returns whether a document was removed.
    async fn delete(&self, id: &Id) -> Result<bool>;

    async fn exists(&self, id: &Id) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }
}

pub type RepositoryRef<T> = Arc<dyn Repository<T>>;

/// Every collection the application reads or writes.
#[derive(Clone)]
pub struct Stores {
    pub products: RepositoryRef<Product>,
    pub events: RepositoryRef<Event>,
    pub submissions: RepositoryRef<FormSubmission>,
    pub purchases: RepositoryRef<Purchase>,
    pub announcements: RepositoryRef<Announcement>,
    pub clubs: RepositoryRef<Club>,
    pub videos: RepositoryRef<Video>,
    pub files: RepositoryRef<StoredFile>,
    pub webhooks: RepositoryRef<ProcessedWebhook>,
}

/// Everything the gateway needs to host a checkout page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    /// Our purchase id; the gateway echoes it back in webhooks.
    pub reference_id: Id,
    pub item_name: String,
    /// Unit price in minor units (cents).
    pub unit_amount: i64,
    pub quantity: u32,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Raw bytes of uploaded files, addressed by their stored name.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, stored_name: &str, bytes: &[u8]) -> Result<()>;
    async fn load(&self, stored_name: &str) -> Result<Vec<u8>>;
    async fn remove(&self, stored_name: &str) -> Result<()>;
}
