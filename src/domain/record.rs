use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored document.
///
/// Generated ids are UUID v4 strings; ids coming from the payment gateway
/// (webhook event ids) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record that lives in its own collection.
pub trait Document: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Collection (column family / table) name.
    const COLLECTION: &'static str;
    /// Human readable name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &Id;
    fn created_at(&self) -> DateTime<Utc>;
}

/// A document admins create and replace through the REST surface.
///
/// `Draft` is the request body: every editable field, none of the
/// server-managed ones (id, timestamps).
pub trait Editable: Document {
    type Draft: DeserializeOwned + Send;

    fn create(draft: Self::Draft) -> Result<Self>;
    fn revise(&mut self, draft: Self::Draft) -> Result<()>;
}

/// Newest first.
pub fn sort_newest_first<T: Document>(docs: &mut [T]) {
    docs.sort_by_key(|doc| std::cmp::Reverse(doc.created_at()));
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::PortalError::ValidationError(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_email(field: &str, value: &str) -> Result<String> {
    let email = require_text(field, value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(crate::error::PortalError::ValidationError(format!(
            "{field} must be an email address"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(Id::generate(), Id::generate());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = Id::from("evt_123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"evt_123\"");
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Hoodie ").unwrap(), "Hoodie");
        assert!(matches!(
            require_text("name", "   "),
            Err(PortalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_require_email() {
        assert!(require_email("email", "student@school.org").is_ok());
        assert!(require_email("email", "student@localhost").is_err());
        assert!(require_email("email", "@school.org").is_err());
        assert!(require_email("email", "not-an-email").is_err());
    }
}
