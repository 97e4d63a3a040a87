use super::record::{Document, Id};
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content types accepted for uploaded documents and images.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
];

/// Metadata of a file kept on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Id,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    /// File name inside the upload directory.
    pub stored_name: String,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn new(original_name: &str, content_type: &str, size: u64) -> Result<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(PortalError::ValidationError(format!(
                "Unsupported file type {content_type}"
            )));
        }
        if size == 0 {
            return Err(PortalError::ValidationError("File is empty".to_string()));
        }

        let id = Id::generate();
        let stored_name = match extension(original_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };

        Ok(Self {
            id,
            original_name: sanitize_name(original_name),
            content_type,
            size,
            stored_name,
            created_at: Utc::now(),
        })
    }
}

// Only the final path component survives; browsers on Windows send full paths.
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

fn extension(name: &str) -> Option<String> {
    let base = sanitize_name(name);
    let (_, ext) = base.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

impl Document for StoredFile {
    const COLLECTION: &'static str = "files";
    const KIND: &'static str = "File";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
