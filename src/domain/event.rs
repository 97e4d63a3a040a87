use super::record::{Document, Editable, Id, require_text};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A school event (dance, field trip, game night).
///
/// Restricted events (`requires_form`) only admit students whose form
/// submission an admin approved. Their ticket product is sold exclusively
/// through that approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub requires_form: bool,
    pub ticket_product_id: Option<Id>,
    pub image_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub requires_form: bool,
    pub ticket_product_id: Option<Id>,
    pub image_id: Option<Id>,
}

impl Event {
    /// True when `product_id` is the ticket of this restricted event.
    pub fn restricts(&self, product_id: &Id) -> bool {
        self.requires_form && self.ticket_product_id.as_ref() == Some(product_id)
    }
}

impl Document for Event {
    const COLLECTION: &'static str = "events";
    const KIND: &'static str = "Event";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Editable for Event {
    type Draft = EventDraft;

    fn create(draft: EventDraft) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            title: require_text("title", &draft.title)?,
            description: draft.description,
            location: draft.location,
            starts_at: draft.starts_at,
            requires_form: draft.requires_form,
            ticket_product_id: draft.ticket_product_id,
            image_id: draft.image_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(&mut self, draft: EventDraft) -> Result<()> {
        self.title = require_text("title", &draft.title)?;
        self.description = draft.description;
        self.location = draft.location;
        self.starts_at = draft.starts_at;
        self.requires_form = draft.requires_form;
        self.ticket_product_id = draft.ticket_product_id;
        self.image_id = draft.image_id;
        self.updated_at = Utc::now();
        Ok(())
    }
}
