//! Plain content records managed from the admin dashboard.

use super::record::{Document, Editable, Id, require_email, require_text};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Id,
    pub title: String,
    pub body: String,
    /// Pinned announcements stay at the top of the feed.
    pub pinned: bool,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl Document for Announcement {
    const COLLECTION: &'static str = "announcements";
    const KIND: &'static str = "Announcement";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Editable for Announcement {
    type Draft = AnnouncementDraft;

    fn create(draft: AnnouncementDraft) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            title: require_text("title", &draft.title)?,
            body: draft.body,
            pinned: draft.pinned,
            published_at: draft.published_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(&mut self, draft: AnnouncementDraft) -> Result<()> {
        self.title = require_text("title", &draft.title)?;
        self.body = draft.body;
        self.pinned = draft.pinned;
        if let Some(published_at) = draft.published_at {
            self.published_at = published_at;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub advisor: Option<String>,
    pub meeting_time: Option<String>,
    pub contact_email: Option<String>,
    pub image_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClubDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub advisor: Option<String>,
    pub meeting_time: Option<String>,
    pub contact_email: Option<String>,
    pub image_id: Option<Id>,
}

impl ClubDraft {
    fn contact_email(&self) -> Result<Option<String>> {
        self.contact_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .map(|email| require_email("contact_email", email))
            .transpose()
    }
}

impl Document for Club {
    const COLLECTION: &'static str = "clubs";
    const KIND: &'static str = "Club";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Editable for Club {
    type Draft = ClubDraft;

    fn create(draft: ClubDraft) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            name: require_text("name", &draft.name)?,
            contact_email: draft.contact_email()?,
            description: draft.description,
            advisor: draft.advisor,
            meeting_time: draft.meeting_time,
            image_id: draft.image_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(&mut self, draft: ClubDraft) -> Result<()> {
        self.name = require_text("name", &draft.name)?;
        self.contact_email = draft.contact_email()?;
        self.description = draft.description;
        self.advisor = draft.advisor;
        self.meeting_time = draft.meeting_time;
        self.image_id = draft.image_id;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Id,
    pub title: String,
    pub url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

fn require_url(value: &str) -> Result<String> {
    let url = require_text("url", value)?;
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url)
    } else {
        Err(crate::error::PortalError::ValidationError(
            "url must start with http:// or https://".to_string(),
        ))
    }
}

impl Document for Video {
    const COLLECTION: &'static str = "videos";
    const KIND: &'static str = "Video";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Editable for Video {
    type Draft = VideoDraft;

    fn create(draft: VideoDraft) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            title: require_text("title", &draft.title)?,
            url: require_url(&draft.url)?,
            description: draft.description,
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(&mut self, draft: VideoDraft) -> Result<()> {
        self.title = require_text("title", &draft.title)?;
        self.url = require_url(&draft.url)?;
        self.description = draft.description;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;

    #[test]
    fn test_announcement_defaults_publish_time() {
        let announcement = Announcement::create(AnnouncementDraft {
            title: "Yearbook orders open".to_string(),
            body: String::new(),
            pinned: true,
            published_at: None,
        })
        .unwrap();
        assert_eq!(announcement.published_at, announcement.created_at);
    }

    #[test]
    fn test_club_contact_email_is_validated() {
        let draft = ClubDraft {
            name: "Robotics".to_string(),
            description: String::new(),
            advisor: Some("Mr. Patel".to_string()),
            meeting_time: Some("Tue 3:15pm".to_string()),
            contact_email: Some("robotics".to_string()),
            image_id: None,
        };
        assert!(matches!(
            Club::create(draft.clone()),
            Err(PortalError::ValidationError(_))
        ));

        let blank = ClubDraft {
            contact_email: Some(String::new()),
            ..draft
        };
        assert!(Club::create(blank).unwrap().contact_email.is_none());
    }

    #[test]
    fn test_video_url_must_be_http() {
        let draft = VideoDraft {
            title: "Homecoming recap".to_string(),
            url: "javascript:alert(1)".to_string(),
            description: String::new(),
        };
        assert!(Video::create(draft).is_err());
    }
}
