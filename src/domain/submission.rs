use super::record::{Document, Id, require_email, require_text};
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A student's request to attend a restricted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: Id,
    pub event_id: Id,
    pub student_name: String,
    pub student_email: String,
    pub student_id: String,
    pub grade: Option<u8>,
    /// Answers to the event's form questions, keyed by question.
    pub answers: BTreeMap<String, String>,
    /// Uploaded documents (permission slips, waivers).
    pub documents: Vec<Id>,
    pub status: SubmissionStatus,
    /// Approval note or rejection reason.
    pub admin_note: Option<String>,
    /// Ticket purchase opened on approval of a paid event.
    pub purchase_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub event_id: Id,
    pub student_name: String,
    pub student_email: String,
    pub student_id: String,
    pub grade: Option<u8>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub documents: Vec<Id>,
}

impl FormSubmission {
    pub fn new(draft: NewSubmission) -> Result<Self> {
        if let Some(grade) = draft.grade
            && !(1..=12).contains(&grade)
        {
            return Err(PortalError::ValidationError(
                "grade must be between 1 and 12".to_string(),
            ));
        }

        Ok(Self {
            id: Id::generate(),
            event_id: draft.event_id,
            student_name: require_text("student_name", &draft.student_name)?,
            student_email: require_email("student_email", &draft.student_email)?,
            student_id: require_text("student_id", &draft.student_id)?,
            grade: draft.grade,
            answers: draft.answers,
            documents: draft.documents,
            status: SubmissionStatus::Pending,
            admin_note: None,
            purchase_id: None,
            created_at: Utc::now(),
            reviewed_at: None,
        })
    }

    pub fn approve(&mut self, note: Option<String>) -> Result<()> {
        self.review(SubmissionStatus::Approved, note)
    }

    pub fn reject(&mut self, reason: Option<String>) -> Result<()> {
        self.review(SubmissionStatus::Rejected, reason)
    }

    // Only pending submissions can be reviewed.
    fn review(&mut self, to: SubmissionStatus, note: Option<String>) -> Result<()> {
        if self.status != SubmissionStatus::Pending {
            return Err(PortalError::InvalidTransition {
                kind: Self::KIND,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.admin_note = note.filter(|n| !n.trim().is_empty());
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }
}

impl Document for FormSubmission {
    const COLLECTION: &'static str = "submissions";
    const KIND: &'static str = "Submission";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
