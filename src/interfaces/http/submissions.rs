use super::SharedState;
use crate::application::auth::Session;
use crate::application::workflow::Approval;
use crate::domain::record::{Document, Id, sort_newest_first};
use crate::domain::submission::{FormSubmission, NewSubmission, SubmissionStatus};
use crate::error::{PortalError, Result};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<SubmissionStatus>,
    pub event_id: Option<Id>,
}

/// Optional body of approve and reject calls.
#[derive(Debug, Default, Deserialize)]
struct Review {
    #[serde(default, alias = "reason")]
    note: Option<String>,
}

pub async fn submit(
    State(state): State<SharedState>,
    Json(draft): Json<NewSubmission>,
) -> Result<(StatusCode, Json<FormSubmission>)> {
    let submission = state.workflow.submit(draft).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn fetch(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
) -> Result<Json<FormSubmission>> {
    state
        .stores
        .submissions
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::not_found(FormSubmission::KIND, &id))
}

pub async fn list(
    State(state): State<SharedState>,
    Query(filter): Query<SubmissionFilter>,
) -> Result<Json<Vec<FormSubmission>>> {
    let mut submissions: Vec<FormSubmission> = state
        .stores
        .submissions
        .get_all()
        .await?
        .into_iter()
        .filter(|s| filter.status.is_none_or(|status| s.status == status))
        .filter(|s| filter.event_id.as_ref().is_none_or(|event| &s.event_id == event))
        .collect();
    sort_newest_first(&mut submissions);
    Ok(Json(submissions))
}

pub async fn approve(
    State(state): State<SharedState>,
    Extension(admin): Extension<Session>,
    Path(id): Path<Id>,
    body: Bytes,
) -> Result<Json<Approval>> {
    let review = review(&body)?;
    info!(submission = %id, admin = %admin.username, "Approving submission");
    Ok(Json(state.workflow.approve(&id, review.note).await?))
}

pub async fn reject(
    State(state): State<SharedState>,
    Extension(admin): Extension<Session>,
    Path(id): Path<Id>,
    body: Bytes,
) -> Result<Json<FormSubmission>> {
    let review = review(&body)?;
    info!(submission = %id, admin = %admin.username, "Rejecting submission");
    Ok(Json(state.workflow.reject(&id, review.note).await?))
}

pub async fn remove(State(state): State<SharedState>, Path(id): Path<Id>) -> Result<StatusCode> {
    state.workflow.delete_submission(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Dashboards often post without a body.
fn review(body: &[u8]) -> Result<Review> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Review::default());
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_body() {
        assert_eq!(review(b"").unwrap().note, None);
        assert_eq!(
            review(br#"{"note":"See you there"}"#).unwrap().note.as_deref(),
            Some("See you there")
        );
        assert_eq!(
            review(br#"{"reason":"Missing waiver"}"#).unwrap().note.as_deref(),
            Some("Missing waiver")
        );
        assert!(matches!(
            review(b"not json"),
            Err(PortalError::SerializationError(_))
        ));
    }
}
