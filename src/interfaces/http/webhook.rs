use super::SharedState;
use crate::application::workflow::ReconcileOutcome;
use crate::domain::webhook::PaymentEvent;
use crate::error::Result;
use crate::infrastructure::gateway::SIGNATURE_HEADER;
use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use chrono::Utc;
use tracing::warn;

/// Gateway callback. The raw body is verified before it is parsed.
pub async fn payment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReconcileOutcome>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = state.verifier.verify(signature, &body, Utc::now()) {
        warn!("Rejected webhook: {e}");
        return Err(e);
    }

    let event: PaymentEvent = serde_json::from_slice(&body)?;
    Ok(Json(state.workflow.reconcile(event).await?))
}
