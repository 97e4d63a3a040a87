use super::SharedState;
use crate::application::workflow::CheckoutOrder;
use crate::domain::money::Price;
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::domain::record::{Document, Id, sort_newest_first};
use crate::error::{PortalError, Result};
use crate::interfaces::csv::purchase_writer::PurchaseWriter;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseFilter {
    pub status: Option<PurchaseStatus>,
    pub product_id: Option<Id>,
}

/// What the store page needs to redirect the buyer.
#[derive(Debug, Serialize)]
pub struct CheckoutReceipt {
    pub purchase_id: Id,
    pub checkout_url: Option<String>,
    pub total: Price,
}

pub async fn checkout(
    State(state): State<SharedState>,
    Json(order): Json<CheckoutOrder>,
) -> Result<(StatusCode, Json<CheckoutReceipt>)> {
    let purchase = state.workflow.checkout(order).await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutReceipt {
            checkout_url: purchase.checkout_url().map(str::to_string),
            purchase_id: purchase.id,
            total: purchase.total,
        }),
    ))
}

pub async fn list(
    State(state): State<SharedState>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Json<Vec<Purchase>>> {
    Ok(Json(filtered(&state, &filter).await?))
}

pub async fn fetch(State(state): State<SharedState>, Path(id): Path<Id>) -> Result<Json<Purchase>> {
    state
        .stores
        .purchases
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::not_found(Purchase::KIND, &id))
}

pub async fn export(
    State(state): State<SharedState>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Response> {
    let purchases = filtered(&state, &filter).await?;

    let mut writer = PurchaseWriter::new(Vec::new());
    writer.write_purchases(&purchases)?;
    let body = writer.into_inner()?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"purchases.csv\""),
        ],
        body,
    )
        .into_response())
}

pub async fn complete(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
) -> Result<Json<Purchase>> {
    Ok(Json(state.workflow.complete_purchase(&id).await?))
}

pub async fn cancel(State(state): State<SharedState>, Path(id): Path<Id>) -> Result<Json<Purchase>> {
    Ok(Json(state.workflow.cancel_purchase(&id).await?))
}

async fn filtered(state: &SharedState, filter: &PurchaseFilter) -> Result<Vec<Purchase>> {
    let mut purchases: Vec<Purchase> = state
        .stores
        .purchases
        .get_all()
        .await?
        .into_iter()
        .filter(|p| filter.status.is_none_or(|status| p.status == status))
        .filter(|p| filter.product_id.as_ref().is_none_or(|product| &p.product_id == product))
        .collect();
    sort_newest_first(&mut purchases);
    Ok(purchases)
}
