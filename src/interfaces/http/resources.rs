use super::{AppState, SharedState};
use crate::domain::content::{Announcement, Club, Video};
use crate::domain::event::Event;
use crate::domain::ports::RepositoryRef;
use crate::domain::product::Product;
use crate::domain::record::{Editable, Id, sort_newest_first};
use crate::error::{PortalError, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use tracing::info;

/// A collection admins edit and visitors browse.
pub trait Resource: Editable {
    /// Route segment, e.g. `/products`.
    const PATH: &'static str;

    fn repository(state: &AppState) -> &RepositoryRef<Self>;

    /// Whether visitors may see this record.
    fn is_public(&self) -> bool {
        true
    }

    fn arrange(docs: &mut [Self]) {
        sort_newest_first(docs);
    }
}

impl Resource for Product {
    const PATH: &'static str = "/products";

    fn repository(state: &AppState) -> &RepositoryRef<Self> {
        &state.stores.products
    }

    fn is_public(&self) -> bool {
        self.active
    }

    fn arrange(docs: &mut [Self]) {
        docs.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Resource for Event {
    const PATH: &'static str = "/events";

    fn repository(state: &AppState) -> &RepositoryRef<Self> {
        &state.stores.events
    }

    // Soonest first.
    fn arrange(docs: &mut [Self]) {
        docs.sort_by_key(|event| event.starts_at);
    }
}

impl Resource for Announcement {
    const PATH: &'static str = "/announcements";

    fn repository(state: &AppState) -> &RepositoryRef<Self> {
        &state.stores.announcements
    }

    /// Scheduled announcements stay hidden until published.
    fn is_public(&self) -> bool {
        self.published_at <= Utc::now()
    }

    fn arrange(docs: &mut [Self]) {
        docs.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.published_at.cmp(&a.published_at))
        });
    }
}

impl Resource for Club {
    const PATH: &'static str = "/clubs";

    fn repository(state: &AppState) -> &RepositoryRef<Self> {
        &state.stores.clubs
    }

    fn arrange(docs: &mut [Self]) {
        docs.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Resource for Video {
    const PATH: &'static str = "/videos";

    fn repository(state: &AppState) -> &RepositoryRef<Self> {
        &state.stores.videos
    }
}

pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .merge(public::<Product>())
        .merge(public::<Event>())
        .merge(public::<Announcement>())
        .merge(public::<Club>())
        .merge(public::<Video>())
}

pub fn admin_routes() -> Router<SharedState> {
    Router::new()
        .merge(admin::<Product>())
        .merge(admin::<Event>())
        .merge(admin::<Announcement>())
        .merge(admin::<Club>())
        .merge(admin::<Video>())
}

fn public<R: Resource>() -> Router<SharedState> {
    Router::new()
        .route(R::PATH, get(list_public::<R>))
        .route(&format!("{}/{{id}}", R::PATH), get(fetch_public::<R>))
}

fn admin<R: Resource>() -> Router<SharedState> {
    Router::new()
        .route(R::PATH, get(list_all::<R>).post(create::<R>))
        .route(
            &format!("{}/{{id}}", R::PATH),
            get(fetch::<R>).put(update::<R>).delete(remove::<R>),
        )
}

async fn list_public<R: Resource>(State(state): State<SharedState>) -> Result<Json<Vec<R>>> {
    let mut docs: Vec<R> = R::repository(&state)
        .get_all()
        .await?
        .into_iter()
        .filter(|doc| doc.is_public())
        .collect();
    R::arrange(&mut docs);
    Ok(Json(docs))
}

async fn fetch_public<R: Resource>(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
) -> Result<Json<R>> {
    match R::repository(&state).get(&id).await? {
        Some(doc) if doc.is_public() => Ok(Json(doc)),
        _ => Err(PortalError::not_found(R::KIND, &id)),
    }
}

async fn list_all<R: Resource>(State(state): State<SharedState>) -> Result<Json<Vec<R>>> {
    let mut docs = R::repository(&state).get_all().await?;
    R::arrange(&mut docs);
    Ok(Json(docs))
}

async fn fetch<R: Resource>(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
) -> Result<Json<R>> {
    R::repository(&state)
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::not_found(R::KIND, &id))
}

async fn create<R: Resource>(
    State(state): State<SharedState>,
    Json(draft): Json<R::Draft>,
) -> Result<(StatusCode, Json<R>)> {
    let doc = R::create(draft)?;
    R::repository(&state).store(doc.clone()).await?;
    info!(kind = R::KIND, id = %doc.id(), "Created");
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn update<R: Resource>(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
    Json(draft): Json<R::Draft>,
) -> Result<Json<R>> {
    let repository = R::repository(&state);
    let mut doc = repository
        .get(&id)
        .await?
        .ok_or_else(|| PortalError::not_found(R::KIND, &id))?;
    doc.revise(draft)?;
    repository.store(doc.clone()).await?;
    info!(kind = R::KIND, id = %id, "Updated");
    Ok(Json(doc))
}

async fn remove<R: Resource>(
    State(state): State<SharedState>,
    Path(id): Path<Id>,
) -> Result<StatusCode> {
    if !R::repository(&state).delete(&id).await? {
        return Err(PortalError::not_found(R::KIND, &id));
    }
    info!(kind = R::KIND, id = %id, "Deleted");
    Ok(StatusCode::NO_CONTENT)
}
