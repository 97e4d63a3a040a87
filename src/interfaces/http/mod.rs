//! REST surface consumed by the portal front end.
//!
//! Public routes live under `/api`, dashboard routes under `/api/admin` and
//! behind [`auth::require_admin`]. Handlers stay thin: they extract, call
//! the application layer and let [`PortalError`] pick the status code.

pub mod auth;
pub mod purchases;
pub mod resources;
pub mod submissions;
pub mod uploads;
pub mod webhook;

use crate::application::auth::SessionManager;
use crate::application::uploads::UploadService;
use crate::application::workflow::{ApprovalWorkflow, WorkflowSettings};
use crate::config::Config;
use crate::domain::ports::{FileStore, Mailer, PaymentGateway, Stores};
use crate::error::{PortalError, Result};
use crate::infrastructure::gateway::WebhookVerifier;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

pub struct AppState {
    pub stores: Stores,
    pub workflow: ApprovalWorkflow,
    pub uploads: UploadService,
    pub sessions: SessionManager,
    pub verifier: WebhookVerifier,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wires the application services around the given adapters.
    pub fn new(
        config: &Config,
        stores: Stores,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        file_store: Arc<dyn FileStore>,
    ) -> SharedState {
        let settings = WorkflowSettings {
            public_url: config.public_url.clone(),
            currency: config.gateway.currency.clone(),
            admin_email: config.mail.admin_notify.clone(),
        };

        Arc::new(Self {
            workflow: ApprovalWorkflow::new(stores.clone(), gateway, mailer, settings),
            uploads: UploadService::new(stores.files.clone(), file_store),
            sessions: SessionManager::new(
                config.admin.username.clone(),
                config.admin.password_sha256.clone(),
                chrono::Duration::seconds(config.admin.session_ttl_secs),
            ),
            verifier: WebhookVerifier::new(&config.webhook_secret),
            max_upload_bytes: config.max_upload_bytes,
            cors_origin: config.cors_origin.clone(),
            stores,
        })
    }
}

pub fn router(state: SharedState) -> Router {
    let public = Router::new()
        .merge(resources::public_routes())
        .route("/submissions", post(submissions::submit))
        .route("/submissions/{id}", get(submissions::fetch))
        .route("/checkout", post(purchases::checkout))
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(state.max_upload_bytes + 64 * 1024)),
        )
        .route("/uploads/{id}", get(uploads::download))
        .route("/webhooks/payment", post(webhook::payment));

    let admin = Router::new()
        .merge(resources::admin_routes())
        .route("/submissions", get(submissions::list))
        .route(
            "/submissions/{id}",
            get(submissions::fetch).delete(submissions::remove),
        )
        .route("/submissions/{id}/approve", post(submissions::approve))
        .route("/submissions/{id}/reject", post(submissions::reject))
        .route("/purchases", get(purchases::list))
        .route("/purchases/export", get(purchases::export))
        .route("/purchases/{id}", get(purchases::fetch))
        .route("/purchases/{id}/complete", post(purchases::complete))
        .route("/purchases/{id}/cancel", post(purchases::cancel))
        .route("/uploads", get(uploads::list))
        .route("/uploads/{id}", delete(uploads::remove))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ))
        // Added after the guard, so reachable without a session.
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session));

    Router::new()
        .route("/health", get(health))
        .nest("/api", public)
        .nest("/api/admin", admin)
        .layer(cors(state.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match origin.map(HeaderValue::from_str) {
        // The dashboard sends its session cookie cross-origin.
        Some(Ok(origin)) => layer.allow_origin(origin).allow_credentials(true),
        Some(Err(_)) => {
            warn!("CORS_ORIGIN is not a valid header value, cross-origin requests disabled");
            layer
        }
        None => layer.allow_origin(Any),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let app = router(state);

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(PortalError::IoError)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
