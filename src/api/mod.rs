//! HTTP layer: router, shared state and server bootstrap.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod types;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Settings, inference::InferenceEngine, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub engine: Arc<InferenceEngine>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Store, engine: InferenceEngine, settings: Settings) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            settings: Arc::new(settings),
        }
    }
}

/// Build the full application router.
///
/// Everything except the liveness probe lives under `/api/v1`; all routes
/// but signup and token issuance require a bearer access token.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(routes::auth::me))
        .route("/adr", get(routes::adr::list).post(routes::adr::create))
        .route(
            "/adr/:id",
            get(routes::adr::detail)
                .put(routes::adr::update)
                .delete(routes::adr::remove),
        )
        .route(
            "/causality_assessment_level/:id",
            get(routes::assessment::detail),
        )
        .route(
            "/causality_assessment_level/:id/review",
            get(routes::assessment::reviews).post(routes::assessment::add_review),
        )
        .route(
            "/review/:id",
            get(routes::review::detail)
                .put(routes::review::update)
                .delete(routes::review::remove),
        )
        .route("/monitoring", get(routes::monitoring::summary))
        .route(
            "/medical_institution",
            get(routes::institution::list).post(routes::institution::create),
        )
        .route(
            "/medical_institution/:id",
            get(routes::institution::detail)
                .put(routes::institution::update)
                .delete(routes::institution::remove),
        )
        .route(
            "/medical_institution/:id/telephone",
            get(routes::institution::telephones).post(routes::institution::add_telephone),
        )
        .route(
            "/medical_institution/:id/telephone/:telephone_id",
            axum::routing::delete(routes::institution::remove_telephone),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let public = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/token", post(routes::auth::token))
        .route("/token/refresh", post(routes::auth::refresh));

    Router::new()
        .route("/", get(routes::root))
        .nest("/api/v1", protected.merge(public))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(state: AppState, host: String, port: u16) -> Result<()> {
    let router = router(state);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving adr-causality API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
