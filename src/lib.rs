pub mod broadcast;
pub mod client_ip;
pub mod config;
pub mod db;
pub mod error;
pub mod geoip;
pub mod models;
pub mod routes;
pub mod timestamp;
pub mod user_agent;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use broadcast::Broadcaster;
use db::VisitorStore;
use geoip::GeoIpResolver;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VisitorStore>,
    pub geoip: Arc<dyn GeoIpResolver>,
    pub broadcaster: Broadcaster,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// The store in `state` is expected to be connected and its schema
/// bootstrapped already.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .merge(routes::track::router())
        .merge(routes::visitors::router())
        .merge(routes::realtime::router())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
