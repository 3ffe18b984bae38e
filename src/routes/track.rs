use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::client_ip::ClientIp;
use crate::error::AppError;
use crate::models::{TrackRequest, TrackResponse, Visitor};
use crate::timestamp::parse_client_timestamp;
use crate::user_agent;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/track", post(track_visit))
}

async fn track_visit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<TrackResponse>, AppError> {
    let Json(payload) = payload?;
    let session_start = payload
        .session_start
        .as_deref()
        .and_then(parse_client_timestamp)
        .ok_or_else(|| AppError::InvalidPayload("Invalid sessionStart".to_string()))?;

    let geo = state.geoip.resolve(&ip).await?;
    let agent = user_agent::parse(payload.user_agent.as_deref().unwrap_or_default());

    let visitor = Visitor::assemble(payload, session_start, Utc::now(), geo, &agent);
    let stored = state.store.insert_visit(&visitor).await?;

    let listeners = state.broadcaster.publish(&stored);
    info!(id = %stored.id, country = ?stored.country, "visitor tracked");
    debug!(listeners, "broadcast new visitor");

    Ok(Json(TrackResponse::success(stored)))
}
