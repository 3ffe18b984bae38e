use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppError;
use crate::models::Visitor;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/visitors", get(list_visitors))
}

async fn list_visitors(State(state): State<AppState>) -> Result<Json<Vec<Visitor>>, AppError> {
    let visitors = state.store.list_visits().await?;
    Ok(Json(visitors))
}
