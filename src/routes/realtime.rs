//! WebSocket feed for dashboards. Every stored visitor is pushed as
//! `{"event":"new-visitor","data":{...}}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::broadcast::{Broadcaster, NEW_VISITOR_EVENT};
use crate::models::Visitor;
use crate::AppState;

#[derive(Serialize)]
struct RealtimeEvent<'a> {
    event: &'static str,
    data: &'a Visitor,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(connect))
}

async fn connect(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_visitors(socket, state.broadcaster))
}

async fn stream_visitors(socket: WebSocket, broadcaster: Broadcaster) {
    let listener = Uuid::new_v4();
    let mut visitors = broadcaster.subscribe();
    let (mut sink, mut incoming) = socket.split();
    info!(%listener, "dashboard connected");

    loop {
        tokio::select! {
            received = visitors.recv() => match received {
                Ok(visitor) => {
                    let frame = match new_visitor_frame(&visitor) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(%listener, "failed to encode visitor event: {e}");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%listener, skipped, "dashboard fell behind, dropping events");
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!(%listener, "dashboard disconnected");
}

fn new_visitor_frame(visitor: &Visitor) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RealtimeEvent {
        event: NEW_VISITOR_EVENT,
        data: visitor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_carries_event_name_and_row() {
        let visitor: Visitor = serde_json::from_value(serde_json::json!({
            "id": "a",
            "asset_id": null,
            "ad_account_id": null,
            "target_url": "https://example.com",
            "session_id": null,
            "session_start": "2024-01-01 00:00:00",
            "timestamp": "2024-01-01 00:00:01",
            "ip": null,
            "hostname": null,
            "city": null,
            "region": null,
            "country": null,
            "loc": null,
            "org": null,
            "timezone": null,
            "device_id": "b",
            "device_type": "Desktop",
            "os": "Unknown",
            "browser": "Unknown",
            "utm_source": null,
            "utm_medium": null,
            "gclid": null,
            "fbclid": null,
            "zip": null
        }))
        .unwrap();

        let frame: serde_json::Value =
            serde_json::from_str(&new_visitor_frame(&visitor).unwrap()).unwrap();

        assert_eq!(frame["event"], "new-visitor");
        assert_eq!(frame["data"]["id"], "a");
        assert_eq!(frame["data"]["target_url"], "https://example.com");
        assert!(frame["data"].get("isp").is_none());
    }
}
