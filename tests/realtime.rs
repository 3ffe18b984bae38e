mod common;

use std::net::SocketAddr;
use std::time::Duration;

use beacon::broadcast::Broadcaster;
use common::{track_payload, TestApp};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;

/// Serve the app on an ephemeral port and return its address.
async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

async fn wait_for_listeners(broadcaster: &Broadcaster, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while broadcaster.listener_count() != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener count never settled");
}

#[tokio::test]
async fn dashboard_receives_one_new_visitor_frame() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_listeners(&app.broadcaster, 1).await;

    let tracked: Value = reqwest::Client::new()
        .post(format!("http://{addr}/api/track"))
        .json(&track_payload())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tracked["status"], "success");

    let frame = timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("no frame within timeout")
        .expect("socket closed")
        .unwrap();
    let event: Value = serde_json::from_str(&frame.into_text().unwrap()).unwrap();

    assert_eq!(event["event"], "new-visitor");
    assert_eq!(event["data"], tracked["data"]);

    let second = timeout(Duration::from_millis(300), socket.next()).await;
    assert!(second.is_err(), "unexpected second frame: {second:?}");

    socket.close(None).await.unwrap();
    wait_for_listeners(&app.broadcaster, 0).await;
}

#[tokio::test]
async fn loopback_peer_is_resolved_as_auto_detect() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let status = reqwest::Client::new()
        .post(format!("http://{addr}/api/track"))
        .json(&track_payload())
        .send()
        .await
        .unwrap()
        .status();

    assert!(status.is_success());
    assert_eq!(app.geoip.calls(), vec![""]);
}

#[tokio::test]
async fn disconnect_unsubscribes_the_dashboard() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let (first, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut second, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_listeners(&app.broadcaster, 2).await;

    drop(first);
    wait_for_listeners(&app.broadcaster, 1).await;

    second.close(None).await.unwrap();
    wait_for_listeners(&app.broadcaster, 0).await;
}
