#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use beacon::broadcast::Broadcaster;
use beacon::config::Backend;
use beacon::db::{SqliteVisitorStore, VisitorStore};
use beacon::geoip::{GeoInfo, GeoIpError, GeoIpResolver};
use beacon::models::Visitor;
use beacon::{build_app, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Geo-IP stand-in that records every address it is asked about.
#[derive(Default)]
pub struct StubGeoIp {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl StubGeoIp {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeoIpResolver for StubGeoIp {
    async fn resolve(&self, ip: &str) -> Result<GeoInfo, GeoIpError> {
        self.calls.lock().unwrap().push(ip.to_string());
        if self.fail {
            return Err(GeoIpError::Status(503));
        }

        let ip = if ip.is_empty() { "203.0.113.7" } else { ip };
        Ok(GeoInfo {
            ip: Some(ip.to_string()),
            hostname: None,
            city: Some("Berlin".to_string()),
            region: Some("Berlin".to_string()),
            country: Some("DE".to_string()),
            loc: Some("52.5244,13.4105".to_string()),
            org: Some("AS3320 Deutsche Telekom AG".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
            postal: Some("10115".to_string()),
        })
    }
}

/// Store whose every call fails, for exercising persistence errors.
pub struct FailingStore;

#[async_trait]
impl VisitorStore for FailingStore {
    async fn insert_visit(&self, _visitor: &Visitor) -> Result<Visitor, sqlx::Error> {
        Err(sqlx::Error::Protocol("disk I/O error".to_string()))
    }

    async fn list_visits(&self) -> Result<Vec<Visitor>, sqlx::Error> {
        Err(sqlx::Error::Protocol("disk I/O error".to_string()))
    }

    async fn close(&self) {}

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub geoip: Arc<StubGeoIp>,
    pub broadcaster: Broadcaster,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(StubGeoIp::default(), false).await
    }

    pub async fn with_failing_geoip() -> Self {
        Self::build(StubGeoIp::failing(), false).await
    }

    pub async fn with_failing_store() -> Self {
        Self::build(StubGeoIp::default(), true).await
    }

    async fn build(geoip: StubGeoIp, failing_store: bool) -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        let sqlite = SqliteVisitorStore::from_pool(pool.clone());
        sqlite.migrate().await.expect("Failed to run migrations");

        let store: Arc<dyn VisitorStore> = if failing_store {
            Arc::new(FailingStore)
        } else {
            Arc::new(sqlite)
        };

        let geoip = Arc::new(geoip);
        let broadcaster = Broadcaster::default();
        let state = AppState {
            store,
            geoip: geoip.clone(),
            broadcaster: broadcaster.clone(),
        };

        Self {
            router: build_app(state),
            db: pool,
            geoip,
            broadcaster,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// POST a tracking beacon, optionally as if forwarded for `forwarded_for`.
    pub async fn track(&self, payload: &Value, forwarded_for: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri("/api/track")
            .method("POST")
            .header("content-type", "application/json");
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let req = builder.body(Body::from(payload.to_string())).unwrap();
        self.request(req).await
    }

    /// POST a raw body to the tracking endpoint.
    pub async fn track_raw(&self, body: &str, content_type: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/api/track").method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    pub async fn visitor_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visitors")
            .fetch_one(&self.db)
            .await
            .unwrap();
        count
    }
}

pub fn track_payload() -> Value {
    json!({
        "userAgent": CHROME_UA,
        "utmParams": {
            "utm_source": "newsletter",
            "utm_medium": "email",
            "gclid": "",
        },
        "targetUrl": "https://example.com/landing",
        "assetId": "asset-42",
        "adAccountId": "act_1001",
        "sessionId": "session-abc",
        "sessionStart": "2024-03-05T14:07:09.123Z",
    })
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// `YYYY-MM-DD HH:MM:SS`, nothing more.
pub fn is_canonical_timestamp(value: &str) -> bool {
    value.len() == 19
        && chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok()
}
