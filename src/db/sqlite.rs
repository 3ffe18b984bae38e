use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::VisitorStore;
use crate::config::{Backend, DatabaseConfig};
use crate::models::Visitor;

const INSERT_VISITOR: &str = r#"
    INSERT INTO visitors (
        id, asset_id, ad_account_id, target_url, session_id, session_start, timestamp,
        ip, hostname, city, region, country, loc, org, timezone,
        device_id, device_type, os, browser,
        utm_source, utm_medium, gclid, fbclid, zip
    ) VALUES (
        ?, ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?, ?, ?, ?
    ) RETURNING *
"#;

/// Local development and test backend.
#[derive(Clone)]
pub struct SqliteVisitorStore {
    pool: SqlitePool,
}

impl SqliteVisitorStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let database_url = config.url.as_deref().unwrap_or("sqlite:data/beacon.db");

        // Ensure data directory exists
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl VisitorStore for SqliteVisitorStore {
    async fn insert_visit(&self, visitor: &Visitor) -> Result<Visitor, sqlx::Error> {
        sqlx::query_as::<_, Visitor>(INSERT_VISITOR)
            .bind(&visitor.id)
            .bind(&visitor.asset_id)
            .bind(&visitor.ad_account_id)
            .bind(&visitor.target_url)
            .bind(&visitor.session_id)
            .bind(&visitor.session_start)
            .bind(&visitor.timestamp)
            .bind(&visitor.ip)
            .bind(&visitor.hostname)
            .bind(&visitor.city)
            .bind(&visitor.region)
            .bind(&visitor.country)
            .bind(&visitor.loc)
            .bind(&visitor.org)
            .bind(&visitor.timezone)
            .bind(&visitor.device_id)
            .bind(&visitor.device_type)
            .bind(&visitor.os)
            .bind(&visitor.browser)
            .bind(&visitor.utm_source)
            .bind(&visitor.utm_medium)
            .bind(&visitor.gclid)
            .bind(&visitor.fbclid)
            .bind(&visitor.zip)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_visits(&self) -> Result<Vec<Visitor>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM visitors ORDER BY timestamp DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}
