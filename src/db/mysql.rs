use std::str::FromStr;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};

use super::VisitorStore;
use crate::config::{Backend, DatabaseConfig};
use crate::models::Visitor;

// MySQL has no RETURNING; the assembled row is what gets stored.
const INSERT_VISITOR: &str = r#"
    INSERT INTO visitors (
        id, asset_id, ad_account_id, target_url, session_id, session_start, `timestamp`,
        ip, hostname, city, region, country, loc, org, timezone,
        device_id, device_type, os, browser,
        utm_source, utm_medium, gclid, fbclid, zip, isp
    ) VALUES (
        ?, ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?
    )
"#;

#[derive(Clone)]
pub struct MySqlVisitorStore {
    pool: MySqlPool,
}

impl MySqlVisitorStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let mut options = match &config.url {
            Some(url) => MySqlConnectOptions::from_str(url)?,
            None => {
                let mut options = MySqlConnectOptions::new().host(&config.host);
                if let Some(port) = config.port {
                    options = options.port(port);
                }
                if let Some(user) = &config.user {
                    options = options.username(user);
                }
                if let Some(password) = &config.password {
                    options = options.password(password);
                }
                if let Some(name) = &config.name {
                    options = options.database(name);
                }
                options
            }
        };
        if config.ssl {
            options = options.ssl_mode(MySqlSslMode::Required);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations/mysql").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl VisitorStore for MySqlVisitorStore {
    async fn insert_visit(&self, visitor: &Visitor) -> Result<Visitor, sqlx::Error> {
        sqlx::query(INSERT_VISITOR)
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
            .bind(&visitor.isp)
            .execute(&self.pool)
            .await?;

        Ok(visitor.clone())
    }

    async fn list_visits(&self) -> Result<Vec<Visitor>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM visitors ORDER BY `timestamp` DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> Backend {
        Backend::MySql
    }
}
