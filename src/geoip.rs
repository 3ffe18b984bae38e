//! Geo-IP lookup against an ipinfo.io compatible endpoint.
//!
//! Handlers only see [`GeoIpResolver`]; [`IpInfoClient`] is the production
//! implementation and tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::GeoIpConfig;

/// Location metadata for one address. Fields the service omits stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub loc: Option<String>,
    pub org: Option<String>,
    pub timezone: Option<String>,
    pub postal: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeoIpError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error("invalid geo-ip base url: {0}")]
    BaseUrl(String),
}

#[async_trait]
pub trait GeoIpResolver: Send + Sync {
    /// Resolve `ip`. An empty string asks the service to use the caller's
    /// own address.
    async fn resolve(&self, ip: &str) -> Result<GeoInfo, GeoIpError>;
}

pub struct IpInfoClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl IpInfoClient {
    pub fn new(config: &GeoIpConfig) -> Result<Self, GeoIpError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| GeoIpError::BaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GeoIpError::BaseUrl(config.base_url.clone()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    fn lookup_url(&self, ip: &str) -> Result<Url, GeoIpError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeoIpError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(ip);
        if !self.token.is_empty() {
            url.query_pairs_mut().append_pair("token", &self.token);
        }
        Ok(url)
    }
}

#[async_trait]
impl GeoIpResolver for IpInfoClient {
    async fn resolve(&self, ip: &str) -> Result<GeoInfo, GeoIpError> {
        let url = self.lookup_url(ip)?;
        debug!(ip, "resolving geo-ip");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoIpError::Status(status.as_u16()));
        }

        Ok(response.json::<GeoInfo>().await?)
    }
}
