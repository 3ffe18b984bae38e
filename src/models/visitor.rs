use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{TrackRequest, UtmParams};
use crate::geoip::GeoInfo;
use crate::timestamp::format_timestamp;
use crate::user_agent::UserAgentInfo;

/// One row of the `visitors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Visitor {
    pub id: String,
    pub asset_id: Option<String>,
    pub ad_account_id: Option<String>,
    pub target_url: Option<String>,
    pub session_id: Option<String>,
    pub session_start: String,
    pub timestamp: String,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub loc: Option<String>,
    pub org: Option<String>,
    pub timezone: Option<String>,
    pub device_id: String,
    pub device_type: String,
    pub os: String,
    pub browser: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub zip: Option<String>,
    /// Only the MySQL table carries this column.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
}

impl Visitor {
    /// Build a fresh row from an enriched beacon. `id` and `device_id` are
    /// new v4 UUIDs; `received_at` becomes the row `timestamp`.
    pub fn assemble(
        request: TrackRequest,
        session_start: DateTime<Utc>,
        received_at: DateTime<Utc>,
        geo: GeoInfo,
        agent: &UserAgentInfo,
    ) -> Self {
        let utm = request.utm_params.unwrap_or_default();
        let UtmParams {
            utm_source,
            utm_medium,
            gclid,
            fbclid,
        } = utm;
        let isp = derive_isp(geo.org.as_deref());

        Self {
            id: Uuid::new_v4().to_string(),
            asset_id: request.asset_id,
            ad_account_id: request.ad_account_id,
            target_url: request.target_url,
            session_id: request.session_id,
            session_start: format_timestamp(session_start),
            timestamp: format_timestamp(received_at),
            ip: geo.ip,
            hostname: geo.hostname,
            city: geo.city,
            region: geo.region,
            country: geo.country,
            loc: geo.loc,
            org: geo.org,
            timezone: geo.timezone,
            device_id: Uuid::new_v4().to_string(),
            device_type: agent.device_type_or_default().to_string(),
            os: agent.os(),
            browser: agent.browser(),
            utm_source: non_empty(utm_source),
            utm_medium: non_empty(utm_medium),
            gclid: non_empty(gclid),
            fbclid: non_empty(fbclid),
            zip: geo.postal,
            isp,
        }
    }
}

/// The organisation string minus its leading token, e.g. the AS number in
/// `"AS15169 Google LLC"`.
pub fn derive_isp(org: Option<&str>) -> Option<String> {
    org.map(|org| org.split(' ').skip(1).collect::<Vec<_>>().join(" "))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
