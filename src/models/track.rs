use serde::{Deserialize, Deserializer, Serialize};

use super::Visitor;

/// Beacon payload posted by the tracking snippet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub user_agent: Option<String>,
    pub utm_params: Option<UtmParams>,
    pub target_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub asset_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub ad_account_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub session_id: Option<String>,
    pub session_start: Option<String>,
}

// Ad platforms hand out numeric account and asset ids; keep them as text.
fn deserialize_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Unsigned(u) => u.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    }))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub status: &'static str,
    pub data: Visitor,
}

impl TrackResponse {
    pub fn success(data: Visitor) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}
