use serde::{Deserialize, Serialize};
use woothee::parser::{Parser, WootheeResult};

pub const DEFAULT_DEVICE_TYPE: &str = "Desktop";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAgentInfo {
    pub device_type: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
}

/// Classify a raw user-agent string. Never fails; unknown parts are `None`.
pub fn parse(user_agent: &str) -> UserAgentInfo {
    if user_agent.trim().is_empty() {
        return UserAgentInfo::default();
    }

    match Parser::new().parse(user_agent) {
        Some(result) => UserAgentInfo::from_woothee_result(&result),
        None => UserAgentInfo::default(),
    }
}

impl UserAgentInfo {
    fn from_woothee_result(result: &WootheeResult) -> Self {
        let os_name = clean(result.os);
        // "Windows 10" already names its release; woothee's "NT 10.0" would repeat it.
        let os_version = match os_name.as_deref() {
            Some(name) if ends_with_version(name) => None,
            _ => clean(&result.os_version),
        };

        Self {
            device_type: device_type(result.category, result.os),
            os_name,
            os_version,
            browser_name: clean(result.name),
            browser_version: clean(result.version),
        }
    }

    pub fn device_type_or_default(&self) -> &str {
        self.device_type.as_deref().unwrap_or(DEFAULT_DEVICE_TYPE)
    }

    /// OS name and version joined by a space.
    pub fn os(&self) -> String {
        join_parts(self.os_name.as_deref(), self.os_version.as_deref())
    }

    /// Browser name and version joined by a space.
    pub fn browser(&self) -> String {
        join_parts(self.browser_name.as_deref(), self.browser_version.as_deref())
    }
}

fn clean(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

fn ends_with_version(name: &str) -> bool {
    name.split_whitespace()
        .last()
        .is_some_and(|token| token != name && token.chars().any(|c| c.is_ascii_digit()))
}

// Desktop browsers carry no device type; callers fall back to "Desktop".
fn device_type(category: &str, os: &str) -> Option<String> {
    match category {
        "smartphone" if os == "iPad" => Some("tablet".to_string()),
        "smartphone" | "mobilephone" => Some("mobile".to_string()),
        "appliance" => Some("console".to_string()),
        _ => None,
    }
}

fn join_parts(name: Option<&str>, version: Option<&str>) -> String {
    match (name, version) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(part), None) | (None, Some(part)) => part.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}
