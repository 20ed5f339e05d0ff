//! Internal Rust models matching the database schema.

use chrono::{DateTime, Utc};
use ocbridge_common::{ConfigId, ServiceKind};
use serde::{Deserialize, Serialize};

/// Settings blob stored in `oc_config.config`.
///
/// Keys the bridge does not interpret are kept verbatim in `extra` so a save
/// never drops settings the host application added.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceSettings {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Media server version reported by the last successful version request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServiceSettings {
    pub fn new(url: &str, user: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            version: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// The singleton configuration row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigRecord {
    pub id: ConfigId,
    pub config: ServiceSettings,
    pub updated_at: DateTime<Utc>,
}

/// A discovered REST endpoint for one service kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    pub config_id: ConfigId,
    pub service_type: ServiceKind,
    pub service_url: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_keep_unknown_keys() {
        let json = serde_json::json!({
            "url": "https://oc.example.org",
            "user": "admin",
            "password": "secret",
            "upload_chunk_size": 5000000,
            "ssl_ignore_cert_errors": false
        });

        let settings: ServiceSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.url, "https://oc.example.org");
        assert_eq!(settings.version, None);
        assert_eq!(settings.extra.len(), 2);

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["upload_chunk_size"], 5000000);
        assert!(back.get("version").is_none());
    }

    #[test]
    fn test_settings_defaults_for_missing_fields() {
        let settings: ServiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ServiceSettings::default());
    }
}
