//! Core type definitions for service kinds and status messages.
//!
//! Service kinds are the labels under which discovered REST endpoints are
//! stored. Only kinds in [`RECOGNIZED_SERVICE_KINDS`] are ever persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Service kinds the bridge knows how to use, in lowercase.
pub const RECOGNIZED_SERVICE_KINDS: &[&str] = &[
    "acl-manager",
    "admin-ng/event",
    "api",
    "archive",
    "assets",
    "capture-admin",
    "ingest",
    "mediapackage",
    "recordings",
    "search",
    "series",
    "services",
    "upload",
    "workflow",
];

fn recognized_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| RECOGNIZED_SERVICE_KINDS.iter().copied().collect())
}

/// A service category label, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKind(String);

impl ServiceKind {
    /// The service registry itself.
    pub const SERVICES: &'static str = "services";
    /// The media package service used for track submission.
    pub const MEDIAPACKAGE: &'static str = "mediapackage";

    /// Create a kind from any casing.
    pub fn new(kind: &str) -> Self {
        Self(kind.trim().to_lowercase())
    }

    /// The registry kind under which the services list lives.
    pub fn services() -> Self {
        Self(Self::SERVICES.to_string())
    }

    /// Whether this kind is in the allow-list.
    pub fn is_recognized(&self) -> bool {
        recognized_set().contains(self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Severity of a user-facing status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Error,
    Success,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Message shown to the administrator after a configuration save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub text: String,
}

impl StatusMessage {
    pub fn error<S: Into<String>>(text: S) -> Self {
        Self {
            kind: MessageType::Error,
            text: text.into(),
        }
    }

    pub fn success<S: Into<String>>(text: S) -> Self {
        Self {
            kind: MessageType::Success,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageType::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind_lowercases() {
        let kind = ServiceKind::new("  Capture-Admin ");
        assert_eq!(kind.as_str(), "capture-admin");
        assert!(kind.is_recognized());
    }

    #[test]
    fn test_unrecognized_kind() {
        assert!(!ServiceKind::new("videoeditor").is_recognized());
        assert!(!ServiceKind::new("").is_recognized());
    }

    #[test]
    fn test_allow_list_is_lowercase() {
        for kind in RECOGNIZED_SERVICE_KINDS {
            assert_eq!(*kind, kind.to_lowercase());
            assert!(ServiceKind::new(kind).is_recognized());
        }
    }

    #[test]
    fn test_status_message_serialization() {
        let msg = StatusMessage::error("bad url");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["text"], "bad url");

        let msg = StatusMessage::success("ok");
        assert!(!msg.is_error());
        assert_eq!(serde_json::to_value(&msg).unwrap()["type"], "success");
    }
}
