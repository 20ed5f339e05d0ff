//! Typed ID wrappers.
//!
//! The bridge is single-tenant: one configuration per install, stored under a
//! fixed well-known key. Endpoint rows reference it through [`ConfigId`].

use serde::{Deserialize, Serialize};

/// Identifier of a stored configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(i64);

impl ConfigId {
    /// The single configuration row every install uses.
    pub const SINGLETON: Self = Self(1);

    /// Raw database key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Default for ConfigId {
    fn default() -> Self {
        Self::SINGLETON
    }
}

impl From<i64> for ConfigId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ConfigId> for i64 {
    fn from(id: ConfigId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
