use std::fmt;

use serde::{Deserialize, Serialize};

/// The value of the single `permisos.rol` row.
///
/// Only the exact string `"admin"` unlocks writes; any other value, including
/// differently cased variants, leaves the API read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const VIEWER: &'static str = "viewer";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    #[must_use]
    pub fn viewer() -> Self {
        Self::new(Self::VIEWER)
    }

    /// Returns true if this role makes the system writable.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(value)
    }
}
