//! Tenant identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque tenant identifier.
///
/// Serializes as a bare string.
///
/// # Examples
///
/// ```
/// use arbor_persistence::tenant::TenantId;
///
/// let tenant: TenantId = "acme".parse().unwrap();
/// assert_eq!(tenant, TenantId::new("acme"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_creation() {
        let tenant = TenantId::new("acme-mining");
        assert_eq!(tenant.as_str(), "acme-mining");
        assert!(!tenant.is_blank());
        assert!(TenantId::new("   ").is_blank());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", TenantId::new("acme")), "TenantId(acme)");
    }

    #[test]
    fn test_serde_is_transparent() {
        let tenant = TenantId::new("acme/north-plant");
        let json = serde_json::to_string(&tenant).unwrap();
        assert_eq!(json, "\"acme/north-plant\"");

        let parsed: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tenant);
    }

    #[test]
    fn test_from_string() {
        let tenant: TenantId = "acme".into();
        assert_eq!(tenant.as_str(), "acme");

        let tenant2: TenantId = String::from("acme").into();
        assert_eq!(tenant2, tenant);
    }
}
