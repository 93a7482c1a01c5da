//! Identity metadata handed to the signing backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity claim name must not be empty")]
    EmptyClaimName,
}

/// One claim copied from the caller's validated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub name: String,
    pub value: Option<String>,
}

/// Ordered claim-name to claim-value mapping.
///
/// The pipeline passes this through to the backend unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityMetadata {
    claims: Vec<IdentityClaim>,
}

impl IdentityMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a claim, keeping first-insertion order.
    ///
    /// A null value is accepted and logged; a blank name is rejected.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: Option<String>,
    ) -> Result<(), IdentityError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IdentityError::EmptyClaimName);
        }
        if value.is_none() {
            warn!(claim = %name, "value for signature metadata element was null");
        }
        match self.claims.iter_mut().find(|claim| claim.name == name) {
            Some(existing) => existing.value = value,
            None => self.claims.push(IdentityClaim { name, value }),
        }
        Ok(())
    }

    /// Builder form of [`IdentityMetadata::insert`].
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        self.insert(name, Some(value.into()))?;
        Ok(self)
    }

    pub fn claims(&self) -> &[IdentityClaim] {
        &self.claims
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.name == name)
            .and_then(|claim| claim.value.as_deref())
    }

    /// First non-null claim value; shown as the signer on envelopes.
    pub fn signer(&self) -> Option<&str> {
        self.claims.iter().find_map(|claim| claim.value.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let identity = IdentityMetadata::new()
            .with("preferred_username", "alice")
            .unwrap()
            .with("azp", "portal")
            .unwrap();
        let names: Vec<_> = identity.claims().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["preferred_username", "azp"]);
    }

    #[test]
    fn test_insert_replaces_existing_value_in_place() {
        let mut identity = IdentityMetadata::new()
            .with("a", "1")
            .unwrap()
            .with("b", "2")
            .unwrap();
        identity.insert("a", Some("3".to_string())).unwrap();
        assert_eq!(identity.claims().len(), 2);
        assert_eq!(identity.claims()[0].value.as_deref(), Some("3"));
    }

    #[test]
    fn test_blank_claim_name_rejected() {
        let mut identity = IdentityMetadata::new();
        assert_eq!(
            identity.insert("  ", Some("x".to_string())),
            Err(IdentityError::EmptyClaimName)
        );
        assert!(identity.is_empty());
    }

    #[test]
    fn test_null_value_is_kept() {
        let mut identity = IdentityMetadata::new();
        identity.insert("preferred_username", None).unwrap();
        assert_eq!(identity.claims().len(), 1);
        assert_eq!(identity.get("preferred_username"), None);
        assert_eq!(identity.signer(), None);
    }

    #[test]
    fn test_signer_is_first_present_value() {
        let mut identity = IdentityMetadata::new();
        identity.insert("sub", None).unwrap();
        identity.insert("preferred_username", Some("bob".into())).unwrap();
        assert_eq!(identity.signer(), Some("bob"));
    }
}
