//! Maps an identity and vault kind to the remote secret identifier.
//!
//! Every function here is pure: identical inputs always produce identical
//! identifiers, and nothing is cached. Any input that could make two
//! different vaults share an identifier is rejected instead of guessed.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DEPARTMENT, DEFAULT_TENANT, STORAGE_NAMESPACE, VAULT_SUFFIX};
use crate::errors::{VaultError, VaultResult};
use crate::models::VaultKind;

/// Caller-supplied inputs for vault addressing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultScope {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

/// Remote secret identifier of one vault blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultKey(String);

impl VaultKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an identifier that did not come from the resolver, such as a
    /// record's `externalSecretRef`.
    #[must_use]
    pub fn external(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }
}

impl std::fmt::Display for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VaultKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultContext {
    pub kind: VaultKind,
    pub collection_path: VaultKey,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl VaultScope {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// True when both account and region are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        present(self.account_id.as_deref()).is_some() && present(self.region.as_deref()).is_some()
    }

    /// Explicit tenant, else the lower-cased email domain, else `default`.
    #[must_use]
    pub fn tenant(&self) -> String {
        if let Some(tenant) = present(self.tenant.as_deref()) {
            return tenant.to_string();
        }
        tenant_from_email(self.email.as_deref())
    }

    pub fn resolve(&self, kind: VaultKind) -> VaultResult<VaultContext> {
        let account_id = present(self.account_id.as_deref())
            .ok_or(VaultError::MissingContext { field: "account_id" })?;
        let region = present(self.region.as_deref())
            .ok_or(VaultError::MissingContext { field: "region" })?;
        let tenant = self.tenant();

        let mut segments = vec![
            STORAGE_NAMESPACE.to_string(),
            segment("tenant", &tenant)?,
            segment("account_id", account_id)?,
            segment("region", region)?,
        ];
        match kind {
            VaultKind::Personal => {
                segments.push(segment("user_id", &self.user_id)?);
                segments.push(VaultKind::Personal.as_str().to_string());
            }
            VaultKind::Work => {
                let department =
                    present(self.department.as_deref()).unwrap_or(DEFAULT_DEPARTMENT);
                segments.push(segment("department", department)?);
            }
        }
        segments.push(VAULT_SUFFIX.to_string());

        Ok(VaultContext {
            kind,
            collection_path: VaultKey(segments.join("/")),
            region: region.to_string(),
            profile: present(self.profile.as_deref()).map(str::to_string),
        })
    }
}

/// Resolves the context for a vault kind given by name.
pub fn resolve_context(scope: &VaultScope, vault_kind: &str) -> VaultResult<VaultContext> {
    let kind: VaultKind = vault_kind.parse()?;
    scope.resolve(kind)
}

pub fn secret_identifier(scope: &VaultScope, vault_kind: &str) -> VaultResult<VaultKey> {
    resolve_context(scope, vault_kind).map(|context| context.collection_path)
}

/// Lower-cased email domain, or `default` when there is none. The domain is
/// returned as is; `resolve` rejects it if it is not a valid segment.
#[must_use]
pub fn tenant_from_email(email: Option<&str>) -> String {
    email
        .and_then(|email| email.rsplit_once('@'))
        .map(|(_, domain)| domain.trim().to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
        .unwrap_or_else(|| DEFAULT_TENANT.to_string())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn segment(field: &'static str, value: &str) -> VaultResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(VaultError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
