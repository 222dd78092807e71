/// First segment of every vault identifier.
pub const STORAGE_NAMESPACE: &str = "lockbox";

/// Last segment of every vault identifier.
pub const VAULT_SUFFIX: &str = "vault";

pub const DEFAULT_TENANT: &str = "default";
pub const DEFAULT_DEPARTMENT: &str = "department";

/// Tags attached when a vault secret is created for the first time.
pub const TAG_APP: &str = "app";
pub const TAG_VAULT_KIND: &str = "vault-kind";
