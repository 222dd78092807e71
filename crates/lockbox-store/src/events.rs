use lockbox_core::{VaultKey, VaultKind, VaultRecord};
use serde::Serialize;

/// Records of one vault as last read or written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub kind: VaultKind,
    pub records: Vec<VaultRecord>,
}

/// Broadcast by [`crate::VaultStore`] to anyone subscribed.
#[derive(Debug, Clone, PartialEq)]
pub enum VaultEvent {
    /// The remote store refused a read or write.
    AccessDenied { key: VaultKey, message: String },
    Snapshot(VaultSnapshot),
}
