//! Flattened copy of every unlocked vault for the tray search box.
//!
//! The mirror only pushes when the flattened content actually changed, so
//! callers may sync as often as they like.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lockbox_core::{VaultKind, VaultRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, instrument, warn};

use crate::events::{VaultEvent, VaultSnapshot};

/// One record as the tray sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayEntry {
    pub vault_kind: VaultKind,
    #[serde(flatten)]
    pub record: VaultRecord,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cache sink unavailable: {0}")]
    Unavailable(String),
    #[error("cache serialization failed: {0}")]
    Serialize(String),
}

/// Destination of flattened snapshots (the tray's search cache).
#[async_trait]
pub trait CacheSink: Send + Sync {
    async fn push(&self, entries: &[TrayEntry]) -> Result<(), SinkError>;
}

/// Keeps every push; can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryCacheSink {
    pushes: std::sync::Mutex<Vec<Vec<TrayEntry>>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MemoryCacheSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn pushes(&self) -> Vec<Vec<TrayEntry>> {
        self.pushes
            .lock()
            .map(|pushes| pushes.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<Vec<TrayEntry>> {
        self.pushes().pop()
    }
}

#[async_trait]
impl CacheSink for MemoryCacheSink {
    async fn push(&self, entries: &[TrayEntry]) -> Result<(), SinkError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SinkError::Unavailable("sink offline".to_string()));
        }
        let mut pushes = self
            .pushes
            .lock()
            .map_err(|_| SinkError::Unavailable("sink poisoned".to_string()))?;
        pushes.push(entries.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct MirrorState {
    baseline: Option<blake3::Hash>,
    sections: BTreeMap<VaultKind, Vec<VaultRecord>>,
}

pub struct TrayMirror {
    sink: Arc<dyn CacheSink>,
    state: Mutex<MirrorState>,
}

impl TrayMirror {
    pub fn new(sink: Arc<dyn CacheSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(MirrorState::default()),
        }
    }

    /// Replaces every section with `snapshots`. Returns whether a push
    /// happened.
    #[instrument(level = "debug", skip(self, snapshots), fields(sections = snapshots.len()))]
    pub async fn sync(&self, snapshots: &[VaultSnapshot]) -> Result<bool, SinkError> {
        let mut state = self.state.lock().await;
        let mut sections: BTreeMap<VaultKind, Vec<VaultRecord>> = BTreeMap::new();
        for snapshot in snapshots {
            sections
                .entry(snapshot.kind)
                .or_default()
                .extend(snapshot.records.iter().cloned());
        }
        state.sections = sections;
        self.push_if_changed(&mut state).await
    }

    /// Replaces the section of one vault kind and syncs the union.
    pub async fn observe(&self, snapshot: VaultSnapshot) -> Result<bool, SinkError> {
        let mut state = self.state.lock().await;
        state.sections.insert(snapshot.kind, snapshot.records);
        self.push_if_changed(&mut state).await
    }

    /// Pushes an empty cache and forgets the baseline.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        state.sections.clear();
        state.baseline = None;
        self.sink.push(&[]).await
    }

    /// Applies snapshots from the store's channel until it closes.
    pub async fn follow(self: Arc<Self>, mut events: broadcast::Receiver<VaultEvent>) {
        loop {
            match events.recv().await {
                Ok(VaultEvent::Snapshot(snapshot)) => {
                    if let Err(err) = self.observe(snapshot).await {
                        warn!(event = "tray_sync_failed", error = %err);
                    }
                }
                Ok(VaultEvent::AccessDenied { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = "tray_events_lagged", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn push_if_changed(&self, state: &mut MirrorState) -> Result<bool, SinkError> {
        let entries = flatten(&state.sections);
        let serialized =
            serde_json::to_vec(&entries).map_err(|err| SinkError::Serialize(err.to_string()))?;
        let hash = blake3::hash(&serialized);
        if state.baseline == Some(hash) {
            debug!(event = "tray_sync_unchanged", entries = entries.len());
            return Ok(false);
        }
        self.sink.push(&entries).await?;
        state.baseline = Some(hash);
        debug!(event = "tray_sync_pushed", entries = entries.len());
        Ok(true)
    }
}

fn flatten(sections: &BTreeMap<VaultKind, Vec<VaultRecord>>) -> Vec<TrayEntry> {
    let mut entries: Vec<TrayEntry> = sections
        .iter()
        .flat_map(|(kind, records)| {
            records.iter().map(|record| TrayEntry {
                vault_kind: *kind,
                record: record.clone(),
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.vault_kind
            .cmp(&b.vault_kind)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    entries
}
