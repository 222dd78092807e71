use lockbox_core::{normalize_tags, RecordPatch, VaultBlob, VaultError, VaultRecord, VaultResult};
use uuid::Uuid;

/// One mutation of a vault map.
#[derive(Debug, Clone, PartialEq)]
pub enum VaultOp {
    /// Insert, replacing any record with the same id.
    Create(VaultRecord),
    /// Shallow merge; creates the record when the id is unknown.
    Update { id: String, patch: RecordPatch },
    /// Delete; unknown ids are ignored.
    Remove { id: String },
}

impl VaultOp {
    /// Builds a create with its id fixed up front, so retries re-apply the
    /// same record.
    #[must_use]
    pub fn create(mut record: VaultRecord) -> Self {
        if record.id.trim().is_empty() {
            record.id = new_record_id();
        }
        Self::Create(record)
    }

    pub fn validate(&self) -> VaultResult<()> {
        match self {
            Self::Create(record) if record.title.trim().is_empty() => {
                Err(VaultError::InvalidRecord("title is required"))
            }
            Self::Update { id, .. } | Self::Remove { id } if id.trim().is_empty() => {
                Err(VaultError::InvalidRecord("id is required"))
            }
            _ => Ok(()),
        }
    }

    /// Applies the mutation and returns the affected record: the stored
    /// record for create/update, the removed one (if any) for remove.
    pub fn apply(self, blob: &mut VaultBlob) -> Option<VaultRecord> {
        match self {
            Self::Create(mut record) => {
                if record.id.trim().is_empty() {
                    record.id = new_record_id();
                }
                record.tags = normalize_tags(std::mem::take(&mut record.tags));
                blob.insert(record.id.clone(), record.clone());
                Some(record)
            }
            Self::Update { id, patch } => {
                let entry = blob.entry(id.clone()).or_insert_with(|| VaultRecord {
                    id,
                    ..VaultRecord::default()
                });
                entry.merge(patch);
                Some(entry.clone())
            }
            Self::Remove { id } => blob.remove(&id),
        }
    }
}

#[must_use]
pub fn new_record_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> VaultBlob {
        let mut blob = VaultBlob::new();
        VaultOp::Create(VaultRecord {
            id: "a".to_string(),
            username: Some("alice".to_string()),
            ..VaultRecord::new("A")
        })
        .apply(&mut blob);
        blob
    }

    #[test]
    fn create_assigns_an_id_when_missing() {
        let mut blob = VaultBlob::new();
        let created = VaultOp::Create(VaultRecord::new("Gmail"))
            .apply(&mut blob)
            .expect("record");
        assert!(!created.id.is_empty());
        assert_eq!(blob[&created.id].title, "Gmail");
    }

    #[test]
    fn create_fixes_id_before_apply() {
        let op = VaultOp::create(VaultRecord::new("Gmail"));
        let VaultOp::Create(record) = &op else {
            panic!("expected create");
        };
        assert!(!record.id.is_empty());
        let mut first = VaultBlob::new();
        let mut second = VaultBlob::new();
        op.clone().apply(&mut first);
        op.apply(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn create_with_existing_id_overwrites() {
        let mut blob = seeded();
        VaultOp::Create(VaultRecord {
            id: "a".to_string(),
            ..VaultRecord::new("Replaced")
        })
        .apply(&mut blob);
        assert_eq!(blob.len(), 1);
        assert_eq!(blob["a"].title, "Replaced");
        assert_eq!(blob["a"].username, None);
    }

    #[test]
    fn create_normalizes_tags() {
        let mut blob = VaultBlob::new();
        let mut record = VaultRecord::new("Bank");
        record.tags.insert("money stuff".to_string());
        let created = VaultOp::Create(record).apply(&mut blob).expect("record");
        assert!(created.tags.contains("#money-stuff"));
    }

    #[test]
    fn update_merges_onto_existing() {
        let mut blob = seeded();
        let updated = VaultOp::Update {
            id: "a".to_string(),
            patch: RecordPatch {
                title: Some("A2".to_string()),
                ..RecordPatch::default()
            },
        }
        .apply(&mut blob)
        .expect("record");
        assert_eq!(updated.title, "A2");
        assert_eq!(updated.username.as_deref(), Some("alice"));
    }

    #[test]
    fn update_on_missing_id_creates_entry() {
        let mut blob = VaultBlob::new();
        VaultOp::Update {
            id: "new".to_string(),
            patch: RecordPatch {
                title: Some("X".to_string()),
                ..RecordPatch::default()
            },
        }
        .apply(&mut blob);
        assert_eq!(blob.len(), 1);
        assert_eq!(
            blob["new"],
            VaultRecord {
                id: "new".to_string(),
                title: "X".to_string(),
                ..VaultRecord::default()
            }
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut once = seeded();
        VaultOp::Remove { id: "a".to_string() }.apply(&mut once);
        let mut twice = seeded();
        VaultOp::Remove { id: "a".to_string() }.apply(&mut twice);
        let second = VaultOp::Remove { id: "a".to_string() }.apply(&mut twice);
        assert!(second.is_none());
        assert_eq!(once, twice);
        assert!(once.is_empty());
    }

    #[test]
    fn validation_rejects_blank_title_and_id() {
        assert_eq!(
            VaultOp::Create(VaultRecord::new("  ")).validate(),
            Err(VaultError::InvalidRecord("title is required"))
        );
        assert_eq!(
            VaultOp::Remove { id: String::new() }.validate(),
            Err(VaultError::InvalidRecord("id is required"))
        );
        assert!(VaultOp::create(VaultRecord::new("ok")).validate().is_ok());
    }
}
