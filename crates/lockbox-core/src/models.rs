use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::VaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    /// Per-user vault, encrypted with the master key.
    Personal,
    /// Per-department vault, stored as plain JSON.
    Work,
}

impl VaultKind {
    pub const ALL: [Self; 2] = [Self::Personal, Self::Work];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "work",
        }
    }
}

impl std::fmt::Display for VaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VaultKind {
    type Err = VaultError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "personal" => Ok(Self::Personal),
            "work" => Ok(Self::Work),
            _ => Err(VaultError::InvalidVaultKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[default]
    #[serde(rename = "passwords")]
    Passwords,
    #[serde(rename = "notes")]
    Notes,
    #[serde(rename = "cards")]
    Cards,
    #[serde(rename = "api-keys")]
    ApiKeys,
    #[serde(rename = "team")]
    Team,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passwords => "passwords",
            Self::Notes => "notes",
            Self::Cards => "cards",
            Self::ApiKeys => "api-keys",
            Self::Team => "team",
        }
    }
}

#[derive(Debug)]
pub struct EnumParseError {
    enum_name: &'static str,
    value: String,
}

impl std::fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for EnumParseError {}

impl std::str::FromStr for Category {
    type Err = EnumParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "passwords" => Ok(Self::Passwords),
            "notes" => Ok(Self::Notes),
            "cards" => Ok(Self::Cards),
            "api-keys" => Ok(Self::ApiKeys),
            "team" => Ok(Self::Team),
            _ => Err(EnumParseError {
                enum_name: "category",
                value: value.to_string(),
            }),
        }
    }
}

/// One secret entry. Fields this version does not know about are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_secret_ref: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl VaultRecord {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Shallow merge: every field present in `patch` replaces the current
    /// value, absent fields are kept.
    pub fn merge(&mut self, patch: RecordPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(username) = patch.username {
            self.username = Some(username);
        }
        if let Some(password) = patch.password {
            self.password = Some(password);
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(favorite) = patch.favorite {
            self.favorite = favorite;
        }
        if let Some(reference) = patch.external_secret_ref {
            self.external_secret_ref = Some(reference);
        }
        self.extra.extend(patch.extra);
    }
}

/// Partial record used by updates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_secret_ref: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RecordPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// JSON Schema of a stored record, for tools that edit vault blobs.
#[must_use]
pub fn record_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(VaultRecord)).unwrap_or_default()
}

/// Every record stored under one vault identifier, keyed by record id.
pub type VaultBlob = BTreeMap<String, VaultRecord>;

/// Canonical tag form: `#` prefix, inner whitespace runs collapsed to `-`.
#[must_use]
pub fn normalize_tag(tag: &str) -> Option<String> {
    let body = tag.trim().trim_start_matches('#');
    let joined = body.split_whitespace().collect::<Vec<_>>().join("-");
    if joined.is_empty() {
        return None;
    }
    Some(format!("#{joined}"))
}

#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .collect()
}

/// Parses a plain JSON blob. Records whose embedded `id` is missing or
/// disagrees with the map key take the key as their id.
pub fn parse_blob(raw: &str) -> Result<VaultBlob, serde_json::Error> {
    // A stored `null` is an empty vault.
    let blob: Option<VaultBlob> = serde_json::from_str(raw)?;
    let mut blob = blob.unwrap_or_default();
    for (id, record) in &mut blob {
        if record.id != *id {
            record.id.clone_from(id);
        }
    }
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vault_kind_parses_known_values_only() {
        assert_eq!("personal".parse::<VaultKind>(), Ok(VaultKind::Personal));
        assert_eq!("work".parse::<VaultKind>(), Ok(VaultKind::Work));
        assert_eq!(
            "shared".parse::<VaultKind>(),
            Err(VaultError::InvalidVaultKind("shared".to_string()))
        );
        assert_eq!(VaultKind::Work.to_string(), "work");
    }

    #[test]
    fn category_uses_kebab_names() {
        let value = serde_json::to_value(Category::ApiKeys).expect("serialize");
        assert_eq!(value, json!("api-keys"));
        assert_eq!("team".parse::<Category>().expect("parse"), Category::Team);
        assert!("logins".parse::<Category>().is_err());
    }

    #[test]
    fn tags_are_normalized() {
        assert_eq!(normalize_tag("work stuff"), Some("#work-stuff".to_string()));
        assert_eq!(normalize_tag("  #already\tthere  "), Some("#already-there".to_string()));
        assert_eq!(normalize_tag("#"), None);
        assert_eq!(normalize_tag("   "), None);
        let tags = normalize_tags(["a b", "#a-b", "c"]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["#a-b", "#c"]);
    }

    #[test]
    fn record_json_uses_camel_case_and_keeps_unknown_fields() {
        let raw = json!({
            "id": "r1",
            "title": "AWS",
            "externalSecretRef": "arn:aws:secretsmanager:eu-west-1:1:secret:r1",
            "category": "api-keys",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let record: VaultRecord = serde_json::from_value(raw).expect("record");
        assert_eq!(record.category, Category::ApiKeys);
        assert!(record.external_secret_ref.is_some());
        assert!(!record.favorite);
        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back["createdAt"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(back["externalSecretRef"], json!("arn:aws:secretsmanager:eu-west-1:1:secret:r1"));
        assert!(back.get("username").is_none());
    }

    #[test]
    fn merge_replaces_present_fields_only() {
        let mut record = VaultRecord {
            id: "r1".to_string(),
            title: "Mail".to_string(),
            username: Some("me".to_string()),
            password: Some("old".to_string()),
            ..VaultRecord::default()
        };
        record.merge(RecordPatch {
            password: Some("new".to_string()),
            tags: Some(vec!["home mail".to_string()]),
            ..RecordPatch::default()
        });
        assert_eq!(record.title, "Mail");
        assert_eq!(record.username.as_deref(), Some("me"));
        assert_eq!(record.password.as_deref(), Some("new"));
        assert!(record.tags.contains("#home-mail"));
    }

    #[test]
    fn parse_blob_aligns_ids_with_keys() {
        let blob = parse_blob(r#"{"k1":{"title":"a"},"k2":{"id":"other","title":"b"}}"#)
            .expect("blob");
        assert_eq!(blob["k1"].id, "k1");
        assert_eq!(blob["k2"].id, "k2");
        assert!(parse_blob("not json").is_err());
        assert!(parse_blob("null").expect("null").is_empty());
        assert!(parse_blob("[]").is_err());
    }
}
