use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content checksums of a stored artifact.
///
/// A checksum is only considered authoritative when both digests are
/// present; repository query results with either field empty are treated
/// as a miss by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub sha1: String,
    pub md5: String,
}

impl Checksum {
    pub fn new(sha1: impl Into<String>, md5: impl Into<String>) -> Self {
        Self {
            sha1: sha1.into(),
            md5: md5.into(),
        }
    }

    /// Both digests populated.
    pub fn is_complete(&self) -> bool {
        !self.sha1.is_empty() && !self.md5.is_empty()
    }
}

/// The canonical unit of dependency information.
///
/// Created by an extractor with the package identity only, then mutated in
/// place during reconciliation: `id` becomes the canonical artifact name
/// (e.g. `underscore-1.8.3.tgz` or `MyPkg:1.0.0`) and `checksum` is filled
/// from the repository query or the persisted cache. Records that still
/// lack a checksum after reconciliation are removed from the final map and
/// reported as missing instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    /// Canonical build-info id. Empty until the artifact name is known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub scopes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl DependencyRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            id: String::new(),
            scopes: BTreeSet::new(),
            checksum: None,
            file_type: None,
        }
    }

    /// Builder-style id assignment, used by extractors that know the
    /// canonical artifact name up front (NuGet).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn add_scope(&mut self, scope: &str) {
        self.scopes.insert(scope.to_string());
    }

    pub fn has_checksum(&self) -> bool {
        self.checksum.as_ref().is_some_and(Checksum::is_complete)
    }

    /// `<name>-<version>`, the form used by the missing-dependencies report.
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Flat build-info entry, suitable for attaching to a build-info module.
/// No nesting; produced only for records with an established checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfoDependency {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub scopes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl From<&DependencyRecord> for BuildInfoDependency {
    fn from(record: &DependencyRecord) -> Self {
        Self {
            id: record.id.clone(),
            scopes: record.scopes.clone(),
            checksum: record.checksum.clone(),
            file_type: record.file_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_complete() {
        assert!(Checksum::new("da39a3ee", "d41d8cd9").is_complete());
        assert!(!Checksum::new("", "d41d8cd9").is_complete());
        assert!(!Checksum::new("da39a3ee", "").is_complete());
    }

    #[test]
    fn test_record_has_checksum_requires_both_digests() {
        let mut record = DependencyRecord::new("urllib3", "1.26.0");
        assert!(!record.has_checksum());

        record.checksum = Some(Checksum::new("abc", ""));
        assert!(!record.has_checksum());

        record.checksum = Some(Checksum::new("abc", "def"));
        assert!(record.has_checksum());
    }

    #[test]
    fn test_display_name() {
        let record = DependencyRecord::new("requests", "2.31.0");
        assert_eq!(record.display_name(), "requests-2.31.0");
    }

    #[test]
    fn test_scopes_deduplicate() {
        let mut record = DependencyRecord::new("lodash", "4.17.21");
        record.add_scope("production");
        record.add_scope("development");
        record.add_scope("production");
        assert_eq!(record.scopes.len(), 2);
    }

    #[test]
    fn test_record_serialization_skips_empty_fields() {
        let record = DependencyRecord::new("requests", "2.31.0");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("checksum").is_none());
        assert!(json.get("scopes").is_none());
        assert_eq!(json["name"], "requests");
    }

    #[test]
    fn test_record_round_trip() {
        let record = DependencyRecord::new("requests", "2.31.0")
            .with_id("requests-2.31.0-py3-none-any.whl")
            .with_checksum(Checksum::new("aaa", "bbb"));
        let json = serde_json::to_string(&record).unwrap();
        let back: DependencyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_build_info_dependency_from_record() {
        let mut record = DependencyRecord::new("requests", "2.31.0")
            .with_id("requests-2.31.0-py3-none-any.whl")
            .with_checksum(Checksum::new("aaa", "bbb"));
        record.add_scope("production");

        let entry = BuildInfoDependency::from(&record);
        assert_eq!(entry.id, "requests-2.31.0-py3-none-any.whl");
        assert!(entry.scopes.contains("production"));
        assert_eq!(entry.checksum, record.checksum);
    }
}
