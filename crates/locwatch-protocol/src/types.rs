use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load state of a code location as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loading => write!(f, "loading"),
            LoadStatus::Loaded => write!(f, "loaded"),
            LoadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One tracked entity in a status poll.
///
/// `update_timestamp` is expected to be non-decreasing per `id` across polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub id: String,
    pub name: String,
    pub load_status: LoadStatus,
    pub update_timestamp: i64,
}

impl StatusEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        load_status: LoadStatus,
        update_timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            load_status,
            update_timestamp,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_status == LoadStatus::Loading
    }
}

/// One poll's complete, ordered view of the tracked entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Vec<StatusEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index entries by id. Duplicate ids resolve last-write-wins.
    pub fn by_id(&self) -> HashMap<&str, &StatusEntry> {
        self.entries.iter().map(|e| (e.id.as_str(), e)).collect()
    }

    pub fn get(&self, id: &str) -> Option<&StatusEntry> {
        self.entries.iter().rev().find(|e| e.id == id)
    }

    /// Entries currently in the `LOADING` state, in snapshot order.
    pub fn loading(&self) -> Vec<&StatusEntry> {
        self.entries.iter().filter(|e| e.is_loading()).collect()
    }

    pub fn any_loading(&self) -> bool {
        self.entries.iter().any(StatusEntry::is_loading)
    }
}

impl From<Vec<StatusEntry>> for Snapshot {
    fn from(entries: Vec<StatusEntry>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a StatusEntry;
    type IntoIter = std::slice::Iter<'a, StatusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Envelope returned by the status endpoint.
///
/// `Error` is a server-side failure of the whole poll; it carries no entries
/// and must never mutate reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusResponse {
    Entries { entries: Snapshot },
    Error { message: String },
}

/// A repository exposed by a loaded code location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
}

/// Outcome of loading a single code location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationLoad {
    Loaded { repositories: Vec<RepositorySummary> },
    Error { message: String },
}

/// Full detail payload for one code location, fetched lazily and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDetail {
    pub name: String,
    pub load: LocationLoad,
}

impl LocationDetail {
    pub fn loaded(name: impl Into<String>, repositories: &[&str]) -> Self {
        Self {
            name: name.into(),
            load: LocationLoad::Loaded {
                repositories: repositories
                    .iter()
                    .map(|r| RepositorySummary {
                        name: (*r).to_string(),
                    })
                    .collect(),
            },
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load: LocationLoad::Error {
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.load, LocationLoad::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.load {
            LocationLoad::Error { message } => Some(message),
            LocationLoad::Loaded { .. } => None,
        }
    }

    pub fn repositories(&self) -> &[RepositorySummary] {
        match &self.load {
            LocationLoad::Loaded { repositories } => repositories,
            LocationLoad::Error { .. } => &[],
        }
    }
}

/// Address of a repository within a code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoAddress {
    pub name: String,
    pub location: String,
}

impl RepoAddress {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Key stored in the hidden-key set: `name:location`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.location)
    }
}

/// Human form is `repo@location`.
impl fmt::Display for RepoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid repository address '{input}': expected <repo>@<location>")]
pub struct RepoAddressParseError {
    pub input: String,
}

impl FromStr for RepoAddress {
    type Err = RepoAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('@') {
            Some((name, location)) if !name.is_empty() && !location.is_empty() => {
                Ok(Self::new(name, location))
            }
            _ => Err(RepoAddressParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// A repository paired with the location that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOption {
    pub repository: String,
    pub location: String,
}

impl RepoOption {
    pub fn new(repository: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            location: location.into(),
        }
    }

    pub fn address(&self) -> RepoAddress {
        RepoAddress::new(&self.repository, &self.location)
    }

    /// Same derivation as [`RepoAddress::key`].
    pub fn key(&self) -> String {
        format!("{}:{}", self.repository, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_status_wire_format() {
        let json = serde_json::to_string(&LoadStatus::Loading).unwrap();
        assert_eq!(json, r#""LOADING""#);
        let parsed: LoadStatus = serde_json::from_str(r#""LOADED""#).unwrap();
        assert_eq!(parsed, LoadStatus::Loaded);
    }

    #[test]
    fn test_load_status_display() {
        assert_eq!(LoadStatus::Loading.to_string(), "loading");
        assert_eq!(LoadStatus::Loaded.to_string(), "loaded");
        assert_eq!(LoadStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_response_entries_parse() {
        let json = r#"{
            "type": "entries",
            "entries": [
                {"id": "1", "name": "etl", "load_status": "LOADED", "update_timestamp": 5},
                {"id": "2", "name": "ml", "load_status": "LOADING", "update_timestamp": 1}
            ]
        }"#;
        let parsed: StatusResponse = serde_json::from_str(json).unwrap();
        let StatusResponse::Entries { entries } = parsed else {
            panic!("expected entries variant");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.entries()[1].name, "ml");
        assert!(entries.any_loading());
    }

    #[test]
    fn test_status_response_error_parse() {
        let json = r#"{"type": "error", "message": "boom"}"#;
        let parsed: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            StatusResponse::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_snapshot_duplicate_ids_last_write_wins() {
        let snapshot = Snapshot::new(vec![
            StatusEntry::new("1", "first", LoadStatus::Loaded, 1),
            StatusEntry::new("1", "second", LoadStatus::Loaded, 2),
        ]);
        assert_eq!(snapshot.by_id()["1"].name, "second");
        assert_eq!(snapshot.get("1").unwrap().name, "second");
    }

    #[test]
    fn test_snapshot_loading_preserves_order() {
        let snapshot = Snapshot::new(vec![
            StatusEntry::new("a", "a", LoadStatus::Loading, 1),
            StatusEntry::new("b", "b", LoadStatus::Loaded, 1),
            StatusEntry::new("c", "c", LoadStatus::Loading, 1),
        ]);
        let names: Vec<&str> = snapshot.loading().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_location_detail_wire_format() {
        let detail = LocationDetail::loaded("etl", &["daily", "hourly"]);
        let json = serde_json::to_string(&detail).unwrap();
        assert!(json.contains(r#""type":"loaded""#));
        let parsed: LocationDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.repositories().len(), 2);
        assert!(!parsed.is_error());
    }

    #[test]
    fn test_failed_location_has_no_repositories() {
        let detail = LocationDetail::failed("etl", "ImportError");
        assert!(detail.is_error());
        assert!(detail.repositories().is_empty());
        assert_eq!(detail.error_message(), Some("ImportError"));
        assert_eq!(LocationDetail::loaded("etl", &[]).error_message(), None);
    }

    #[test]
    fn test_repo_address_key_and_display() {
        let addr = RepoAddress::new("daily", "etl");
        assert_eq!(addr.key(), "daily:etl");
        assert_eq!(addr.to_string(), "daily@etl");
    }

    #[test]
    fn test_repo_address_parse() {
        let addr: RepoAddress = "daily@etl".parse().unwrap();
        assert_eq!(addr, RepoAddress::new("daily", "etl"));
    }

    #[test]
    fn test_repo_address_parse_uses_last_separator() {
        let addr: RepoAddress = "team@daily@etl".parse().unwrap();
        assert_eq!(addr.name, "team@daily");
        assert_eq!(addr.location, "etl");
    }

    #[test]
    fn test_repo_address_parse_rejects_missing_parts() {
        assert!("daily".parse::<RepoAddress>().is_err());
        assert!("@etl".parse::<RepoAddress>().is_err());
        assert!("daily@".parse::<RepoAddress>().is_err());
    }

    #[test]
    fn test_repo_option_key_matches_address_key() {
        let option = RepoOption::new("daily", "etl");
        assert_eq!(option.key(), option.address().key());
    }
}
