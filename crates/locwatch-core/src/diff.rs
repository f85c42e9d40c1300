//! Snapshot differ.
//!
//! Classifies entries between two consecutive polls. Pure and linear in the
//! size of both snapshots.

use std::collections::HashSet;

use locwatch_protocol::{Snapshot, StatusEntry};

/// Differences between two consecutive snapshots.
///
/// An id appears in at most one list. Ids present in both snapshots with an
/// equal timestamp appear in none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Entries whose id is new in the current snapshot (current entry).
    pub added: Vec<StatusEntry>,
    /// Entries whose id vanished from the current snapshot (previous entry).
    pub removed: Vec<StatusEntry>,
    /// Entries whose timestamp strictly increased. Holds the *previous* entry.
    pub updated: Vec<StatusEntry>,
    /// Entries whose timestamp went backwards. Holds the *current* entry.
    pub anomalous: Vec<StatusEntry>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.anomalous.is_empty()
    }
}

/// Compute the difference between `previous` and `current`.
///
/// Duplicate ids inside one snapshot resolve last-write-wins and are reported once.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    let previous_by_id = previous.by_id();
    let current_by_id = current.by_id();
    let mut result = DiffResult::default();

    let mut seen: HashSet<&str> = HashSet::new();
    for entry in previous {
        let id = entry.id.as_str();
        if !seen.insert(id) {
            continue;
        }
        let old = previous_by_id[id];
        match current_by_id.get(id) {
            None => result.removed.push(old.clone()),
            Some(new) if new.update_timestamp > old.update_timestamp => {
                result.updated.push(old.clone())
            }
            Some(new) if new.update_timestamp < old.update_timestamp => {
                result.anomalous.push((*new).clone())
            }
            Some(_) => {}
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for entry in current {
        let id = entry.id.as_str();
        if seen.insert(id) && !previous_by_id.contains_key(id) {
            result.added.push(current_by_id[id].clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use locwatch_protocol::LoadStatus;

    fn entry(id: &str, status: LoadStatus, ts: i64) -> StatusEntry {
        StatusEntry::new(id, format!("loc-{id}"), status, ts)
    }

    fn ids(entries: &[StatusEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_empty_previous_reports_everything_added() {
        let current = Snapshot::new(vec![
            entry("1", LoadStatus::Loaded, 1),
            entry("2", LoadStatus::Loading, 1),
        ]);
        let result = diff(&Snapshot::default(), &current);
        assert_eq!(ids(&result.added), vec!["1", "2"]);
        assert!(result.removed.is_empty());
        assert!(result.updated.is_empty());
    }

    #[test]
    fn test_added_entry_reported() {
        let previous = Snapshot::new(vec![entry("1", LoadStatus::Loaded, 5)]);
        let current = Snapshot::new(vec![
            entry("1", LoadStatus::Loaded, 5),
            entry("2", LoadStatus::Loading, 1),
        ]);
        let result = diff(&previous, &current);
        assert_eq!(ids(&result.added), vec!["2"]);
        assert!(result.removed.is_empty());
        assert!(result.updated.is_empty());
        assert!(result.anomalous.is_empty());
    }

    #[test]
    fn test_updated_reports_previous_entry() {
        let previous = Snapshot::new(vec![entry("1", LoadStatus::Loading, 1)]);
        let current = Snapshot::new(vec![entry("1", LoadStatus::Loaded, 2)]);
        let result = diff(&previous, &current);
        assert_eq!(result.updated, vec![entry("1", LoadStatus::Loading, 1)]);
    }

    #[test]
    fn test_removed_entry_reported() {
        let previous = Snapshot::new(vec![
            entry("1", LoadStatus::Loaded, 1),
            entry("2", LoadStatus::Loaded, 1),
        ]);
        let current = Snapshot::new(vec![entry("2", LoadStatus::Loaded, 1)]);
        let result = diff(&previous, &current);
        assert_eq!(ids(&result.removed), vec!["1"]);
        assert!(result.added.is_empty());
    }

    #[test]
    fn test_equal_timestamp_is_omitted_even_if_status_changed() {
        let previous = Snapshot::new(vec![entry("1", LoadStatus::Loading, 3)]);
        let current = Snapshot::new(vec![entry("1", LoadStatus::Loaded, 3)]);
        assert!(diff(&previous, &current).is_empty());
    }

    #[test]
    fn test_decreasing_timestamp_is_anomalous() {
        let previous = Snapshot::new(vec![entry("1", LoadStatus::Loaded, 9)]);
        let current = Snapshot::new(vec![entry("1", LoadStatus::Loaded, 4)]);
        let result = diff(&previous, &current);
        assert_eq!(result.anomalous, vec![entry("1", LoadStatus::Loaded, 4)]);
        assert!(result.added.is_empty());
        assert!(result.updated.is_empty());
        assert!(result.removed.is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn test_duplicate_ids_do_not_panic_and_report_once() {
        let previous = Snapshot::new(vec![
            entry("1", LoadStatus::Loaded, 1),
            entry("1", LoadStatus::Loaded, 2),
        ]);
        let current = Snapshot::new(vec![
            entry("2", LoadStatus::Loaded, 1),
            entry("2", LoadStatus::Loaded, 1),
        ]);
        let result = diff(&previous, &current);
        assert_eq!(result.removed, vec![entry("1", LoadStatus::Loaded, 2)]);
        assert_eq!(ids(&result.added), vec!["2"]);
    }

    #[test]
    fn test_every_id_lands_in_at_most_one_list() {
        let previous = Snapshot::new(vec![
            entry("gone", LoadStatus::Loaded, 1),
            entry("same", LoadStatus::Loaded, 1),
            entry("newer", LoadStatus::Loaded, 1),
            entry("older", LoadStatus::Loaded, 5),
        ]);
        let current = Snapshot::new(vec![
            entry("same", LoadStatus::Loaded, 1),
            entry("newer", LoadStatus::Loaded, 2),
            entry("older", LoadStatus::Loaded, 4),
            entry("fresh", LoadStatus::Loading, 1),
        ]);
        let result = diff(&previous, &current);

        let mut all: Vec<&str> = Vec::new();
        all.extend(ids(&result.added));
        all.extend(ids(&result.removed));
        all.extend(ids(&result.updated));
        all.extend(ids(&result.anomalous));
        all.sort();
        assert_eq!(all, vec!["fresh", "gone", "newer", "older"]);
    }
}
