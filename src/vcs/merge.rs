//! vcs::merge
//!
//! Flat-overlay merge.
//!
//! Merging replays snapshots over the live store in order. Ancestry is not
//! consulted: a key conflicts whenever the live store already holds a
//! different, non-empty value for it.

use std::collections::BTreeMap;

use crate::core::store::{KeyValueStore, Mapping};

/// Whether merge conflicts are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// No pending conflicts.
    Clean,
    /// At least one conflict awaits resolution.
    Conflicted,
}

impl MergeState {
    /// Check if conflicts are pending.
    pub fn is_conflicted(self) -> bool {
        self == Self::Conflicted
    }
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Writes applied to the live store.
    pub applied: usize,
    /// Keys recorded as conflicting, in the order first seen.
    pub conflicts: Vec<String>,
}

impl MergeOutcome {
    /// Check if the merge finished without conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

fn disagrees(live: Option<&str>, incoming: &str) -> bool {
    matches!(live, Some(current) if !current.is_empty() && current != incoming)
}

/// Keys of `theirs` that would conflict with `live`.
pub fn detect_conflicts(live: &Mapping, theirs: &Mapping) -> Vec<String> {
    theirs
        .iter()
        .filter(|(key, value)| disagrees(live.get(*key).map(String::as_str), value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Overlay `snapshot` onto the live store.
///
/// Agreeing or new keys are written; disagreeing keys are recorded in
/// `conflicts` with the incoming value and left untouched.
pub(crate) fn overlay_snapshot(
    store: &KeyValueStore,
    snapshot: &Mapping,
    conflicts: &mut BTreeMap<String, String>,
    outcome: &mut MergeOutcome,
) {
    for (key, value) in snapshot {
        let live = store.get(key);
        if disagrees(live.as_deref(), value) {
            if !outcome.conflicts.contains(key) {
                outcome.conflicts.push(key.clone());
            }
            conflicts.insert(key.clone(), value.clone());
        } else {
            store.insert(key, value);
            outcome.applied += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn detect_ignores_equal_missing_and_empty() {
        let live = mapping(&[("same", "x"), ("diff", "a"), ("empty", "")]);
        let theirs = mapping(&[("same", "x"), ("diff", "b"), ("empty", "c"), ("new", "n")]);
        assert_eq!(detect_conflicts(&live, &theirs), vec!["diff"]);
    }

    #[test]
    fn overlay_applies_and_records() {
        let store = KeyValueStore::new("unused.json");
        store.insert("keep", "live");
        store.insert("same", "v");

        let mut conflicts = BTreeMap::new();
        let mut outcome = MergeOutcome::default();
        overlay_snapshot(
            &store,
            &mapping(&[("keep", "incoming"), ("same", "v"), ("new", "n")]),
            &mut conflicts,
            &mut outcome,
        );

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.conflicts, vec!["keep"]);
        assert_eq!(conflicts["keep"], "incoming");
        assert_eq!(store.get("keep").as_deref(), Some("live"));
        assert_eq!(store.get("new").as_deref(), Some("n"));
        assert!(!outcome.is_clean());
    }

    #[test]
    fn later_snapshot_overrides_conflict_value() {
        let store = KeyValueStore::new("unused.json");
        store.insert("k", "live");

        let mut conflicts = BTreeMap::new();
        let mut outcome = MergeOutcome::default();
        overlay_snapshot(&store, &mapping(&[("k", "one")]), &mut conflicts, &mut outcome);
        overlay_snapshot(&store, &mapping(&[("k", "two")]), &mut conflicts, &mut outcome);

        assert_eq!(conflicts["k"], "two");
        assert_eq!(outcome.conflicts, vec!["k"]);
    }
}
