//! Soft-delete link reconciliation.
//!
//! Converges a relationship collection to a caller-supplied desired
//! membership without losing history: Retired rows whose counterpart is
//! wanted again are re-activated, Active rows that are no longer wanted are
//! retired, and counterparts with no row at all get a fresh Active row.
//! Nothing is ever deleted and no counterpart ever gets a second row.
//!
//! The same function serves all four relationship edits (course↔material,
//! course↔skill, material↔course, skill↔course); the store decides which
//! side of the row is the counterpart when loading and saving.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{LinkRecord, RecordState};

/// State transitions a reconciliation performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Retired rows brought back to Active.
    pub activated: usize,
    /// Active rows moved to Retired.
    pub retired: usize,
    /// Fresh Active rows appended.
    pub created: usize,
}

impl ReconcileOutcome {
    /// True when the collection already matched the desired membership.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.activated == 0 && self.retired == 0 && self.created == 0
    }
}

/// Converge `existing` so that exactly the ids in `desired_ids` are Active.
///
/// `desired_ids` need not be de-duplicated or sorted. Rows already matching
/// the desired membership are left untouched, so re-running with the same
/// set is a no-op. Mutates in place; persistence stays with the caller.
pub fn reconcile_links(existing: &mut Vec<LinkRecord>, desired_ids: &[i64]) -> ReconcileOutcome {
    let desired: HashSet<i64> = desired_ids.iter().copied().collect();
    let mut outcome = ReconcileOutcome::default();

    for link in existing.iter_mut() {
        let should_be_active = desired.contains(&link.counterpart_id);
        match (link.state, should_be_active) {
            (RecordState::Active, false) => {
                link.state = RecordState::Retired;
                outcome.retired += 1;
            }
            (RecordState::Retired, true) => {
                link.state = RecordState::Active;
                outcome.activated += 1;
            }
            _ => {}
        }
    }

    let known: HashSet<i64> = existing.iter().map(|link| link.counterpart_id).collect();
    let mut missing: Vec<i64> = desired.difference(&known).copied().collect();
    // Stable insertion order keeps runs reproducible.
    missing.sort_unstable();

    for counterpart_id in missing {
        existing.push(LinkRecord::active(counterpart_id));
        outcome.created += 1;
    }

    debug!(
        activated = outcome.activated,
        retired = outcome.retired,
        created = outcome.created,
        "reconciled links"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn link(id: i64, state: RecordState) -> LinkRecord {
        LinkRecord {
            counterpart_id: id,
            state,
        }
    }

    fn active_ids(links: &[LinkRecord]) -> Vec<i64> {
        let mut ids: Vec<i64> = links
            .iter()
            .filter(|l| l.state.is_active())
            .map(|l| l.counterpart_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn creates_missing_links_as_active() {
        let mut links = Vec::new();
        let outcome = reconcile_links(&mut links, &[3, 1, 2]);

        assert_eq!(outcome.created, 3);
        assert_eq!(outcome.activated, 0);
        assert_eq!(outcome.retired, 0);
        assert_eq!(active_ids(&links), vec![1, 2, 3]);
    }

    #[test]
    fn retires_unwanted_active_links() {
        let mut links = vec![link(1, RecordState::Active), link(2, RecordState::Active)];
        let outcome = reconcile_links(&mut links, &[2]);

        assert_eq!(outcome.retired, 1);
        assert_eq!(links.len(), 2, "retired rows are kept");
        assert_eq!(active_ids(&links), vec![2]);
    }

    #[test]
    fn reactivates_retired_links() {
        let mut links = vec![link(4, RecordState::Retired)];
        let outcome = reconcile_links(&mut links, &[4]);

        assert_eq!(outcome.activated, 1);
        assert_eq!(outcome.created, 0, "no duplicate row for a known id");
        assert_eq!(links.len(), 1);
        assert_eq!(active_ids(&links), vec![4]);
    }

    #[test]
    fn matching_links_are_untouched() {
        let mut links = vec![link(1, RecordState::Active), link(2, RecordState::Retired)];
        let before = links.clone();
        let outcome = reconcile_links(&mut links, &[1]);

        assert!(outcome.is_noop());
        assert_eq!(links, before);
    }

    #[test]
    fn desired_duplicates_are_normalized() {
        let mut links = Vec::new();
        let outcome = reconcile_links(&mut links, &[7, 7, 7]);

        assert_eq!(outcome.created, 1);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn empty_desired_set_retires_everything() {
        let mut links = vec![link(1, RecordState::Active), link(2, RecordState::Retired)];
        let outcome = reconcile_links(&mut links, &[]);

        assert_eq!(outcome.retired, 1);
        assert!(active_ids(&links).is_empty());
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn second_run_with_same_set_is_noop() {
        let mut links = vec![
            link(1, RecordState::Active),
            link(2, RecordState::Retired),
            link(3, RecordState::Active),
        ];
        let desired = [2, 3, 5];

        let first = reconcile_links(&mut links, &desired);
        assert!(!first.is_noop());

        let snapshot = links.clone();
        let second = reconcile_links(&mut links, &desired);
        assert!(second.is_noop(), "re-running must not thrash states");
        assert_eq!(links, snapshot);
    }

    proptest! {
        #[test]
        fn converges_to_desired_membership(
            existing in proptest::collection::vec((0i64..50, any::<bool>()), 0..40),
            desired in proptest::collection::vec(0i64..50, 0..40),
        ) {
            let mut links: Vec<LinkRecord> = Vec::new();
            let mut seen = HashSet::new();
            for (id, is_active) in existing {
                // one row per counterpart, as the store guarantees
                if seen.insert(id) {
                    let state = if is_active { RecordState::Active } else { RecordState::Retired };
                    links.push(link(id, state));
                }
            }

            reconcile_links(&mut links, &desired);

            let want: HashSet<i64> = desired.iter().copied().collect();
            let got: HashSet<i64> = links
                .iter()
                .filter(|l| l.state.is_active())
                .map(|l| l.counterpart_id)
                .collect();
            prop_assert_eq!(got, want);
        }

        #[test]
        fn never_creates_duplicate_rows(
            rounds in proptest::collection::vec(
                proptest::collection::vec(0i64..20, 0..20),
                1..6,
            ),
        ) {
            let mut links: Vec<LinkRecord> = Vec::new();
            for desired in &rounds {
                reconcile_links(&mut links, desired);
            }

            let mut ids: Vec<i64> = links.iter().map(|l| l.counterpart_id).collect();
            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), total, "at most one row per counterpart id");
        }

        #[test]
        fn reapplying_is_idempotent(
            desired in proptest::collection::vec(0i64..30, 0..30),
            initial in proptest::collection::vec(0i64..30, 0..30),
        ) {
            let mut links: Vec<LinkRecord> = Vec::new();
            reconcile_links(&mut links, &initial);

            reconcile_links(&mut links, &desired);
            let snapshot = links.clone();
            let outcome = reconcile_links(&mut links, &desired);

            prop_assert!(outcome.is_noop());
            prop_assert_eq!(links, snapshot);
        }
    }
}
