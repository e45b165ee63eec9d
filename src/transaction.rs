//! Batching of per-node check writes produced by one check gesture.
//!
//! A gesture opens a [`CheckTransaction`], the cascade records one write per touched
//! node, and a single commit merges everything into the previous [`CheckState`].

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::conduct::CheckState;
use crate::error::{TreeError, TreeResult};
use crate::walk::TreeIndex;

/// One node's check flags as written by the cascade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckWrite {
    pub key: String,
    pub checked: bool,
    pub half_checked: bool,
}

/// Writes collected for a single check gesture.
#[derive(Clone, Debug)]
pub struct CheckTransaction<Id> {
    origin: Id,
    origin_key: String,
    checked: bool,
    writes: Vec<CheckWrite>,
}

/// Result of committing a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckCommit<Id> {
    /// Node where the gesture started.
    pub origin: Id,
    pub origin_key: String,
    /// Target state of the gesture at its origin.
    pub checked: bool,
    pub state: CheckState,
}

impl<Id: Copy> CheckTransaction<Id> {
    /// Opens a transaction for a gesture at `origin`.
    pub fn new(origin: Id, origin_key: impl Into<String>, checked: bool) -> Self {
        Self {
            origin,
            origin_key: origin_key.into(),
            checked,
            writes: Vec::new(),
        }
    }

    /// Appends a write; a checked node is never also half-checked.
    pub fn record(&mut self, key: impl Into<String>, checked: bool, half_checked: bool) {
        self.writes.push(CheckWrite {
            key: key.into(),
            checked,
            half_checked: half_checked && !checked,
        });
    }

    pub const fn origin(&self) -> Id {
        self.origin
    }

    pub fn origin_key(&self) -> &str {
        &self.origin_key
    }

    pub const fn checked(&self) -> bool {
        self.checked
    }

    pub fn writes(&self) -> &[CheckWrite] {
        &self.writes
    }

    /// Overlays the writes onto `previous`; the last write for a key wins.
    pub fn apply(&self, previous: &CheckState) -> CheckState {
        CheckState {
            checked: overlay(
                &previous.checked,
                self.writes.iter().map(|write| (write.key.as_str(), write.checked)),
            ),
            half_checked: overlay(
                &previous.half_checked,
                self.writes
                    .iter()
                    .map(|write| (write.key.as_str(), write.half_checked)),
            ),
        }
    }

    /// Closes the transaction.
    pub fn commit(self, previous: &CheckState) -> CheckCommit<Id> {
        let state = self.apply(previous);
        CheckCommit {
            origin: self.origin,
            origin_key: self.origin_key,
            checked: self.checked,
            state,
        }
    }
}

fn overlay<'a>(
    previous: &'a [String],
    writes: impl Iterator<Item = (&'a str, bool)>,
) -> Vec<String> {
    let mut flags: FxHashMap<&str, bool> =
        FxHashMap::with_capacity_and_hasher(previous.len(), FxBuildHasher);
    let mut order: Vec<&str> = Vec::with_capacity(previous.len());
    for key in previous {
        if flags.insert(key.as_str(), true).is_none() {
            order.push(key.as_str());
        }
    }
    for (key, flag) in writes {
        if flags.insert(key, flag).is_none() {
            order.push(key);
        }
    }
    order
        .into_iter()
        .filter(|key| flags.get(key).copied().unwrap_or(false))
        .map(str::to_owned)
        .collect()
}

/// Idle/open state machine around [`CheckTransaction`].
#[derive(Clone, Debug)]
pub struct CheckCoordinator<Id> {
    open: Option<CheckTransaction<Id>>,
}

impl<Id: Copy> Default for CheckCoordinator<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy> CheckCoordinator<Id> {
    pub const fn new() -> Self {
        Self { open: None }
    }

    pub const fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Opens a transaction at the top of a cascade, replacing any unfinished one.
    pub fn begin(
        &mut self,
        origin: Id,
        origin_key: &str,
        checked: bool,
    ) -> &mut CheckTransaction<Id> {
        if let Some(stale) = &self.open {
            tracing::warn!(
                message = "tree.check.batch_replaced",
                stale_origin = stale.origin_key(),
                origin = origin_key,
            );
        }
        self.open.insert(CheckTransaction::new(origin, origin_key, checked))
    }

    /// Records a write into the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::BatchNotOpen`] if no transaction is open; this is a bug in
    /// the calling cascade and is logged at error level.
    pub fn record(&mut self, key: &str, checked: bool, half_checked: bool) -> TreeResult<()> {
        let Some(transaction) = self.open.as_mut() else {
            tracing::error!(message = "tree.check.batch_not_open", key);
            return Err(TreeError::BatchNotOpen {
                key: key.to_owned(),
            });
        };
        transaction.record(key, checked, half_checked);
        Ok(())
    }

    /// Commits the open transaction against `previous` and returns to idle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::BatchNotOpen`] if no transaction is open.
    pub fn commit(&mut self, previous: &CheckState) -> TreeResult<CheckCommit<Id>> {
        let Some(transaction) = self.open.take() else {
            tracing::error!(message = "tree.check.commit_without_batch");
            return Err(TreeError::BatchNotOpen { key: String::new() });
        };
        tracing::debug!(
            message = "tree.check.commit",
            origin = transaction.origin_key(),
            writes = transaction.writes().len(),
        );
        Ok(transaction.commit(previous))
    }

    /// Drops the open transaction without applying it.
    pub fn abort(&mut self) {
        self.open = None;
    }
}

/// Records every write caused by toggling the node at `origin` to `checked`.
///
/// Strict mode touches the node only. Conduct mode forces the whole subtree to the
/// new value, then recomputes each ancestor from its children, nearest first. Apart
/// from the origin, only nodes whose flags change are written.
pub(crate) fn cascade<Id: Copy + Eq>(
    index: &TreeIndex<'_, Id>,
    current: &CheckState,
    origin: usize,
    checked: bool,
    check_strictly: bool,
    transaction: &mut CheckTransaction<Id>,
) {
    transaction.record(index.key(origin), checked, false);
    if check_strictly {
        return;
    }

    let was_checked: FxHashSet<&str> = current.checked.iter().map(String::as_str).collect();
    let was_half: FxHashSet<&str> = current.half_checked.iter().map(String::as_str).collect();
    let mut written: Vec<Option<(bool, bool)>> = vec![None; index.entries.len()];
    let flags_of = |written: &[Option<(bool, bool)>], idx: usize| {
        written[idx].unwrap_or_else(|| {
            let key = index.key(idx);
            (was_checked.contains(key), was_half.contains(key))
        })
    };

    written[origin] = Some((checked, false));
    for idx in index.subtree(origin).skip(1) {
        if flags_of(&written, idx) != (checked, false) {
            transaction.record(index.key(idx), checked, false);
        }
        written[idx] = Some((checked, false));
    }

    for ancestor in index.ancestors(origin) {
        let children = &index.children[ancestor];
        let all = children
            .iter()
            .all(|child| flags_of(&written, *child).0);
        let any = children.iter().any(|child| {
            let (child_checked, child_half) = flags_of(&written, *child);
            child_checked || child_half
        });
        let next = (all, !all && any);
        if flags_of(&written, ancestor) != next {
            transaction.record(index.key(ancestor), next.0, next.1);
        }
        written[ancestor] = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conduct::{CheckedKeysInput, conduct};
    use crate::walk::tests::sample_tree;
    use proptest::prelude::*;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn last_write_wins_over_previous_state() {
        let previous = CheckState {
            checked: keys(&["x"]),
            half_checked: keys(&["y"]),
        };
        let mut transaction = CheckTransaction::new(0usize, "x", false);
        transaction.record("x", true, false);
        transaction.record("x", false, false);
        transaction.record("y", true, true);
        transaction.record("z", false, true);

        let commit = transaction.commit(&previous);
        assert_eq!(commit.state.checked, keys(&["y"]));
        assert_eq!(commit.state.half_checked, keys(&["z"]));
        assert_eq!(commit.origin_key, "x");
        assert!(!commit.checked);
    }

    #[test]
    fn committing_twice_is_idempotent() {
        let previous = CheckState {
            checked: keys(&["a"]),
            half_checked: Vec::new(),
        };
        let mut transaction = CheckTransaction::new(1usize, "b", true);
        transaction.record("b", true, false);
        transaction.record("a", false, true);

        let once = transaction.apply(&previous);
        let twice = transaction.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn coordinator_rejects_writes_while_idle() {
        let mut coordinator = CheckCoordinator::<usize>::new();
        assert_eq!(
            coordinator.record("a", true, false),
            Err(TreeError::BatchNotOpen {
                key: "a".to_string()
            })
        );
        assert!(coordinator.commit(&CheckState::default()).is_err());
    }

    #[test]
    fn coordinator_commits_once_and_returns_to_idle() {
        let mut coordinator = CheckCoordinator::new();
        coordinator.begin(3usize, "c", true);
        coordinator.record("c", true, false).unwrap();
        coordinator.record("a", false, true).unwrap();

        let commit = coordinator.commit(&CheckState::default()).unwrap();
        assert_eq!(commit.origin, 3);
        assert_eq!(commit.state.checked, keys(&["c"]));
        assert_eq!(commit.state.half_checked, keys(&["a"]));
        assert!(!coordinator.is_open());
        assert!(coordinator.record("c", false, false).is_err());
    }

    #[test]
    fn cascade_checks_subtree_and_updates_ancestors() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let a = index.index_of("a").unwrap();
        let mut transaction = CheckTransaction::new(index.entries[a].id, "a", true);

        cascade(&index, &CheckState::default(), a, true, false, &mut transaction);
        let state = transaction.apply(&CheckState::default());

        assert_eq!(state.checked, keys(&["a", "b", "c"]));
        assert_eq!(state.half_checked, keys(&["root"]));
    }

    #[test]
    fn cascade_unchecking_a_leaf_demotes_ancestors() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let previous = conduct(&tree, &CheckedKeysInput::Keys(keys(&["b", "c", "d"])), false);
        assert!(previous.is_checked("root"));

        let c = index.index_of("c").unwrap();
        let mut transaction = CheckTransaction::new(index.entries[c].id, "c", false);
        cascade(&index, &previous, c, false, false, &mut transaction);
        let state = transaction.apply(&previous);

        assert_eq!(state.checked, keys(&["b", "d"]));
        assert_eq!(state.half_checked, keys(&["a", "root"]));
    }

    #[test]
    fn strict_cascade_touches_only_the_origin() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let a = index.index_of("a").unwrap();
        let mut transaction = CheckTransaction::new(index.entries[a].id, "a", true);

        cascade(&index, &CheckState::default(), a, true, true, &mut transaction);
        assert_eq!(transaction.writes().len(), 1);
        assert_eq!(transaction.apply(&CheckState::default()).checked, keys(&["a"]));
    }

    proptest! {
        #[test]
        fn prop_cascade_matches_full_derivation(
            picks in prop::collection::vec(any::<bool>(), 7),
            target in 0usize..7,
            checked in any::<bool>(),
        ) {
            let tree = sample_tree();
            let index = TreeIndex::build(&tree);
            let leaves = ["b", "c", "d", "1-0"];
            let raw: Vec<String> = leaves
                .iter()
                .zip(&picks)
                .filter(|(_, pick)| **pick)
                .map(|(key, _)| (*key).to_string())
                .collect();
            let previous = conduct(&tree, &CheckedKeysInput::Keys(raw), false);

            let mut transaction =
                CheckTransaction::new(index.entries[target].id, index.key(target), checked);
            cascade(&index, &previous, target, checked, false, &mut transaction);
            let next = transaction.apply(&previous);

            // Re-deriving from the resulting leaves must agree with the cascade.
            let leaf_keys: Vec<String> = next
                .checked
                .iter()
                .filter(|key| leaves.contains(&key.as_str()))
                .cloned()
                .collect();
            let derived = conduct(&tree, &CheckedKeysInput::Keys(leaf_keys), false);
            let mut got_checked = next.checked.clone();
            let mut want_checked = derived.checked.clone();
            got_checked.sort();
            want_checked.sort();
            prop_assert_eq!(got_checked, want_checked);
            let mut got_half = next.half_checked.clone();
            let mut want_half = derived.half_checked;
            got_half.sort();
            want_half.sort();
            prop_assert_eq!(got_half, want_half);
        }
    }
}
