//! Expansion closure: which nodes must be open for requested keys to be visible.

use rustc_hash::FxHashSet;

use crate::model::TreeModel;
use crate::position;
use crate::walk::walk;

/// Computes the expanded key list for `requested`.
///
/// With `auto_expand_parent` every ancestor of a requested node is added, and the
/// requested nodes found in the tree stay expanded. Keys not present in the tree
/// are ignored, except that an empty result falls back to `requested` verbatim so
/// keys of a not-yet-loaded subtree are not lost.
pub fn resolve_expanded_keys<T: TreeModel>(
    model: &T,
    requested: &[String],
    auto_expand_parent: bool,
) -> Vec<String> {
    if requested.is_empty() {
        return Vec::new();
    }
    if !auto_expand_parent {
        return requested.to_vec();
    }

    let wanted: FxHashSet<&str> = requested.iter().map(String::as_str).collect();
    let matched: Vec<String> = walk(model)
        .filter(|entry| wanted.contains(&*entry.key))
        .map(|entry| entry.position)
        .collect();

    let resolved: Vec<String> = walk(model)
        .filter(|entry| {
            matched.iter().any(|target| {
                *target == entry.position || position::is_ancestor(&entry.position, target)
            })
        })
        .map(|entry| entry.key.into_owned())
        .collect();

    if resolved.is_empty() {
        requested.to_vec()
    } else {
        resolved
    }
}

/// Every key in the tree, in pre-order.
pub fn full_key_list<T: TreeModel>(model: &T) -> Vec<String> {
    walk(model).map(|entry| entry.key.into_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::tests::sample_tree;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn empty_request_yields_nothing() {
        let tree = sample_tree();
        assert!(resolve_expanded_keys(&tree, &[], true).is_empty());
        assert!(resolve_expanded_keys(&tree, &[], false).is_empty());
    }

    #[test]
    fn without_auto_expand_returns_request_unchanged() {
        let tree = sample_tree();
        let requested = keys(&["b", "missing"]);
        assert_eq!(resolve_expanded_keys(&tree, &requested, false), requested);
    }

    #[test]
    fn auto_expand_opens_every_ancestor() {
        let tree = sample_tree();
        let resolved = resolve_expanded_keys(&tree, &keys(&["b"]), true);
        assert_eq!(resolved, keys(&["root", "a", "b"]));
    }

    #[test]
    fn unmatched_keys_are_dropped_when_something_matches() {
        let tree = sample_tree();
        let resolved = resolve_expanded_keys(&tree, &keys(&["missing", "1-0"]), true);
        assert_eq!(resolved, keys(&["1", "1-0"]));
    }

    #[test]
    fn falls_back_to_request_when_nothing_matches() {
        let tree = sample_tree();
        let requested = keys(&["missing"]);
        assert_eq!(resolve_expanded_keys(&tree, &requested, true), requested);
    }

    #[test]
    fn full_key_list_uses_positions_for_unkeyed_nodes() {
        let tree = sample_tree();
        assert_eq!(
            full_key_list(&tree),
            keys(&["root", "a", "b", "c", "d", "1", "1-0"])
        );
    }
}
