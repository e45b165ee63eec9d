//! Checkbox state derivation in conduct and strict modes.

use rustc_hash::FxHashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::{TreeError, TreeResult};
use crate::keyset::dedup_keys;
use crate::model::TreeModel;
use crate::walk::TreeIndex;

/// Checked keys as supplied by the host.
///
/// With the `serde` feature this deserializes untagged from either a JSON array of
/// keys or a `{"checked": [...], "halfChecked": [...]}` object.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckedKeysInput {
    /// Flat list of checked keys.
    Keys(Vec<String>),
    /// Explicit pair; the half-checked part is only honored in strict mode.
    Pair {
        #[cfg_attr(feature = "serde", serde(default))]
        checked: Vec<String>,
        #[cfg_attr(
            feature = "serde",
            serde(rename = "halfChecked", default, skip_serializing_if = "Option::is_none")
        )]
        half_checked: Option<Vec<String>>,
    },
}

impl CheckedKeysInput {
    /// Parses the host's loosely-typed checked keys value.
    #[cfg(feature = "serde")]
    pub fn from_json(value: &str) -> TreeResult<Self> {
        serde_json::from_str(value).map_err(|err| TreeError::MalformedCheckedKeys {
            reason: err.to_string(),
        })
    }

    /// The checked component.
    pub fn checked(&self) -> &[String] {
        match self {
            Self::Keys(keys) | Self::Pair { checked: keys, .. } => keys,
        }
    }

    /// The half-checked component, if one was supplied.
    pub fn half_checked(&self) -> Option<&[String]> {
        match self {
            Self::Keys(_) => None,
            Self::Pair { half_checked, .. } => half_checked.as_deref(),
        }
    }
}

impl From<Vec<String>> for CheckedKeysInput {
    fn from(keys: Vec<String>) -> Self {
        Self::Keys(keys)
    }
}

/// Consistent checkbox state: `checked` and `half_checked` never share a key.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckState {
    pub checked: Vec<String>,
    pub half_checked: Vec<String>,
}

impl CheckState {
    /// Returns `true` if `key` is fully checked.
    pub fn is_checked(&self, key: &str) -> bool {
        self.checked.iter().any(|checked| checked == key)
    }

    /// Returns `true` if `key` is half-checked.
    pub fn is_half_checked(&self, key: &str) -> bool {
        self.half_checked.iter().any(|half| half == key)
    }
}

/// Derives the full check state from `input`.
///
/// Strict mode returns the supplied pair verbatim. Conduct mode treats the supplied
/// keys as checked leaves/subtrees and infers every parent bottom-up: a node is
/// checked iff all of its children are, and half-checked iff it is not checked but
/// some descendant is. Leaves are never half-checked, and an internal node listed
/// in the input without checked children is not checked.
pub fn conduct<T: TreeModel>(
    model: &T,
    input: &CheckedKeysInput,
    check_strictly: bool,
) -> CheckState {
    if check_strictly {
        return strict_state(input);
    }
    let raw: FxHashSet<&str> = input.checked().iter().map(String::as_str).collect();
    let index = TreeIndex::build(model);
    conduct_indexed(&index, &raw)
}

fn strict_state(input: &CheckedKeysInput) -> CheckState {
    let checked = dedup_keys(input.checked().iter().cloned());
    let half_checked = dedup_keys(
        input
            .half_checked()
            .unwrap_or_default()
            .iter()
            .filter(|key| !checked.contains(*key))
            .cloned(),
    );
    CheckState {
        checked,
        half_checked,
    }
}

pub(crate) fn conduct_indexed<Id: Copy + Eq>(
    index: &TreeIndex<'_, Id>,
    raw: &FxHashSet<&str>,
) -> CheckState {
    let len = index.entries.len();
    let mut checked = vec![false; len];
    let mut half = vec![false; len];

    // Reverse pre-order visits every child before its parent.
    for idx in (0..len).rev() {
        let children = &index.children[idx];
        if children.is_empty() {
            checked[idx] = raw.contains(index.key(idx));
            continue;
        }
        let all = children.iter().all(|child| checked[*child]);
        let any = children.iter().any(|child| checked[*child] || half[*child]);
        checked[idx] = all;
        half[idx] = !all && any;
    }

    let pick = |flags: &[bool]| {
        dedup_keys(
            flags
                .iter()
                .enumerate()
                .filter(|(_, flag)| **flag)
                .map(|(idx, _)| index.key(idx).to_owned()),
        )
    };
    CheckState {
        checked: pick(&checked),
        half_checked: pick(&half),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeArena;
    use crate::walk::tests::sample_tree;
    use proptest::prelude::*;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    fn sorted(mut values: Vec<String>) -> Vec<String> {
        values.sort();
        values
    }

    /// `root{a{b,c}}`
    fn single_branch() -> TreeArena {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        tree.add_child(a, Some("b"), "B");
        tree.add_child(a, Some("c"), "C");
        tree
    }

    #[test]
    fn all_children_checked_propagates_up() {
        let tree = single_branch();
        let state = conduct(&tree, &keys(&["b", "c"]).into(), false);
        assert_eq!(sorted(state.checked), keys(&["a", "b", "c", "root"]));
        assert!(state.half_checked.is_empty());
    }

    #[test]
    fn partial_check_marks_ancestors_half_checked() {
        let tree = sample_tree();
        let state = conduct(&tree, &keys(&["b"]).into(), false);
        assert_eq!(state.checked, keys(&["b"]));
        assert_eq!(state.half_checked, keys(&["root", "a"]));
    }

    #[test]
    fn sibling_leaf_keeps_root_half_checked() {
        let tree = sample_tree();
        let state = conduct(&tree, &keys(&["b", "c"]).into(), false);
        assert_eq!(state.checked, keys(&["a", "b", "c"]));
        assert_eq!(state.half_checked, keys(&["root"]));
    }

    #[test]
    fn raw_checked_internal_node_is_not_forced() {
        let tree = sample_tree();
        let state = conduct(&tree, &keys(&["a"]).into(), false);
        assert!(state.checked.is_empty());
        assert!(state.half_checked.is_empty());
    }

    #[test]
    fn conduct_mode_discards_supplied_half_checked() {
        let tree = sample_tree();
        let input = CheckedKeysInput::Pair {
            checked: keys(&["d"]),
            half_checked: Some(keys(&["b"])),
        };
        let state = conduct(&tree, &input, false);
        assert_eq!(state.checked, keys(&["d"]));
        assert_eq!(state.half_checked, keys(&["root"]));
    }

    #[test]
    fn strict_mode_passes_through() {
        let tree = sample_tree();
        let input = CheckedKeysInput::Pair {
            checked: keys(&["b"]),
            half_checked: Some(keys(&["a"])),
        };
        let state = conduct(&tree, &input, true);
        assert_eq!(state.checked, keys(&["b"]));
        assert_eq!(state.half_checked, keys(&["a"]));

        let flat = conduct(&tree, &keys(&["b", "c"]).into(), true);
        assert_eq!(flat.checked, keys(&["b", "c"]));
        assert!(flat.half_checked.is_empty());
    }

    #[test]
    fn strict_mode_keeps_sets_disjoint() {
        let tree = sample_tree();
        let input = CheckedKeysInput::Pair {
            checked: keys(&["a"]),
            half_checked: Some(keys(&["a", "root"])),
        };
        let state = conduct(&tree, &input, true);
        assert_eq!(state.checked, keys(&["a"]));
        assert_eq!(state.half_checked, keys(&["root"]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_both_host_shapes() {
        assert_eq!(
            CheckedKeysInput::from_json(r#"["a","b"]"#).unwrap(),
            CheckedKeysInput::Keys(keys(&["a", "b"]))
        );
        assert_eq!(
            CheckedKeysInput::from_json(r#"{"checked":["a"],"halfChecked":["r"]}"#).unwrap(),
            CheckedKeysInput::Pair {
                checked: keys(&["a"]),
                half_checked: Some(keys(&["r"])),
            }
        );
        assert!(matches!(
            CheckedKeysInput::from_json("42"),
            Err(TreeError::MalformedCheckedKeys { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_conduct_sets_are_disjoint_and_consistent(
            picks in prop::collection::vec(any::<bool>(), 7)
        ) {
            let tree = sample_tree();
            let all = ["root", "a", "b", "c", "d", "1", "1-0"];
            let raw: Vec<String> = all
                .iter()
                .zip(&picks)
                .filter(|(_, pick)| **pick)
                .map(|(key, _)| (*key).to_string())
                .collect();
            let state = conduct(&tree, &raw.into(), false);

            for key in &state.checked {
                prop_assert!(!state.half_checked.contains(key));
            }
            // `a` is checked exactly when both of its leaves are.
            let leaves_checked = state.is_checked("b") && state.is_checked("c");
            prop_assert_eq!(state.is_checked("a"), leaves_checked);
            // Leaves are never half-checked.
            for leaf in ["b", "c", "d", "1-0"] {
                prop_assert!(!state.is_half_checked(leaf));
            }
        }
    }
}
