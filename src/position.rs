//! Structural positions: sibling-index paths such as `"0-2-1"`.
//!
//! A position lists the sibling index of every node on the way from the root
//! level down to the node itself, so its segment count is `depth + 1`.

use smallvec::SmallVec;

/// Separator between sibling indices.
pub const DELIMITER: char = '-';

/// Decoded sibling indices of a position.
pub type PositionPath = SmallVec<[usize; 8]>;

/// Appends `sibling_index` to the parent position (root level uses the index alone).
pub fn encode(parent: Option<&str>, sibling_index: usize) -> String {
    match parent {
        Some(parent) => {
            let mut position = String::with_capacity(parent.len() + 4);
            position.push_str(parent);
            position.push(DELIMITER);
            position.push_str(&sibling_index.to_string());
            position
        }
        None => sibling_index.to_string(),
    }
}

/// Splits a position into sibling indices.
///
/// Returns `None` for an empty position or a non-numeric segment.
pub fn decode(position: &str) -> Option<PositionPath> {
    if position.is_empty() {
        return None;
    }
    position
        .split(DELIMITER)
        .map(|segment| segment.parse::<usize>().ok())
        .collect()
}

/// Re-encodes decoded sibling indices.
pub fn encode_path(path: &[usize]) -> String {
    let mut position = String::new();
    for (depth, index) in path.iter().enumerate() {
        if depth > 0 {
            position.push(DELIMITER);
        }
        position.push_str(&index.to_string());
    }
    position
}

/// Returns `true` if `ancestor` is a proper path prefix of `descendant`.
///
/// `"1"` is an ancestor of `"1-0"` but not of `"10-2"`; no position is its own ancestor.
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    if ancestor.is_empty() {
        return false;
    }
    descendant
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with(DELIMITER))
}

/// Sibling index of the node itself (the last segment).
pub fn last_index(position: &str) -> Option<usize> {
    position
        .rsplit(DELIMITER)
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// Depth implied by the position (`segments - 1`).
pub fn depth(position: &str) -> usize {
    position.matches(DELIMITER).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_root_level_without_prefix() {
        assert_eq!(encode(None, 3), "3");
        assert_eq!(encode(Some("0-2"), 1), "0-2-1");
    }

    #[test]
    fn ancestor_respects_segment_boundary() {
        assert!(is_ancestor("0-1", "0-1-2"));
        assert!(!is_ancestor("0-1", "0-10"));
        assert!(!is_ancestor("1", "10-2"));
        assert!(!is_ancestor("0-1", "0-1"));
        assert!(!is_ancestor("0-1-2", "0-1"));
        assert!(!is_ancestor("", "0"));
        assert!(!is_ancestor("0", "0-"));
    }

    #[test]
    fn decode_rejects_malformed_positions() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("0-x"), None);
        assert_eq!(decode("0--1"), None);
        assert_eq!(decode("0-2-1").as_deref(), Some(&[0, 2, 1][..]));
    }

    #[test]
    fn last_index_and_depth() {
        assert_eq!(last_index("0-2-7"), Some(7));
        assert_eq!(last_index("4"), Some(4));
        assert_eq!(depth("4"), 0);
        assert_eq!(depth("0-2-7"), 2);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(path in prop::collection::vec(0usize..50, 1..8)) {
            let mut position: Option<String> = None;
            for index in &path {
                position = Some(encode(position.as_deref(), *index));
            }
            let position = position.unwrap();
            let decoded = decode(&position).unwrap();
            prop_assert_eq!(decoded.as_slice(), path.as_slice());
            prop_assert_eq!(encode_path(&decoded), position.clone());
            prop_assert_eq!(depth(&position) + 1, path.len());
        }

        #[test]
        fn prop_prefix_paths_are_ancestors(
            path in prop::collection::vec(0usize..20, 2..8),
            cut in 1usize..7,
        ) {
            let cut = cut.min(path.len() - 1);
            let ancestor = encode_path(&path[..cut]);
            let descendant = encode_path(&path);
            prop_assert!(is_ancestor(&ancestor, &descendant));
            prop_assert!(!is_ancestor(&descendant, &ancestor));
        }
    }
}
