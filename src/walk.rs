//! Depth-first traversal over a [`TreeModel`].

use std::borrow::Cow;

use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::model::TreeModel;
use crate::position;

/// One visited node: handle, resolved key, position and depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkEntry<'a, Id> {
    pub id: Id,
    /// Explicit key, or the position string when the node declares none.
    pub key: Cow<'a, str>,
    pub position: String,
    pub depth: usize,
}

/// Lazy pre-order iterator returned by [`walk`] and [`walk_from`].
pub struct TreeWalk<'a, T: TreeModel> {
    model: &'a T,
    stack: Vec<(T::Id, String, usize)>,
}

/// Walks the whole forest in pre-order, children in their given order.
///
/// Every call starts a fresh traversal.
pub fn walk<T: TreeModel>(model: &T) -> TreeWalk<'_, T> {
    let roots = model.roots();
    let mut stack = Vec::with_capacity(model.size_hint().max(roots.len()));
    for (index, root) in roots.iter().copied().enumerate().rev() {
        stack.push((root, position::encode(None, index), 0));
    }
    TreeWalk { model, stack }
}

/// Walks the subtree rooted at `id`, whose own position and depth are given.
pub fn walk_from<T: TreeModel>(
    model: &T,
    id: T::Id,
    position: String,
    depth: usize,
) -> TreeWalk<'_, T> {
    TreeWalk {
        model,
        stack: vec![(id, position, depth)],
    }
}

/// Finds the entry whose resolved key equals `key`.
pub fn locate<'a, T: TreeModel>(model: &'a T, key: &str) -> Option<WalkEntry<'a, T::Id>> {
    walk(model).find(|entry| entry.key == key)
}

/// Finds the entry of the node with handle `id`.
pub fn locate_id<T: TreeModel>(model: &T, id: T::Id) -> Option<WalkEntry<'_, T::Id>> {
    walk(model).find(|entry| entry.id == id)
}

impl<'a, T: TreeModel> Iterator for TreeWalk<'a, T> {
    type Item = WalkEntry<'a, T::Id>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, position, depth) = self.stack.pop()?;
        let children = self.model.children(id);
        for (index, child) in children.iter().copied().enumerate().rev() {
            self.stack
                .push((child, position::encode(Some(&position), index), depth + 1));
        }
        let key = self
            .model
            .key(id)
            .map_or_else(|| Cow::Owned(position.clone()), Cow::Borrowed);
        Some(WalkEntry {
            id,
            key,
            position,
            depth,
        })
    }
}

/// Flattened pre-order view with parent/child links, built once per operation.
pub(crate) struct TreeIndex<'a, Id> {
    pub(crate) entries: Vec<WalkEntry<'a, Id>>,
    pub(crate) parent: Vec<Option<usize>>,
    pub(crate) children: Vec<Vec<usize>>,
    by_key: FxHashMap<Cow<'a, str>, usize>,
}

impl<'a, Id: Copy + Eq> TreeIndex<'a, Id> {
    pub(crate) fn build<T: TreeModel<Id = Id>>(model: &'a T) -> Self {
        let capacity = model.size_hint();
        let mut entries: Vec<WalkEntry<'a, Id>> = Vec::with_capacity(capacity);
        let mut parent = Vec::with_capacity(capacity);
        let mut children: Vec<Vec<usize>> = Vec::with_capacity(capacity);
        let mut by_key = FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher);
        // Open ancestors of the current entry, by depth.
        let mut path: Vec<usize> = Vec::new();

        for entry in walk(model) {
            let idx = entries.len();
            path.truncate(entry.depth);
            let parent_idx = path.last().copied();
            if let Some(parent_idx) = parent_idx {
                children[parent_idx].push(idx);
            }
            parent.push(parent_idx);
            children.push(Vec::new());
            by_key.entry(entry.key.clone()).or_insert(idx);
            path.push(idx);
            entries.push(entry);
        }

        Self {
            entries,
            parent,
            children,
            by_key,
        }
    }

    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub(crate) fn index_of_id(&self, id: Id) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub(crate) fn key(&self, idx: usize) -> &str {
        &self.entries[idx].key
    }

    /// Indices of `idx` and all of its descendants (pre-order).
    pub(crate) fn subtree(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let depth = self.entries[idx].depth;
        std::iter::once(idx).chain(
            self.entries[idx + 1..]
                .iter()
                .take_while(move |entry| entry.depth > depth)
                .enumerate()
                .map(move |(offset, _)| idx + 1 + offset),
        )
    }

    /// Indices of the ancestors of `idx`, nearest first.
    pub(crate) fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parent[idx], |current| self.parent[*current])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::TreeArena;

    /// `root{a{b,c},d}` plus an unkeyed second root with one unkeyed child.
    pub(crate) fn sample_tree() -> TreeArena {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        tree.add_child(a, Some("b"), "B");
        tree.add_child(a, Some("c"), "C");
        tree.add_child(root, Some("d"), "D");
        let other = tree.add_root(None, "Other");
        tree.add_child(other, None, "Child");
        tree
    }

    #[test]
    fn walks_in_pre_order_with_positions() {
        let tree = sample_tree();
        let visited: Vec<_> = walk(&tree)
            .map(|entry| (entry.key.into_owned(), entry.position, entry.depth))
            .collect();

        assert_eq!(
            visited,
            vec![
                ("root".to_string(), "0".to_string(), 0),
                ("a".to_string(), "0-0".to_string(), 1),
                ("b".to_string(), "0-0-0".to_string(), 2),
                ("c".to_string(), "0-0-1".to_string(), 2),
                ("d".to_string(), "0-1".to_string(), 1),
                ("1".to_string(), "1".to_string(), 0),
                ("1-0".to_string(), "1-0".to_string(), 1),
            ]
        );
    }

    #[test]
    fn walk_is_restartable() {
        let tree = sample_tree();
        let first: Vec<_> = walk(&tree).map(|entry| entry.position).collect();
        let second: Vec<_> = walk(&tree).map(|entry| entry.position).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn walk_from_covers_only_the_subtree() {
        let tree = sample_tree();
        let a = locate(&tree, "a").unwrap();
        let keys: Vec<_> = walk_from(&tree, a.id, a.position, a.depth)
            .map(|entry| entry.key.into_owned())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn index_links_parents_and_children() {
        let tree = sample_tree();
        let index = TreeIndex::build(&tree);
        let a = index.index_of("a").unwrap();
        let b = index.index_of("b").unwrap();

        assert_eq!(index.parent[b], Some(a));
        assert_eq!(index.children[a].len(), 2);
        let ancestors: Vec<_> = index.ancestors(b).map(|idx| index.key(idx)).collect();
        assert_eq!(ancestors, vec!["a", "root"]);
        let subtree: Vec<_> = index.subtree(a).map(|idx| index.key(idx)).collect();
        assert_eq!(subtree, vec!["a", "b", "c"]);
        assert_eq!(index.index_of("missing"), None);
    }
}
