use std::hash::Hash;

use crate::event::DropEvent;

/// Minimal tree contract required by the engine.
///
/// A proper forest is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has at most one parent;
/// - children are returned in a deterministic order.
///
/// Nodes without an explicit key are identified by their position, so they are only
/// stable while the tree shape is unchanged.
pub trait TreeModel {
    /// Node handle type.
    type Id: Copy + Eq + Hash;

    /// Returns the top-level nodes in order.
    fn roots(&self) -> &[Self::Id];
    /// Returns the node's children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns the explicit key of the node, if it declares one.
    fn key(&self, id: Self::Id) -> Option<&str>;
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }
}

/// Highlight predicate for nodes (reflected as `NodeFlags::filter_match`).
pub trait TreeFilter<T: TreeModel> {
    /// Returns `true` if the node matches the filter criteria.
    fn is_match(&self, model: &T, id: T::Id) -> bool;
}

impl<T, F> TreeFilter<T> for F
where
    T: TreeModel,
    F: Fn(&T, T::Id) -> bool,
{
    #[inline]
    fn is_match(&self, model: &T, id: T::Id) -> bool {
        self(model, id)
    }
}

/// Filter that highlights nothing.
#[derive(Clone, Copy, Debug)]
pub struct NoFilter;

impl<T: TreeModel> TreeFilter<T> for NoFilter {
    #[inline]
    fn is_match(&self, _model: &T, _id: T::Id) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
struct ArenaNode {
    key: Option<String>,
    label: String,
    children: Vec<usize>,
}

/// Owned tree stored in a flat vector; node ids are insertion indices.
#[derive(Clone, Debug, Default)]
pub struct TreeArena {
    nodes: Vec<ArenaNode>,
    roots: Vec<usize>,
}

impl TreeArena {
    /// Creates an empty tree.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Appends a top-level node and returns its id.
    pub fn add_root(&mut self, key: Option<&str>, label: impl Into<String>) -> usize {
        let id = self.push(key, label.into());
        self.roots.push(id);
        id
    }

    /// Appends a node under `parent` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an id returned by this arena.
    pub fn add_child(
        &mut self,
        parent: usize,
        key: Option<&str>,
        label: impl Into<String>,
    ) -> usize {
        let id = self.push(key, label.into());
        self.nodes[parent].children.push(id);
        id
    }

    /// Moves `child` to `index` among the children of `parent` (or among roots).
    ///
    /// Returns `false` and leaves the tree untouched if either node is unknown or
    /// `parent` is `child` itself or one of its descendants.
    pub fn move_to(&mut self, parent: Option<usize>, child: usize, index: usize) -> bool {
        if !self.contains(child) {
            return false;
        }
        if let Some(parent) = parent
            && (!self.contains(parent) || self.in_subtree(child, parent))
        {
            return false;
        }
        self.detach(child);
        let siblings = match parent {
            Some(parent) => &mut self.nodes[parent].children,
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        true
    }

    /// Parent of `id`, or `None` for roots and unknown ids.
    pub fn parent(&self, id: usize) -> Option<usize> {
        self.nodes.iter().position(|node| node.children.contains(&id))
    }

    /// Applies an accepted drop: nests the dragged node as the last child of the
    /// target, or places it in the gap before/after the target among its siblings.
    pub fn apply_drop(&mut self, event: &DropEvent<usize>) -> bool {
        if !event.drop_to_gap {
            return self.move_to(Some(event.node), event.drag_node, usize::MAX);
        }
        let parent = self.parent(event.node);
        let siblings = parent.map_or(self.roots.as_slice(), |parent| self.children(parent));
        let Some(target_index) = siblings.iter().position(|id| *id == event.node) else {
            return false;
        };
        let after = i64::try_from(target_index).is_ok_and(|index| event.drop_position > index);
        // Index among siblings once the dragged node has been taken out.
        let target_index = siblings
            .iter()
            .filter(|id| **id != event.drag_node)
            .position(|id| *id == event.node)
            .unwrap_or(target_index);
        self.move_to(parent, event.drag_node, target_index + usize::from(after))
    }

    /// Display label of the node.
    pub fn label(&self, id: usize) -> &str {
        self.nodes.get(id).map_or("", |node| node.label.as_str())
    }

    /// Number of nodes ever added.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no nodes were added.
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, key: Option<&str>, label: String) -> usize {
        let id = self.nodes.len();
        self.nodes.push(ArenaNode {
            key: key.map(str::to_owned),
            label,
            children: Vec::new(),
        });
        id
    }

    fn in_subtree(&self, root: usize, id: usize) -> bool {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == id {
                return true;
            }
            stack.extend_from_slice(self.children(current));
        }
        false
    }

    fn detach(&mut self, child: usize) {
        self.roots.retain(|id| *id != child);
        for node in &mut self.nodes {
            node.children.retain(|id| *id != child);
        }
    }
}

impl TreeModel for TreeArena {
    type Id = usize;

    fn roots(&self) -> &[Self::Id] {
        &self.roots
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    fn key(&self, id: Self::Id) -> Option<&str> {
        self.nodes.get(id).and_then(|node| node.key.as_deref())
    }

    fn contains(&self, id: Self::Id) -> bool {
        id < self.nodes.len()
    }

    fn size_hint(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_keeps_insertion_order() {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        let b = tree.add_child(root, None, "B");

        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.key(a), Some("a"));
        assert_eq!(tree.key(b), None);
        assert_eq!(tree.label(b), "B");
        assert!(tree.children(99).is_empty());
    }

    #[test]
    fn move_to_reorders_between_parents() {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        let b = tree.add_child(root, Some("b"), "B");
        let c = tree.add_child(a, Some("c"), "C");

        assert!(tree.move_to(Some(root), c, 0));
        assert_eq!(tree.children(root), &[c, a, b]);
        assert!(tree.children(a).is_empty());

        assert!(tree.move_to(None, b, 5));
        assert_eq!(tree.roots(), &[root, b]);
        assert!(!tree.move_to(None, 42, 0));
    }

    #[test]
    fn move_into_own_subtree_is_refused() {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        let b = tree.add_child(a, Some("b"), "B");

        assert!(!tree.move_to(Some(b), a, 0));
        assert!(!tree.move_to(Some(a), a, 0));
        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.children(a), &[b]);
        assert!(tree.children(b).is_empty());
        assert_eq!(crate::walk::walk(&tree).count(), 3);
    }

    #[test]
    fn apply_drop_nests_or_fills_gaps() {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let a = tree.add_child(root, Some("a"), "A");
        let b = tree.add_child(root, Some("b"), "B");
        let c = tree.add_child(root, Some("c"), "C");
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.parent(root), None);

        // `a` dropped after `c`: target index 2, delta +1.
        let after_c = DropEvent {
            node: c,
            drag_node: a,
            drag_nodes_keys: vec!["a".to_string()],
            drop_position: 3,
            drop_to_gap: true,
        };
        assert!(tree.apply_drop(&after_c));
        assert_eq!(tree.children(root), &[b, c, a]);

        // `a` dropped before `b`: target index 0, delta -1.
        let before_b = DropEvent {
            node: b,
            drag_node: a,
            drag_nodes_keys: vec!["a".to_string()],
            drop_position: -1,
            drop_to_gap: true,
        };
        assert!(tree.apply_drop(&before_b));
        assert_eq!(tree.children(root), &[a, b, c]);

        let into_c = DropEvent {
            node: c,
            drag_node: b,
            drag_nodes_keys: vec!["b".to_string()],
            drop_position: 2,
            drop_to_gap: false,
        };
        assert!(tree.apply_drop(&into_c));
        assert_eq!(tree.children(root), &[a, c]);
        assert_eq!(tree.children(c), &[b]);
    }

    #[test]
    fn closure_filter_and_no_filter() {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "Root");
        let filter = |model: &TreeArena, id: usize| model.label(id).starts_with('R');

        assert!(filter.is_match(&tree, root));
        assert!(!NoFilter.is_match(&tree, root));
    }
}
