use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use ratatui::widgets::TableState;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::action::{TreeAction, TreeEvent};
use crate::conduct::{CheckState, CheckedKeysInput, conduct};
use crate::config::{TreeConfig, TreeDefaults, TreeProps};
use crate::context::NodeFlags;
use crate::drag::{
    DRAG_EXPAND_DELAY, DragSession, DropPosition, classify, collect_excluded, drop_offset,
};
use crate::error::{TreeError, TreeResult};
use crate::event::{CheckEvent, CheckedValue, DragEnterEvent, DropEvent, ExpandEvent, SelectEvent};
use crate::expand::{full_key_list, resolve_expanded_keys};
use crate::keyset::KeySet;
use crate::load::{LoadCompletion, LoadData, PendingLoad};
use crate::model::TreeModel;
use crate::position;
use crate::style::TreeScrollPolicy;
use crate::transaction::{CheckCommit, CheckCoordinator, cascade};
use crate::walk::{TreeIndex, locate_id, walk};

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// A visible node row with metadata used for rendering and navigation.
#[derive(Clone, Debug)]
pub struct VisibleNode<Id> {
    pub(crate) id: Id,
    pub(crate) key: String,
    pub(crate) level: u16,
    pub(crate) parent: Option<Id>,
    pub(crate) has_children: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

/// Expansion result: the event plus the load started for the node, if any.
#[derive(Debug)]
pub struct ExpandOutcome<Id> {
    pub event: ExpandEvent<Id>,
    pub load: Option<PendingLoad<Id>>,
}

// Which values the host controls (gestures emit events but do not store them).
#[derive(Clone, Copy, Debug, Default)]
struct Controlled {
    expanded: bool,
    selected: bool,
    checked: bool,
}

/// Tree state: expanded, selected and checked keys, drag session, focus cursor.
///
/// Every gesture reads the current snapshot and replaces it with a new one; only the
/// check transaction stays open across calls, and only within a single gesture.
pub struct TreeState<Id> {
    config: TreeConfig,
    props: Option<TreeProps>,
    controlled: Controlled,
    expanded: KeySet,
    selected: KeySet,
    checked: KeySet,
    half_checked: KeySet,
    coordinator: CheckCoordinator<Id>,
    drag: Option<DragSession<Id>>,
    drop_key: Option<String>,
    loader: Option<Arc<dyn LoadData<Id>>>,
    list_state: TableState,
    // Cached visible rows to avoid recomputing DFS every render.
    visible_nodes: Vec<VisibleNode<Id>>,
    // Fast lookup from node id to visible row index.
    visible_index: FxHashMap<Id, usize>,
    // Marks whether visible_nodes must be rebuilt.
    dirty: bool,
    draw_lines: bool,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

impl<Id: Copy + Eq + Hash> Default for TreeState<Id> {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl<Id: Copy + Eq + Hash> TreeState<Id> {
    /// Creates an empty state.
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            props: None,
            controlled: Controlled::default(),
            expanded: KeySet::new(),
            selected: KeySet::new(),
            checked: KeySet::new(),
            half_checked: KeySet::new(),
            coordinator: CheckCoordinator::new(),
            drag: None,
            drop_key: None,
            loader: None,
            list_state: TableState::default(),
            visible_nodes: Vec::new(),
            visible_index: FxHashMap::with_capacity_and_hasher(0, FxBuildHasher),
            dirty: true,
            draw_lines: true,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    /// Creates a state seeded from uncontrolled defaults.
    pub fn with_defaults<T: TreeModel<Id = Id>>(
        model: &T,
        config: TreeConfig,
        defaults: TreeDefaults,
    ) -> Self {
        let mut state = Self::new(config);
        state.expanded = if config.default_expand_all {
            full_key_list(model).into()
        } else {
            resolve_expanded_keys(model, &defaults.expanded_keys, config.auto_expand_parent).into()
        };
        state.selected = defaults.selected_keys.into();
        let check = state.calc_checked(model, defaults.checked_keys.as_ref());
        state.set_check(check);
        state
    }

    /// Installs the hook invoked when a node is expanded.
    #[must_use]
    pub fn with_loader(mut self, loader: impl LoadData<Id> + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub const fn config(&self) -> TreeConfig {
        self.config
    }

    pub const fn set_config(&mut self, config: TreeConfig) {
        self.config = config;
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    pub(crate) fn visible_nodes(&self) -> &[VisibleNode<Id>] {
        &self.visible_nodes
    }

    fn visible_index_of(&self, id: Id) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    pub fn expanded_keys(&self) -> &[String] {
        self.expanded.as_slice()
    }

    pub fn selected_keys(&self) -> &[String] {
        self.selected.as_slice()
    }

    pub fn checked_keys(&self) -> &[String] {
        self.checked.as_slice()
    }

    pub fn half_checked_keys(&self) -> &[String] {
        self.half_checked.as_slice()
    }

    pub fn is_key_checked(&self, key: &str) -> bool {
        self.checked.contains(key)
    }

    /// Current checkbox state as a snapshot.
    pub fn check_state(&self) -> CheckState {
        CheckState {
            checked: self.checked.to_vec(),
            half_checked: self.half_checked.to_vec(),
        }
    }

    pub const fn drag_session(&self) -> Option<&DragSession<Id>> {
        self.drag.as_ref()
    }

    /// Key of the node that received the last drop attempt.
    pub fn drop_key(&self) -> Option<&str> {
        self.drop_key.as_deref()
    }

    /// Flags the renderer should reflect for `key`.
    pub fn node_flags(&self, key: &str) -> NodeFlags {
        let hover = self.drag.as_ref().and_then(|session| {
            session
                .over_key()
                .filter(|over| *over == key)
                .and(session.drop_position())
        });
        NodeFlags {
            expanded: self.expanded.contains(key),
            selected: self.selected.contains(key),
            checked: self.checked.contains(key),
            half_checked: self.half_checked.contains(key),
            drag_over: hover == Some(DropPosition::Inside),
            drag_over_gap_top: hover == Some(DropPosition::Before),
            drag_over_gap_bottom: hover == Some(DropPosition::After),
            filter_match: false,
        }
    }

    /// Re-derives state from host props.
    ///
    /// Only props that changed since the previous call are applied; `tree_changed`
    /// re-derives the checkbox state against the new tree shape. Returns `true` if
    /// anything was re-derived.
    pub fn sync_props<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        props: TreeProps,
        tree_changed: bool,
    ) -> bool {
        let previous = self.props.take();
        let prev = previous.as_ref();
        let mut synced = false;

        self.controlled = Controlled {
            expanded: props.expanded_keys.is_some(),
            selected: props.selected_keys.is_some(),
            checked: props.checked_keys.is_some(),
        };

        if prev.is_some() && tree_changed {
            let input = props.checked_keys.clone().unwrap_or_else(|| CheckedKeysInput::Pair {
                checked: self.checked.to_vec(),
                half_checked: Some(self.half_checked.to_vec()),
            });
            let check = self.calc_checked(model, Some(&input));
            self.set_check(check);
            synced = true;
        }

        if prev.and_then(|p| p.expanded_keys.as_ref()) != props.expanded_keys.as_ref() {
            let requested = props.expanded_keys.as_deref().unwrap_or_default();
            self.expanded =
                resolve_expanded_keys(model, requested, self.config.auto_expand_parent).into();
            self.dirty = true;
            synced = true;
        }

        if prev.and_then(|p| p.selected_keys.as_ref()) != props.selected_keys.as_ref() {
            self.selected = props.selected_keys.clone().unwrap_or_default().into();
            synced = true;
        }

        if prev.and_then(|p| p.checked_keys.as_ref()) != props.checked_keys.as_ref() {
            let check = self.calc_checked(model, props.checked_keys.as_ref());
            self.set_check(check);
            synced = true;
        }

        if synced {
            tracing::debug!(message = "tree.sync_props", tree_changed);
        }
        self.props = Some(props);
        synced
    }

    #[cfg(feature = "serde")]
    /// Applies a loosely-typed checked keys value (JSON array or pair object).
    ///
    /// Malformed input is logged and leaves the state unchanged; returns whether the
    /// value was applied.
    pub fn set_checked_keys_json<T: TreeModel<Id = Id>>(&mut self, model: &T, value: &str) -> bool {
        match CheckedKeysInput::from_json(value) {
            Ok(input) => {
                let check = self.calc_checked(model, Some(&input));
                self.set_check(check);
                true
            }
            Err(err) => {
                tracing::warn!(message = "tree.check.malformed_input", error = %err);
                false
            }
        }
    }

    fn calc_checked<T: TreeModel<Id = Id>>(
        &self,
        model: &T,
        input: Option<&CheckedKeysInput>,
    ) -> CheckState {
        match input {
            Some(input) if self.config.checkable => {
                conduct(model, input, self.config.check_strictly)
            }
            _ => CheckState::default(),
        }
    }

    fn set_check(&mut self, check: CheckState) {
        self.checked = check.checked.into();
        self.half_checked = check.half_checked.into();
    }

    fn store_expanded(&mut self, keys: KeySet) {
        if self.controlled.expanded {
            return;
        }
        self.expanded = keys;
        self.dirty = true;
    }

    fn store_selected(&mut self, keys: KeySet) {
        if !self.controlled.selected {
            self.selected = keys;
        }
    }

    fn store_check(&mut self, check: CheckState) {
        if !self.controlled.checked {
            self.set_check(check);
        }
    }

    /// Expands or collapses the node.
    ///
    /// When the node opens and a loader is installed, the returned outcome carries the
    /// pending load; the expansion itself is already decided.
    pub fn expand<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        id: Id,
    ) -> Option<ExpandOutcome<Id>> {
        let key = locate_id(model, id)?.key.into_owned();
        let mut next = self.expanded.clone();
        let expanded = !next.contains(&key);
        if expanded {
            next.insert(&key);
        } else {
            next.remove(&key);
        }
        let expanded_keys = next.to_vec();
        self.store_expanded(next);
        tracing::debug!(message = "tree.expand", key = %key, expanded);

        let load = if expanded {
            self.loader.as_ref().map(|loader| {
                let future = loader.load(id, &key);
                PendingLoad::new(id, key.clone(), expanded_keys.clone(), future)
            })
        } else {
            None
        };

        Some(ExpandOutcome {
            event: ExpandEvent {
                expanded_keys,
                node: id,
                expanded,
            },
            load,
        })
    }

    /// Re-applies the expansion decided when a load started (last write wins).
    pub fn apply_load_completion(&mut self, completion: LoadCompletion<Id>) {
        tracing::debug!(message = "tree.load.completed", key = %completion.key);
        self.store_expanded(completion.expanded_keys.into());
    }

    /// Expands all nodes in the model.
    pub fn expand_all<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        self.store_expanded(full_key_list(model).into());
    }

    /// Collapses all nodes.
    pub fn collapse_all(&mut self) {
        self.store_expanded(KeySet::new());
    }

    /// Selects or deselects the node.
    pub fn select<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) -> Option<SelectEvent<Id>> {
        if !self.config.selectable {
            return None;
        }
        let key = locate_id(model, id)?.key.into_owned();
        let selected = !self.selected.contains(&key);
        let next = if !selected {
            let mut next = self.selected.clone();
            next.remove(&key);
            next
        } else if self.config.multiple {
            let mut next = self.selected.clone();
            next.insert(&key);
            next
        } else {
            std::iter::once(key.as_str()).collect()
        };

        let selected_nodes = if next.is_empty() {
            Vec::new()
        } else {
            walk(model)
                .filter(|entry| next.contains(&entry.key))
                .map(|entry| entry.id)
                .collect()
        };
        let selected_keys = next.to_vec();
        self.store_selected(next);
        tracing::debug!(message = "tree.select", key = %key, selected);

        Some(SelectEvent {
            selected_keys,
            selected,
            node: id,
            selected_nodes,
        })
    }

    /// Checks or unchecks the node and commits the whole cascade as one event.
    pub fn check<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) -> Option<CheckEvent<Id>> {
        if !self.config.checkable {
            return None;
        }
        let index = TreeIndex::build(model);
        let origin = index.index_of_id(id)?;
        let key = index.key(origin).to_owned();
        let checked = !self.checked.contains(&key);
        let previous = self.check_state();

        let transaction = self.coordinator.begin(id, &key, checked);
        cascade(
            &index,
            &previous,
            origin,
            checked,
            self.config.check_strictly,
            transaction,
        );
        match self.finish_check(model) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::error!(message = "tree.check.failed", error = %err);
                None
            }
        }
    }

    /// Opens a check transaction at the top of a host-driven cascade.
    pub fn begin_check(&mut self, id: Id, key: &str, checked: bool) {
        self.coordinator.begin(id, key, checked);
    }

    /// Records one node's flags into the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::BatchNotOpen`] if [`Self::begin_check`] was not called.
    pub fn record_check(&mut self, key: &str, checked: bool, half_checked: bool) -> TreeResult<()> {
        self.coordinator.record(key, checked, half_checked)
    }

    /// Discards the open transaction without emitting an event.
    pub fn cancel_check(&mut self) {
        self.coordinator.abort();
    }

    /// Commits the open transaction and builds the single check event.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::BatchNotOpen`] if no transaction is open.
    pub fn finish_check<T: TreeModel<Id = Id>>(&mut self, model: &T) -> TreeResult<CheckEvent<Id>> {
        let previous = self.check_state();
        let CheckCommit {
            origin,
            checked: node_checked,
            state,
            ..
        } = self.coordinator.commit(&previous)?;

        let (checked_nodes, positions) = {
            let checked: FxHashSet<&str> = state.checked.iter().map(String::as_str).collect();
            walk(model)
                .filter(|entry| checked.contains(&*entry.key))
                .map(|entry| (entry.id, (entry.id, entry.position)))
                .unzip::<_, _, Vec<_>, Vec<_>>()
        };

        let event = if self.config.check_strictly {
            CheckEvent {
                checked: CheckedValue::Strict {
                    checked: state.checked.clone(),
                    half_checked: state.half_checked.clone(),
                },
                node: origin,
                node_checked,
                checked_nodes,
                checked_node_positions: None,
                half_checked_keys: None,
            }
        } else {
            CheckEvent {
                checked: CheckedValue::Keys(state.checked.clone()),
                node: origin,
                node_checked,
                checked_nodes,
                checked_node_positions: Some(positions),
                half_checked_keys: Some(state.half_checked.clone()),
            }
        };
        self.store_check(state);
        Ok(event)
    }

    /// Starts dragging `id`: records its excluded subtree and collapses it.
    pub fn drag_start<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) -> bool {
        if !self.config.draggable {
            return false;
        }
        let Some(entry) = locate_id(model, id) else {
            return false;
        };
        let key = entry.key.into_owned();
        let excluded = collect_excluded(model, id);
        let mut next = self.expanded.clone();
        next.remove(&key);
        self.store_expanded(next);
        tracing::debug!(message = "tree.drag.start", key = %key, excluded = excluded.len());
        self.drag = Some(DragSession::new(id, key, excluded));
        true
    }

    /// Pointer entered `target` at `offset` within a row of `height`.
    ///
    /// Hovering the middle of the dragged node itself clears the hover target.
    /// Otherwise the hovered node is scheduled to expand after [`DRAG_EXPAND_DELAY`],
    /// replacing any earlier schedule.
    pub fn drag_enter<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        target: Id,
        offset: f32,
        height: f32,
        now: Instant,
    ) -> Option<DropPosition> {
        let session = self.drag.as_mut()?;
        let key = locate_id(model, target)?.key.into_owned();
        let position = classify(offset, height);

        if key == session.dragged_key && position == DropPosition::Inside {
            session.clear_over();
            return None;
        }

        session.over_key = Some(key.clone());
        session.drop_position = Some(position);
        session.pending_expand = Some((target, key, now + DRAG_EXPAND_DELAY));
        Some(position)
    }

    /// Fires the delayed expansion armed by [`Self::drag_enter`] once it is due.
    pub fn poll_drag_expand(&mut self, now: Instant) -> Option<DragEnterEvent<Id>> {
        let session = self.drag.as_mut()?;
        let (node, key, _) = session
            .pending_expand
            .take_if(|(_, _, deadline)| now >= *deadline)?;
        let mut next = self.expanded.clone();
        next.insert(&key);
        let expanded_keys = next.to_vec();
        self.store_expanded(next);
        tracing::debug!(message = "tree.drag.expand", key = %key);
        Some(DragEnterEvent {
            node,
            expanded_keys,
        })
    }

    /// Ends the drag without a drop.
    pub fn drag_end(&mut self) {
        if let Some(session) = self.drag.take() {
            tracing::debug!(message = "tree.drag.end", key = %session.dragged_key());
        }
    }

    /// Drops the dragged node onto `target` and ends the drag.
    ///
    /// Dropping onto the dragged node or one of its descendants is rejected: no event,
    /// drag-over state reset.
    pub fn drop<T: TreeModel<Id = Id>>(&mut self, model: &T, target: Id) -> Option<DropEvent<Id>> {
        let session = self.drag.take()?;
        let entry = locate_id(model, target)?;
        let key: &str = &entry.key;
        self.drop_key = Some(key.to_owned());

        if session.is_excluded(key) {
            let err = TreeError::InvalidDrop {
                dragged: session.dragged_key().to_owned(),
                target: key.to_owned(),
            };
            tracing::warn!(message = "tree.drop.rejected", error = %err);
            return None;
        }

        let drop_position = if session.over_key() == Some(key) {
            session.drop_position().unwrap_or(DropPosition::Inside)
        } else {
            DropPosition::Inside
        };
        let sibling_index = position::last_index(&entry.position).unwrap_or(0);
        tracing::debug!(
            message = "tree.drop",
            dragged = session.dragged_key(),
            target = key,
            position = ?drop_position,
        );

        Some(DropEvent {
            node: target,
            drag_node: session.dragged(),
            drag_nodes_keys: session.excluded,
            drop_position: drop_offset(drop_position, sibling_index),
            drop_to_gap: drop_position.is_gap(),
        })
    }

    /// Returns whether guide lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Marks the visible-row cache as dirty (call after the model changes).
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Focuses the first visible row.
    pub const fn focus_first(&mut self) {
        self.list_state.select_first();
    }

    /// Focuses the last visible row.
    pub const fn focus_last(&mut self) {
        self.list_state.select_last();
        self.clamp_focus();
    }

    /// Moves focus to the previous visible row.
    pub fn focus_prev(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let focused = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(focused.saturating_sub(1)));
    }

    /// Moves focus to the next visible row.
    pub fn focus_next(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let focused = self.list_state.selected().unwrap_or(0);
        let next = (focused + 1).min(self.visible_nodes.len().saturating_sub(1));
        self.list_state.select(Some(next));
    }

    /// Moves focus to the parent of the focused row.
    pub fn focus_parent(&mut self) {
        let Some(parent_id) = self
            .list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx))
            .and_then(|node| node.parent)
        else {
            return;
        };
        if let Some(parent_idx) = self.visible_index_of(parent_id) {
            self.list_state.select(Some(parent_idx));
        }
    }

    /// Returns the id of the focused node, if any.
    pub fn focused_id(&self) -> Option<Id> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.id))
    }

    /// Returns the key of the focused node, if any.
    pub fn focused_key(&self) -> Option<&str> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.key.as_str()))
    }

    /// Returns the number of visible rows.
    pub const fn visible_len(&self) -> usize {
        self.visible_nodes.len()
    }

    /// Focuses the node if it is visible.
    pub fn focus_id<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) -> bool {
        self.ensure_visible_nodes(model);
        if let Some(idx) = self.visible_index_of(id) {
            self.list_state.select(Some(idx));
            true
        } else {
            false
        }
    }

    /// Adjusts scroll offset so the focused row is within the viewport.
    pub fn ensure_focus_visible(&mut self, viewport_height: usize) {
        self.clamp_focus();
        let Some(focused) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = self.list_state.offset();
        if focused < offset {
            *self.list_state.offset_mut() = focused;
        } else if focused >= offset + viewport_height {
            *self.list_state.offset_mut() = focused + 1 - viewport_height;
        }
    }

    /// Adjusts focus visibility according to the provided scroll policy.
    pub fn ensure_focus_visible_with_policy(
        &mut self,
        viewport_height: usize,
        policy: TreeScrollPolicy,
    ) {
        match policy {
            TreeScrollPolicy::KeepInView => self.ensure_focus_visible(viewport_height),
            TreeScrollPolicy::CenterOnSelect => self.ensure_focus_visible_centered(viewport_height),
        }
    }

    fn ensure_focus_visible_centered(&mut self, viewport_height: usize) {
        self.clamp_focus();
        let Some(focused) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let total = self.visible_nodes.len();
        if total <= viewport_height {
            *self.list_state.offset_mut() = 0;
            return;
        }

        // Center focus, then clamp to valid scroll range.
        let max_offset = total.saturating_sub(viewport_height);
        let offset = focused.saturating_sub(viewport_height / 2).min(max_offset);
        *self.list_state.offset_mut() = offset;
    }

    /// Ensures the visible row list is up to date (if marked dirty).
    pub fn ensure_visible_nodes<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        if !self.dirty {
            return;
        }
        self.visible_nodes.clear();
        self.visible_index.clear();
        let hint = model.size_hint();
        if hint > 0 {
            self.visible_nodes.reserve(hint.saturating_sub(self.visible_nodes.capacity()));
        }
        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        for (index, root) in model.roots().iter().copied().enumerate() {
            let position = position::encode(None, index);
            self.build_visible_nodes(model, root, position, 0, None, &mut is_tail_stack);
        }
        self.dirty = false;
        self.clamp_focus();
    }

    fn build_visible_nodes<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        node_id: Id,
        position: String,
        level: u16,
        parent: Option<Id>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let children = model.children(node_id);
        let has_children = !children.is_empty();
        let key = model
            .key(node_id)
            .map_or_else(|| position.clone(), str::to_owned);
        let is_expanded = has_children && self.expanded.contains(&key);

        let idx = self.visible_nodes.len();
        self.visible_nodes.push(VisibleNode {
            id: node_id,
            key,
            level,
            parent,
            has_children,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.visible_index.insert(node_id, idx);

        if !is_expanded {
            return;
        }

        for (i, child) in children.iter().copied().enumerate() {
            let is_last = i == children.len().saturating_sub(1);
            is_tail_stack.push(is_last);
            let child_position = position::encode(Some(&position), i);
            self.build_visible_nodes(
                model,
                child,
                child_position,
                level.saturating_add(1),
                Some(node_id),
                is_tail_stack,
            );
            is_tail_stack.pop();
        }
    }

    const fn clamp_focus(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }

        if let Some(focused) = self.list_state.selected()
            && focused >= self.visible_nodes.len()
        {
            self.list_state
                .select(Some(self.visible_nodes.len().saturating_sub(1)));
        }
    }

    /// Handles a tree action and returns the resulting event.
    pub fn handle_action<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &T,
        action: TreeAction<C>,
    ) -> TreeEvent<Id, C> {
        self.ensure_visible_nodes(model);
        self.handle_action_inner(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles it.
    pub fn handle_key<T: TreeModel<Id = Id>>(&mut self, model: &T, key: KeyEvent) -> TreeEvent<Id> {
        self.ensure_visible_nodes(model);
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<T, C, F>(
        &mut self,
        model: &T,
        key: KeyEvent,
        custom: F,
    ) -> TreeEvent<Id, C>
    where
        T: TreeModel<Id = Id>,
        F: Fn(KeyEvent) -> Option<C>,
    {
        self.ensure_visible_nodes(model);
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    fn handle_action_inner<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &T,
        action: TreeAction<C>,
    ) -> TreeEvent<Id, C> {
        if matches!(&action, TreeAction::Custom(_)) {
            return TreeEvent::Action(action);
        }

        if self.visible_nodes.is_empty() {
            return TreeEvent::Unhandled;
        }

        match action {
            TreeAction::FocusPrev => {
                self.focus_prev();
                TreeEvent::Handled
            }
            TreeAction::FocusNext => {
                self.focus_next();
                TreeEvent::Handled
            }
            TreeAction::FocusParent => {
                self.focus_parent();
                TreeEvent::Handled
            }
            TreeAction::FocusFirst => {
                self.focus_first();
                TreeEvent::Handled
            }
            TreeAction::FocusLast => {
                self.focus_last();
                TreeEvent::Handled
            }
            TreeAction::ToggleExpand => self
                .focused_id()
                .and_then(|id| self.expand(model, id))
                .map_or(TreeEvent::Unhandled, TreeEvent::Expand),
            TreeAction::ToggleSelect => self
                .focused_id()
                .and_then(|id| self.select(model, id))
                .map_or(TreeEvent::Unhandled, TreeEvent::Select),
            TreeAction::ToggleCheck => self
                .focused_id()
                .and_then(|id| self.check(model, id))
                .map_or(TreeEvent::Unhandled, TreeEvent::Check),
            TreeAction::ExpandAll => {
                self.expand_all(model);
                TreeEvent::Handled
            }
            TreeAction::CollapseAll => {
                self.collapse_all();
                TreeEvent::Handled
            }
            TreeAction::ToggleGuides => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            TreeAction::Custom(_) => TreeEvent::Action(action),
        }
    }
}
