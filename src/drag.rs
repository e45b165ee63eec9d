//! Drop-position classification and drag exclusion.

use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::TreeModel;
use crate::walk::{locate_id, walk_from};

/// Hover time on a collapsed node before it opens during a drag.
pub const DRAG_EXPAND_DELAY: Duration = Duration::from_millis(400);

/// Where a dragged node lands relative to the hovered node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropPosition {
    /// Gap above the node.
    Before,
    /// Nested as a child.
    Inside,
    /// Gap below the node.
    After,
}

impl DropPosition {
    /// Signed offset: `-1`, `0` or `1`.
    pub const fn delta(self) -> i64 {
        match self {
            Self::Before => -1,
            Self::Inside => 0,
            Self::After => 1,
        }
    }

    /// Returns `true` for the sibling gaps (`Before`/`After`).
    pub const fn is_gap(self) -> bool {
        !matches!(self, Self::Inside)
    }
}

/// Splits the node's height into three equal bands: top → before, middle → inside,
/// bottom → after. Offsets outside the node clamp to the nearest band.
pub fn classify(offset_within_node: f32, node_height: f32) -> DropPosition {
    if node_height <= 0.0 || offset_within_node.is_nan() {
        return DropPosition::Inside;
    }
    let band = node_height / 3.0;
    if offset_within_node < band {
        DropPosition::Before
    } else if offset_within_node >= node_height - band {
        DropPosition::After
    } else {
        DropPosition::Inside
    }
}

/// Keys of the dragged node and all of its descendants (never valid drop targets).
pub fn collect_excluded<T: TreeModel>(model: &T, dragged: T::Id) -> Vec<String> {
    let Some(entry) = locate_id(model, dragged) else {
        return Vec::new();
    };
    walk_from(model, entry.id, entry.position, entry.depth)
        .map(|entry| entry.key.into_owned())
        .collect()
}

/// Transient state of an in-progress drag.
#[derive(Clone, Debug)]
pub struct DragSession<Id> {
    pub(crate) dragged: Id,
    pub(crate) dragged_key: String,
    pub(crate) excluded: Vec<String>,
    pub(crate) over_key: Option<String>,
    pub(crate) drop_position: Option<DropPosition>,
    pub(crate) pending_expand: Option<(Id, String, Instant)>,
}

impl<Id: Copy> DragSession<Id> {
    pub(crate) const fn new(dragged: Id, dragged_key: String, excluded: Vec<String>) -> Self {
        Self {
            dragged,
            dragged_key,
            excluded,
            over_key: None,
            drop_position: None,
            pending_expand: None,
        }
    }

    pub const fn dragged(&self) -> Id {
        self.dragged
    }

    pub fn dragged_key(&self) -> &str {
        &self.dragged_key
    }

    /// Dragged key plus every descendant key.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == key)
    }

    pub fn over_key(&self) -> Option<&str> {
        self.over_key.as_deref()
    }

    pub const fn drop_position(&self) -> Option<DropPosition> {
        self.drop_position
    }

    /// Clears the hover target (neutral drag-over snapshot).
    pub(crate) fn clear_over(&mut self) {
        self.over_key = None;
        self.drop_position = None;
    }
}

/// Index adjustment reported with a drop: the classified delta plus the target's own
/// sibling index.
pub fn drop_offset(position: DropPosition, target_sibling_index: usize) -> i64 {
    let index = i64::try_from(target_sibling_index).unwrap_or(i64::MAX);
    index.saturating_add(position.delta())
}
