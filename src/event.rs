//! Host-facing notifications, one per user gesture.

#[cfg(feature = "serde")]
use serde::Serialize;

/// Expansion changed at `node`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandEvent<Id> {
    pub expanded_keys: Vec<String>,
    pub node: Id,
    pub expanded: bool,
}

/// Selection changed at `node`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectEvent<Id> {
    pub selected_keys: Vec<String>,
    pub selected: bool,
    pub node: Id,
    /// Nodes whose keys are selected, in tree order.
    pub selected_nodes: Vec<Id>,
}

impl<Id> SelectEvent<Id> {
    pub const NAME: &'static str = "select";
}

/// Primary value of a check event.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckedValue {
    /// Conduct mode: flat checked key list.
    Keys(Vec<String>),
    /// Strict mode: independent checked and half-checked lists.
    Strict {
        checked: Vec<String>,
        #[cfg_attr(feature = "serde", serde(rename = "halfChecked"))]
        half_checked: Vec<String>,
    },
}

impl CheckedValue {
    /// Checked keys of either shape.
    pub fn checked(&self) -> &[String] {
        match self {
            Self::Keys(keys) | Self::Strict { checked: keys, .. } => keys,
        }
    }
}

/// One committed check gesture.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckEvent<Id> {
    pub checked: CheckedValue,
    /// Node where the gesture started.
    pub node: Id,
    /// Target state at `node`.
    pub node_checked: bool,
    /// Nodes whose keys are checked, in tree order.
    pub checked_nodes: Vec<Id>,
    /// Conduct mode only: checked nodes with their positions.
    pub checked_node_positions: Option<Vec<(Id, String)>>,
    /// Conduct mode only: resolved half-checked keys.
    pub half_checked_keys: Option<Vec<String>>,
}

impl<Id> CheckEvent<Id> {
    pub const NAME: &'static str = "check";
}

/// Accepted drop of `drag_node` onto `node`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropEvent<Id> {
    pub node: Id,
    pub drag_node: Id,
    /// Dragged key plus every descendant key.
    pub drag_nodes_keys: Vec<String>,
    /// Classified delta plus the target's own sibling index.
    pub drop_position: i64,
    /// `true` when dropped into a sibling gap rather than inside `node`.
    pub drop_to_gap: bool,
}

/// Delayed expansion of a node hovered during a drag.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragEnterEvent<Id> {
    pub node: Id,
    pub expanded_keys: Vec<String>,
}
