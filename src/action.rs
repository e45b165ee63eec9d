use crate::event::{CheckEvent, SelectEvent};
use crate::state::ExpandOutcome;

/// Actions that a user or application can initiate on the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move the focus cursor to the previous visible row.
    FocusPrev,
    /// Move the focus cursor to the next visible row.
    FocusNext,
    /// Move the focus cursor to the parent node.
    FocusParent,
    /// Move the focus cursor to the first visible row.
    FocusFirst,
    /// Move the focus cursor to the last visible row.
    FocusLast,
    /// Expand or collapse the focused node.
    ToggleExpand,
    /// Select or deselect the focused node.
    ToggleSelect,
    /// Check or uncheck the focused node.
    ToggleCheck,
    /// Expand all nodes in the tree.
    ExpandAll,
    /// Collapse all nodes in the tree.
    CollapseAll,
    /// Toggle drawing of guide lines.
    ToggleGuides,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// Result of handling an action or key event.
#[derive(Debug)]
pub enum TreeEvent<Id, Custom = ()> {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (e.g., nothing focused / feature disabled).
    Unhandled,
    /// Expansion changed; may carry a pending load.
    Expand(ExpandOutcome<Id>),
    /// Selection changed.
    Select(SelectEvent<Id>),
    /// One check gesture was committed.
    Check(CheckEvent<Id>),
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
