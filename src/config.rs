use crate::conduct::CheckedKeysInput;

/// Behavior switches of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// Enables selection gestures.
    pub selectable: bool,
    /// Enables checkbox computation.
    pub checkable: bool,
    /// Strict mode: checked/half-checked sets are independent, no inference.
    pub check_strictly: bool,
    /// Expands every ancestor of requested expanded keys.
    pub auto_expand_parent: bool,
    /// Allows more than one selected key.
    pub multiple: bool,
    /// Enables drag classification.
    pub draggable: bool,
    /// Starts with every node expanded (ignores default expanded keys).
    pub default_expand_all: bool,
}

impl TreeConfig {
    pub const fn new() -> Self {
        Self {
            selectable: true,
            checkable: false,
            check_strictly: false,
            auto_expand_parent: true,
            multiple: false,
            draggable: false,
            default_expand_all: false,
        }
    }

    pub const fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub const fn checkable(mut self, checkable: bool) -> Self {
        self.checkable = checkable;
        self
    }

    pub const fn check_strictly(mut self, check_strictly: bool) -> Self {
        self.check_strictly = check_strictly;
        self
    }

    pub const fn auto_expand_parent(mut self, auto_expand_parent: bool) -> Self {
        self.auto_expand_parent = auto_expand_parent;
        self
    }

    pub const fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub const fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub const fn default_expand_all(mut self, expand_all: bool) -> Self {
        self.default_expand_all = expand_all;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initial values for uncontrolled state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDefaults {
    pub expanded_keys: Vec<String>,
    pub selected_keys: Vec<String>,
    pub checked_keys: Option<CheckedKeysInput>,
}

/// Host-controlled values.
///
/// A `Some` field is controlled: gestures still emit events but never store a new
/// value for it; the host is expected to pass the next value back through
/// [`TreeState::sync_props`](crate::TreeState::sync_props).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeProps {
    pub expanded_keys: Option<Vec<String>>,
    pub selected_keys: Option<Vec<String>>,
    pub checked_keys: Option<CheckedKeysInput>,
}

impl TreeProps {
    /// All values uncontrolled.
    pub fn uncontrolled() -> Self {
        Self::default()
    }

    pub fn with_expanded_keys(mut self, keys: Vec<String>) -> Self {
        self.expanded_keys = Some(keys);
        self
    }

    pub fn with_selected_keys(mut self, keys: Vec<String>) -> Self {
        self.selected_keys = Some(keys);
        self
    }

    pub fn with_checked_keys(mut self, keys: impl Into<CheckedKeysInput>) -> Self {
        self.checked_keys = Some(keys.into());
        self
    }
}
