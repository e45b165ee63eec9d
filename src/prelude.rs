pub use crate::{
    ArenaLabel, CheckEvent, CheckState, CheckedKeysInput, CheckedValue, DragEnterEvent,
    DropEvent, DropPosition, ExpandEvent, ExpandOutcome, LoadCompletion, LoadData, NoFilter,
    NodeFlags, PendingLoad, SelectEvent, TreeAction, TreeArena, TreeConfig, TreeDefaults,
    TreeError, TreeEvent, TreeFilter, TreeGlyphs, TreeLabelPrefix, TreeLabelProvider,
    TreeLabelRenderer, TreeModel, TreeProps, TreeResult, TreeRowContext, TreeScrollPolicy,
    TreeState, TreeView, TreeViewStyle, tree_label_line, tree_name_cell,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
