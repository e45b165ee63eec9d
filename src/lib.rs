//! Tree selection state engine with a ratatui tree view.
//!
//! Tracks expanded, selected and checked keys over any [`TreeModel`], derives parent
//! checkbox state from leaves, batches each check gesture into one event, classifies
//! drag drop positions and hooks asynchronous child loading into expansion.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `TreeState::handle_key*` helpers.
//! - `serde`: serde support for keys, events and loosely-typed checked keys input.

mod action;
mod conduct;
mod config;
mod context;
mod drag;
mod error;
mod event;
mod expand;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
mod keyset;
mod load;
mod model;
pub mod position;
pub mod prelude;
mod state;
mod style;
mod transaction;
mod walk;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use conduct::{CheckState, CheckedKeysInput, conduct};
pub use config::{TreeConfig, TreeDefaults, TreeProps};
pub use context::{NodeFlags, TreeRowContext};
pub use drag::{
    DRAG_EXPAND_DELAY, DragSession, DropPosition, classify, collect_excluded, drop_offset,
};
pub use error::{TreeError, TreeResult};
pub use event::{CheckEvent, CheckedValue, DragEnterEvent, DropEvent, ExpandEvent, SelectEvent};
pub use expand::{full_key_list, resolve_expanded_keys};
pub use glyphs::{
    ArenaLabel, TreeGlyphs, TreeLabelPrefix, TreeLabelProvider, TreeLabelRenderer,
    tree_label_line, tree_name_cell,
};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use keyset::KeySet;
pub use load::{LoadCompletion, LoadData, PendingLoad};
pub use model::{NoFilter, TreeArena, TreeFilter, TreeModel};
pub use state::{ExpandOutcome, TreeState, VisibleNode};
pub use style::{TreeScrollPolicy, TreeViewStyle};
pub use transaction::{CheckCommit, CheckCoordinator, CheckTransaction, CheckWrite};
pub use walk::{TreeWalk, WalkEntry, locate, locate_id, walk, walk_from};
pub use widget::TreeView;
