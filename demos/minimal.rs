// Minimal example: a tiny keyed tree rendered with default styling.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_treeselect::{
    ArenaLabel, TreeArena, TreeConfig, TreeDefaults, TreeState, TreeView, TreeViewStyle,
};

fn main() {
    // root -> {alpha, beta}
    let mut model = TreeArena::new();
    let root = model.add_root(Some("root"), "root");
    model.add_child(root, Some("alpha"), "alpha");
    model.add_child(root, Some("beta"), "beta");

    // State holds expansion/selection/checks and must live across frames.
    let defaults = TreeDefaults {
        expanded_keys: vec!["alpha".to_string()],
        ..TreeDefaults::default()
    };
    let mut state = TreeState::with_defaults(&model, TreeConfig::new(), defaults);

    let label = ArenaLabel;
    let widget = TreeView::new(&model, &label, TreeViewStyle::default());

    // Render into an in-memory buffer (no terminal required for the example).
    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer, &mut state);
}
