use ratatui::style::Style;

/// Per-node flags derived from the tree state for rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
    pub expanded: bool,
    pub selected: bool,
    pub checked: bool,
    pub half_checked: bool,
    /// Dragged node would nest inside this one.
    pub drag_over: bool,
    pub drag_over_gap_top: bool,
    pub drag_over_gap_bottom: bool,
    pub filter_match: bool,
}

#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub level: u16,
    pub is_tail_stack: &'a [bool],
    pub has_children: bool,
    pub flags: NodeFlags,
    pub checkable: bool,
    pub draw_lines: bool,
    pub line_style: Style,
}
