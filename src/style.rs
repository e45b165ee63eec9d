use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Политика скролла при перемещении фокуса.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeScrollPolicy {
    KeepInView,
    CenterOnSelect,
}

/// Визуальные настройки виджета дерева.
#[derive(Clone)]
pub struct TreeViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    /// Focus cursor row.
    pub highlight_style: Style,
    pub selected_style: Style,
    pub checked_style: Style,
    /// Rows matched by the widget filter.
    pub match_style: Style,
    /// Row the dragged node would nest into.
    pub drop_target_style: Style,
    pub line_style: Style,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
    pub virtualize_rows: bool,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for TreeViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default(),
            selected_style: Style::default(),
            checked_style: Style::default(),
            match_style: Style::default(),
            drop_target_style: Style::default(),
            line_style: Style::default(),
            highlight_symbol: ">> ",
            borders: Borders::ALL,
            virtualize_rows: false,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}
