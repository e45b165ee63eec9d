use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::Style;
use ratatui::widgets::{
    Block, Borders, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Table,
    TableState,
};

use crate::context::TreeRowContext;
use crate::glyphs::{TreeGlyphs, TreeLabelRenderer};
use crate::model::{NoFilter, TreeFilter, TreeModel};
use crate::state::{TreeState, VisibleNode};
use crate::style::TreeViewStyle;

/// Основной виджет дерева (table + stateful).
pub struct TreeView<'a, T, L, F = NoFilter>
where
    T: TreeModel,
    L: TreeLabelRenderer<T>,
    F: TreeFilter<T>,
{
    model: &'a T,
    label: &'a L,
    style: TreeViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
    filter: F,
}

impl<'a, T, L> TreeView<'a, T, L, NoFilter>
where
    T: TreeModel,
    L: TreeLabelRenderer<T>,
{
    pub const fn new(model: &'a T, label: &'a L, style: TreeViewStyle<'a>) -> Self {
        Self {
            model,
            label,
            style,
            glyphs: TreeGlyphs::unicode(),
            filter: NoFilter,
        }
    }

    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Highlights rows matching `filter` with [`TreeViewStyle::match_style`].
    pub fn with_filter<F>(self, filter: F) -> TreeView<'a, T, L, F>
    where
        F: TreeFilter<T>,
    {
        TreeView {
            model: self.model,
            label: self.label,
            style: self.style,
            glyphs: self.glyphs,
            filter,
        }
    }
}

impl<'a, T, L, F> TreeView<'a, T, L, F>
where
    T: TreeModel,
    L: TreeLabelRenderer<T>,
    F: TreeFilter<T>,
{
    fn row_style(&self, ctx: &TreeRowContext<'_>) -> Style {
        let flags = ctx.flags;
        let mut style = Style::default();
        if flags.filter_match {
            style = style.patch(self.style.match_style);
        }
        if flags.checked {
            style = style.patch(self.style.checked_style);
        }
        if flags.selected {
            style = style.patch(self.style.selected_style);
        }
        if flags.drag_over {
            style = style.patch(self.style.drop_target_style);
        }
        style
    }

    #[inline]
    fn build_rows(&self, nodes: &[VisibleNode<T::Id>], state: &TreeState<T::Id>) -> Vec<Row<'a>> {
        let checkable = state.config().checkable;
        let mut rows = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut flags = state.node_flags(&node.key);
            flags.filter_match = self.filter.is_match(self.model, node.id);
            let ctx = TreeRowContext {
                level: node.level,
                is_tail_stack: node.is_tail_stack.as_slice(),
                has_children: node.has_children,
                flags,
                checkable,
                draw_lines: state.draw_lines(),
                line_style: self.style.line_style,
            };
            let label_cell = self.label.cell(self.model, node.id, &ctx, &self.glyphs);
            rows.push(Row::new([label_cell]).style(self.row_style(&ctx)));
        }
        rows
    }

    #[inline]
    fn build_table(&self, rows: Vec<Row<'a>>, block: Block<'a>) -> Table<'a> {
        Table::new(rows, [Constraint::Fill(1)])
            .style(self.style.block_style)
            .block(block)
            .row_highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol)
    }

    #[inline]
    fn render_scrollbar(
        &self,
        area: Rect,
        buf: &mut Buffer,
        state: &TreeState<T::Id>,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = state
            .list_state()
            .offset()
            .min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl<T, L, F> StatefulWidget for TreeView<'_, T, L, F>
where
    T: TreeModel,
    L: TreeLabelRenderer<T>,
    F: TreeFilter<T>,
{
    type State = TreeState<T::Id>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.ensure_visible_nodes(self.model);

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        state.ensure_focus_visible_with_policy(inner_height, self.style.scroll_policy);

        let visible_nodes = state.visible_nodes();
        let total_rows = visible_nodes.len();
        let (range_start, range_end) = if self.style.virtualize_rows {
            let start = state.list_state().offset().min(total_rows);
            let end = (start + inner_height).min(total_rows);
            (start, end)
        } else {
            (0, total_rows)
        };

        let rows = self.build_rows(&visible_nodes[range_start..range_end], state);
        let scroll_rows = total_rows.saturating_sub(inner_height);

        let mut local_state = if self.style.virtualize_rows {
            Some(*state.list_state())
        } else {
            None
        };
        let table_state: &mut TableState = local_state.as_mut().map_or_else(
            || state.list_state_mut(),
            |state_ref| {
                *state_ref.offset_mut() = 0;
                if let Some(focused) = state_ref.selected() {
                    if focused < range_start || focused >= range_end {
                        state_ref.select(None);
                    } else {
                        state_ref.select(Some(focused - range_start));
                    }
                }
                state_ref
            },
        );

        let (table_area, table_block, scrollbar_area) = if scroll_rows > 0 {
            let table_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width - 1,
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            (table_area, block.borders(table_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };

        let table = self.build_table(rows, table_block);
        table.render(table_area, buf, table_state);

        if let Some(scrollbar_area) = scrollbar_area {
            self.render_scrollbar(scrollbar_area, buf, state, inner_height, scroll_rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TreeConfig, TreeDefaults};
    use crate::glyphs::ArenaLabel;
    use crate::model::TreeArena;

    fn wide_tree(child_count: usize) -> TreeArena {
        let mut tree = TreeArena::new();
        let root = tree.add_root(Some("root"), "root");
        for idx in 1..=child_count {
            let key = format!("node-{idx}");
            tree.add_child(root, Some(&key), key.clone());
        }
        tree
    }

    fn row_text(buffer: &Buffer, y: u16) -> String {
        let area = buffer.area;
        (area.x..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn render_smoke_with_scrollbar() {
        let model = wide_tree(12);
        let label = ArenaLabel;
        let widget = TreeView::new(&model, &label, TreeViewStyle::default());

        let defaults = TreeDefaults {
            expanded_keys: vec!["root".to_string()],
            ..TreeDefaults::default()
        };
        let mut state = TreeState::with_defaults(&model, TreeConfig::new(), defaults);

        let area = Rect::new(0, 0, 20, 6);
        let mut buffer = Buffer::empty(area);

        widget.render(area, &mut buffer, &mut state);
        assert_eq!(state.visible_len(), 13);
    }

    #[test]
    fn renders_checkboxes_and_filter_matches() {
        let model = wide_tree(2);
        let label = ArenaLabel;
        let widget = TreeView::new(&model, &label, TreeViewStyle::default())
            .glyphs(TreeGlyphs::ascii())
            .with_filter(|tree: &TreeArena, id: usize| tree.label(id) == "node-2");

        let defaults = TreeDefaults {
            expanded_keys: vec!["root".to_string()],
            checked_keys: Some(vec!["node-1".to_string()].into()),
            ..TreeDefaults::default()
        };
        let config = TreeConfig::new().checkable(true);
        let mut state = TreeState::with_defaults(&model, config, defaults);
        state.set_draw_lines(false);

        let area = Rect::new(0, 0, 30, 5);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);

        assert!(row_text(&buffer, 1).contains("v [-] root"));
        assert!(row_text(&buffer, 2).contains("* [x] node-1"));
        assert!(row_text(&buffer, 3).contains("* [ ] node-2"));
    }
}
