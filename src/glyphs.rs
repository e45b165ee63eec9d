use std::borrow::Cow;

use ratatui::text::{Line, Span};
use ratatui::widgets::Cell;

use crate::context::TreeRowContext;
use crate::model::{TreeArena, TreeModel};

/// Набор глифов для линий дерева и состояния узла.
#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    pub checked: &'a str,
    pub half_checked: &'a str,
    pub unchecked: &'a str,
    /// Marker for a pending drop into the gap above the node.
    pub gap_top: &'a str,
    /// Marker for a pending drop into the gap below the node.
    pub gap_bottom: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            checked: "☑",
            half_checked: "◩",
            unchecked: "☐",
            gap_top: "▔",
            gap_bottom: "▁",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            checked: "[x]",
            half_checked: "[-]",
            unchecked: "[ ]",
            gap_top: "^",
            gap_bottom: "_",
        }
    }
}

#[derive(Clone)]
pub struct TreeLabelPrefix<'a> {
    pub name: &'a str,
    pub prefix: Option<Cow<'a, str>>,
}

pub trait TreeLabelProvider<T: TreeModel> {
    fn label_parts<'a>(&'a self, model: &'a T, id: T::Id) -> TreeLabelPrefix<'a>;
}

pub trait TreeLabelRenderer<T: TreeModel> {
    fn cell<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a>;
}

impl<T, P> TreeLabelRenderer<T> for P
where
    T: TreeModel,
    P: TreeLabelProvider<T>,
{
    fn cell<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a> {
        let parts = self.label_parts(model, id);
        tree_name_cell(ctx, parts, glyphs)
    }
}

/// Labels [`TreeArena`] nodes with their stored label.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArenaLabel;

impl TreeLabelProvider<TreeArena> for ArenaLabel {
    fn label_parts<'a>(&'a self, model: &'a TreeArena, id: usize) -> TreeLabelPrefix<'a> {
        TreeLabelPrefix {
            name: model.label(id),
            prefix: None,
        }
    }
}

const fn expander<'a>(ctx: &TreeRowContext<'_>, glyphs: &TreeGlyphs<'a>) -> &'a str {
    if ctx.has_children {
        if ctx.flags.expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else if ctx.level == 0 {
        ""
    } else {
        glyphs.leaf
    }
}

const fn checkbox<'a>(ctx: &TreeRowContext<'_>, glyphs: &TreeGlyphs<'a>) -> Option<&'a str> {
    if !ctx.checkable {
        None
    } else if ctx.flags.checked {
        Some(glyphs.checked)
    } else if ctx.flags.half_checked {
        Some(glyphs.half_checked)
    } else {
        Some(glyphs.unchecked)
    }
}

pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelPrefix<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    let TreeLabelPrefix { name, prefix: op } = parts;
    let op = op.filter(|value| !value.is_empty());
    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len().max(ctx.level as usize) + 8);

    if ctx.level == 0 || !ctx.draw_lines {
        for _ in 0..ctx.level {
            spans.push(Span::raw(glyphs.empty));
        }
    } else {
        for (l, is_last) in ctx.is_tail_stack.iter().enumerate() {
            let part = if l == (ctx.level as usize) - 1 {
                if *is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if *is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    }

    let expander = expander(ctx, glyphs);
    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }
    if let Some(checkbox) = checkbox(ctx, glyphs) {
        spans.push(Span::raw(checkbox));
        spans.push(Span::raw(" "));
    }
    if let Some(op) = op {
        spans.push(Span::raw(op));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(name));

    if ctx.flags.drag_over_gap_top {
        spans.push(Span::raw(" "));
        spans.push(Span::raw(glyphs.gap_top));
    } else if ctx.flags.drag_over_gap_bottom {
        spans.push(Span::raw(" "));
        spans.push(Span::raw(glyphs.gap_bottom));
    }
    Line::from(spans)
}

pub fn tree_name_cell<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelPrefix<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Cell<'a> {
    Cell::from(tree_label_line(ctx, parts, glyphs))
}
