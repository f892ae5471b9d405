//! Renderer - turns a host subtree into terminal output.
//!
//! The subtree is laid out, painted into a [`FrameBuffer`] and written
//! either as plain text or with ANSI styling through crossterm.

mod buffer;
mod paint;

pub use buffer::{Cell, FrameBuffer};
pub use paint::paint;

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};

use crate::host::HostId;
use crate::types::Rgba;

use paint::CONTINUATION;

fn row_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .filter(|c| c.ch != CONTINUATION)
        .map(|c| c.ch)
        .collect()
}

/// Render `root` as plain text, one line per row, trailing blanks trimmed.
pub fn render_plain(root: HostId) -> String {
    let buffer = paint(root);
    let mut lines: Vec<String> = (0..buffer.height())
        .map(|y| row_text(buffer.row(y)).trim_end().to_string())
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn to_color(rgba: Rgba) -> Color {
    Color::Rgb {
        r: rgba.r,
        g: rgba.g,
        b: rgba.b,
    }
}

/// Write `root` with colors and weight as ANSI escape sequences.
///
/// Styles are emitted only when they change between cells and reset at the
/// end of every row.
pub fn write_ansi<W: Write>(out: &mut W, root: HostId) -> io::Result<()> {
    let buffer = paint(root);

    for y in 0..buffer.height() {
        let mut current = Cell::default();
        for cell in buffer.row(y) {
            if cell.ch == CONTINUATION {
                continue;
            }
            if !cell.same_style(&current) {
                queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                if let Some(fg) = cell.fg {
                    queue!(out, SetForegroundColor(to_color(fg)))?;
                }
                if let Some(bg) = cell.bg {
                    queue!(out, SetBackgroundColor(to_color(bg)))?;
                }
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Bold))?;
                }
                current = *cell;
            }
            queue!(out, Print(cell.ch))?;
        }
        queue!(out, SetAttribute(Attribute::Reset), ResetColor, Print("\n"))?;
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        append_child, create_element, create_text, reset_document, set_style_property,
    };

    #[test]
    fn test_render_plain_column() {
        reset_document();

        let root = create_element("div");
        set_style_property(root, "flex-direction", "column");
        append_child(root, create_text("first")).unwrap();
        append_child(root, create_text("second")).unwrap();

        assert_eq!(render_plain(root), "first\nsecond");
    }

    #[test]
    fn test_write_ansi_emits_color_once() {
        reset_document();

        let root = create_element("div");
        set_style_property(root, "color", "#ff0000");
        set_style_property(root, "font-weight", "bold");
        append_child(root, create_text("hi")).unwrap();

        let mut out = Vec::new();
        write_ansi(&mut out, root).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("\x1b[38;2;255;0;0m"));
        assert_eq!(text.matches("38;2;255;0;0").count(), 1);
        assert!(text.contains("hi"));
        assert!(text.ends_with('\n'));
    }
}
