//! Paint - fills a FrameBuffer from a laid-out host subtree.
//!
//! Recognized inline style:
//! - `background`: fills the element's box
//! - `color`: foreground of descendant text
//! - `font-weight: bold` (or `700`): bold descendant text
//! - `display: none`: element and subtree skipped

use std::collections::HashMap;

use crate::host::{self, HostId};
use crate::layout::{char_width, layout_boxes};
use crate::types::{BBox, Rgba};

use super::buffer::{Cell, FrameBuffer};

/// Marks the trailing half of a wide character.
pub(crate) const CONTINUATION: char = '\0';

/// Text attributes inherited down the tree.
#[derive(Debug, Clone, Copy, Default)]
struct Inherited {
    fg: Option<Rgba>,
    bold: bool,
}

fn to_cells(value: f32) -> u16 {
    value.round().clamp(0.0, u16::MAX as f32) as u16
}

/// Lay out `root` and paint it into a buffer sized to its box.
pub fn paint(root: HostId) -> FrameBuffer {
    let boxes = layout_boxes(root);
    let Some(root_box) = boxes.get(&root) else {
        return FrameBuffer::new(0, 0);
    };
    let mut buffer = FrameBuffer::new(
        to_cells(root_box.x + root_box.width),
        to_cells(root_box.y + root_box.height),
    );
    paint_node(&mut buffer, &boxes, root, Inherited::default());
    buffer
}

fn paint_node(
    buffer: &mut FrameBuffer,
    boxes: &HashMap<HostId, BBox>,
    id: HostId,
    inherited: Inherited,
) {
    let Some(bbox) = boxes.get(&id).copied() else {
        return;
    };

    if let Some(content) = host::text(id) {
        paint_text(buffer, bbox, &content, inherited);
        return;
    }

    let style = host::style(id);
    if style.get("display").map(String::as_str) == Some("none") {
        return;
    }

    if let Some(bg) = style.get("background").and_then(|v| Rgba::parse(v)) {
        buffer.fill_bg(
            to_cells(bbox.x),
            to_cells(bbox.y),
            to_cells(bbox.width),
            to_cells(bbox.height),
            bg,
        );
    }

    let mut attrs = inherited;
    if let Some(fg) = style.get("color").and_then(|v| Rgba::parse(v)) {
        attrs.fg = Some(fg);
    }
    if let Some(weight) = style.get("font-weight") {
        attrs.bold = matches!(weight.trim(), "bold" | "bolder" | "700" | "800" | "900");
    }

    for child in host::children(id) {
        paint_node(buffer, boxes, child, attrs);
    }
}

/// Write text wrapped at the width of its box.
fn paint_text(buffer: &mut FrameBuffer, bbox: BBox, content: &str, attrs: Inherited) {
    let x0 = to_cells(bbox.x);
    let max_width = to_cells(bbox.width).max(1);
    let mut row = to_cells(bbox.y);

    for line in content.split('\n') {
        let mut col = 0u16;
        for c in line.chars() {
            let w = char_width(c);
            if w == 0 {
                continue;
            }
            if col + w > max_width && col > 0 {
                row = row.saturating_add(1);
                col = 0;
            }
            put(buffer, x0 + col, row, c, attrs);
            if w == 2 {
                put(buffer, x0 + col + 1, row, CONTINUATION, attrs);
            }
            col += w;
        }
        row = row.saturating_add(1);
    }
}

fn put(buffer: &mut FrameBuffer, x: u16, y: u16, ch: char, attrs: Inherited) {
    if let Some(cell) = buffer.get_mut(x, y) {
        *cell = Cell {
            ch,
            fg: attrs.fg,
            bg: cell.bg,
            bold: attrs.bold,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{append_child, create_element, create_text, reset_document, set_style_property};

    #[test]
    fn test_paint_row_of_text() {
        reset_document();

        let root = create_element("div");
        append_child(root, create_text("ab")).unwrap();
        append_child(root, create_text("cd")).unwrap();

        let buffer = paint(root);
        assert_eq!(buffer.width(), 4);
        assert_eq!(buffer.height(), 1);
        let row: String = buffer.row(0).iter().map(|c| c.ch).collect();
        assert_eq!(row, "abcd");
    }

    #[test]
    fn test_color_inherits_and_background_fills() {
        reset_document();

        let root = create_element("div");
        set_style_property(root, "color", "red");
        set_style_property(root, "background", "#0000ff");
        set_style_property(root, "width", "3");
        append_child(root, create_text("x")).unwrap();

        let buffer = paint(root);
        let x = buffer.get(0, 0).unwrap();
        assert_eq!(x.fg, Some(Rgba::RED));
        assert_eq!(x.bg, Some(Rgba::BLUE));
        assert_eq!(buffer.get(2, 0).unwrap().bg, Some(Rgba::BLUE));
    }

    #[test]
    fn test_wide_chars_take_two_cells() {
        reset_document();

        let root = create_element("div");
        append_child(root, create_text("日a")).unwrap();

        let buffer = paint(root);
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.get(1, 0).unwrap().ch, CONTINUATION);
        assert_eq!(buffer.get(2, 0).unwrap().ch, 'a');
    }
}
