//! Taffy Bridge - bounding boxes for host elements.
//!
//! Converts the inline style of host elements to Taffy styles, lays out the
//! host tree containing an element and reads that element's box back out.
//! Elements default to a flex row, like an unstyled flex container.

use std::collections::{BTreeMap, HashMap};

use taffy::{
    AvailableSpace, Dimension, Display, FlexDirection, LengthPercentage, LengthPercentageAuto,
    NodeId, Rect, Size, Style, TaffyTree,
};

use crate::host::{self, HostId};
use crate::types::BBox;

use super::text_measure::{measure_text_height, text_width};

// =============================================================================
// CSS VALUE CONVERSION
// =============================================================================

/// Parse a CSS length: `auto`, `N%`, `Npx` or a bare number of cells.
pub(crate) fn parse_length(value: &str) -> Option<Dimension> {
    let value = value.trim();
    if value == "auto" {
        return Some(Dimension::Auto);
    }
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f32>().ok().map(|p| Dimension::Percent(p / 100.0));
    }
    let number = value
        .strip_suffix("px")
        .or_else(|| value.strip_suffix("ch"))
        .unwrap_or(value);
    number.trim().parse::<f32>().ok().map(Dimension::Length)
}

fn parse_length_percentage(value: &str) -> Option<LengthPercentage> {
    match parse_length(value)? {
        Dimension::Length(n) => Some(LengthPercentage::Length(n)),
        Dimension::Percent(p) => Some(LengthPercentage::Percent(p)),
        Dimension::Auto => None,
    }
}

fn parse_length_percentage_auto(value: &str) -> Option<LengthPercentageAuto> {
    match parse_length(value)? {
        Dimension::Length(n) => Some(LengthPercentageAuto::Length(n)),
        Dimension::Percent(p) => Some(LengthPercentageAuto::Percent(p)),
        Dimension::Auto => Some(LengthPercentageAuto::Auto),
    }
}

fn to_display(value: &str) -> Display {
    match value {
        "none" => Display::None,
        "block" => Display::Block,
        _ => Display::Flex,
    }
}

fn to_flex_direction(value: &str) -> FlexDirection {
    match value {
        "column" => FlexDirection::Column,
        "row-reverse" => FlexDirection::RowReverse,
        "column-reverse" => FlexDirection::ColumnReverse,
        _ => FlexDirection::Row,
    }
}

fn all_sides<T: Copy>(value: T) -> Rect<T> {
    Rect {
        left: value,
        right: value,
        top: value,
        bottom: value,
    }
}

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Build a Taffy style from an element's inline style.
///
/// Unknown properties and unparsable values are ignored.
fn build_style(css: &BTreeMap<String, String>) -> Style {
    let mut style = Style {
        display: Display::Flex,
        ..Default::default()
    };

    for (name, value) in css {
        let value = value.trim();
        match name.as_str() {
            "display" => style.display = to_display(value),
            "flex-direction" => style.flex_direction = to_flex_direction(value),
            "flex-grow" => {
                if let Ok(grow) = value.parse() {
                    style.flex_grow = grow;
                }
            }
            "flex-shrink" => {
                if let Ok(shrink) = value.parse() {
                    style.flex_shrink = shrink;
                }
            }
            "width" | "height" | "min-width" | "min-height" | "max-width" | "max-height" => {
                let Some(dim) = parse_length(value) else { continue };
                match name.as_str() {
                    "width" => style.size.width = dim,
                    "height" => style.size.height = dim,
                    "min-width" => style.min_size.width = dim,
                    "min-height" => style.min_size.height = dim,
                    "max-width" => style.max_size.width = dim,
                    _ => style.max_size.height = dim,
                }
            }
            "padding" => {
                if let Some(lp) = parse_length_percentage(value) {
                    style.padding = all_sides(lp);
                }
            }
            "padding-left" | "padding-right" | "padding-top" | "padding-bottom" => {
                let Some(lp) = parse_length_percentage(value) else { continue };
                match name.as_str() {
                    "padding-left" => style.padding.left = lp,
                    "padding-right" => style.padding.right = lp,
                    "padding-top" => style.padding.top = lp,
                    _ => style.padding.bottom = lp,
                }
            }
            "margin" => {
                if let Some(lpa) = parse_length_percentage_auto(value) {
                    style.margin = all_sides(lpa);
                }
            }
            "margin-left" | "margin-right" | "margin-top" | "margin-bottom" => {
                let Some(lpa) = parse_length_percentage_auto(value) else { continue };
                match name.as_str() {
                    "margin-left" => style.margin.left = lpa,
                    "margin-right" => style.margin.right = lpa,
                    "margin-top" => style.margin.top = lpa,
                    _ => style.margin.bottom = lpa,
                }
            }
            "gap" => {
                if let Some(lp) = parse_length_percentage(value) {
                    style.gap = Size {
                        width: lp,
                        height: lp,
                    };
                }
            }
            _ => {}
        }
    }

    style
}

// =============================================================================
// TEXT MEASUREMENT
// =============================================================================

fn measure_text(
    id: HostId,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    let Some(content) = host::text(id) else {
        return Size::ZERO;
    };
    if content.is_empty() {
        return Size::ZERO;
    }

    let width = text_width(&content);
    let avail_width = match available_space.width {
        AvailableSpace::Definite(w) => w as u16,
        AvailableSpace::MinContent => width,
        AvailableSpace::MaxContent => u16::MAX,
    };
    let height = measure_text_height(&content, avail_width.max(1));

    Size {
        width: known_dimensions.width.unwrap_or(width.min(avail_width) as f32),
        height: known_dimensions.height.unwrap_or(height as f32),
    }
}

// =============================================================================
// TREE BUILDING
// =============================================================================

fn insert_subtree(
    tree: &mut TaffyTree<HostId>,
    id: HostId,
    nodes: &mut HashMap<HostId, NodeId>,
) -> Option<NodeId> {
    let node = if host::is_text(id) {
        tree.new_leaf_with_context(Style::default(), id).ok()?
    } else {
        let node = tree.new_leaf(build_style(&host::style(id))).ok()?;
        for child in host::children(id) {
            if let Some(child_node) = insert_subtree(tree, child, nodes) {
                let _ = tree.add_child(node, child_node);
            }
        }
        node
    };
    nodes.insert(id, node);
    Some(node)
}

// =============================================================================
// MAIN ENTRY POINTS
// =============================================================================

/// Lay out the host tree rooted at `root` and return the absolute box of
/// every node in it, offsets measured from `root`.
///
/// Layout failures yield an empty map.
pub fn layout_boxes(root: HostId) -> HashMap<HostId, BBox> {
    let mut boxes = HashMap::new();
    if !host::is_alive(root) {
        return boxes;
    }

    let mut tree: TaffyTree<HostId> = TaffyTree::new();
    let mut nodes: HashMap<HostId, NodeId> = HashMap::new();
    let Some(root_node) = insert_subtree(&mut tree, root, &mut nodes) else {
        return boxes;
    };

    let available = Size {
        width: AvailableSpace::MaxContent,
        height: AvailableSpace::MaxContent,
    };
    let mut measure_fn = |known_dimensions: Size<Option<f32>>,
                          available_space: Size<AvailableSpace>,
                          _node_id: NodeId,
                          context: Option<&mut HostId>,
                          _style: &Style| {
        if let Some(&mut id) = context {
            measure_text(id, known_dimensions, available_space)
        } else {
            Size::ZERO
        }
    };
    if tree
        .compute_layout_with_measure(root_node, available, &mut measure_fn)
        .is_err()
    {
        return boxes;
    }

    // Locations are relative to the parent box; accumulate down the tree.
    let mut stack = vec![(root, 0.0f32, 0.0f32)];
    while let Some((id, parent_x, parent_y)) = stack.pop() {
        let Some(layout) = nodes.get(&id).and_then(|&node| tree.layout(node).ok()) else {
            continue;
        };
        let x = parent_x + layout.location.x;
        let y = parent_y + layout.location.y;
        boxes.insert(id, BBox::new(x, y, layout.size.width, layout.size.height));
        for child in host::children(id) {
            stack.push((child, x, y));
        }
    }

    boxes
}

/// Absolute bounding box of a host node, relative to the root of its tree.
///
/// Dead nodes and layout failures yield an empty box at the origin.
pub fn bounding_box(el: HostId) -> BBox {
    if !host::is_alive(el) {
        return BBox::default();
    }
    layout_boxes(host::root_of(el))
        .get(&el)
        .copied()
        .unwrap_or_default()
}
