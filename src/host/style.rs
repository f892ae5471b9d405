//! Style applier - inline style onto host elements.

use super::document::{self, HostId};
use crate::types::Styles;

/// Apply a style mapping to an element's inline style.
///
/// Set entries overwrite, unset entries remove the property. Properties not
/// named in `styles` are left alone; call [`clear_styles`] first for a full
/// reset.
pub fn apply_styles(el: HostId, styles: &Styles) {
    for (name, value) in styles.iter() {
        match value {
            Some(value) => document::set_style_property(el, name, value),
            None => document::remove_style_property(el, name),
        }
    }
}

/// Remove the whole inline style of an element.
pub fn clear_styles(el: HostId) {
    document::clear_style(el);
}
