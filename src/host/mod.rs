//! Host document - the native tree views render into.
//!
//! - [`document`]: arena of elements and text nodes with relocating append
//! - [`target`]: [`RenderingTarget`], the append-only face children see
//! - [`style`]: the inline style applier

mod document;
mod style;
mod target;

pub use document::*;
pub use style::{apply_styles, clear_styles};
pub use target::RenderingTarget;
