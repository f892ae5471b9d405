//! Layout - bounding boxes for host elements.
//!
//! The host document carries no geometry of its own. Boxes are computed on
//! demand with [Taffy](https://github.com/DioxusLabs/taffy):
//!
//! 1. Build a Taffy tree from the host subtree containing the element
//! 2. Convert inline style (display, flex-direction, size, padding, ...) to
//!    Taffy styles
//! 3. Measure text nodes in terminal cells
//! 4. Read the element's box back out
//!
//! Nothing is cached; every call reflects the current tree and styles.

mod taffy_bridge;
mod text_measure;

pub use taffy_bridge::{bounding_box, layout_boxes};
pub use text_measure::{measure_text_height, string_width, text_width};
pub(crate) use text_measure::char_width;
