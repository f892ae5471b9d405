//! Core types for spark-views.
//!
//! These types flow between models, views and the host document: handles,
//! child entries, inline style mappings, boxes and colors.

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Model handles
// =============================================================================

/// Stable handle to a model in the model store.
///
/// The generation changes whenever a slot is reused, so a handle to a
/// destroyed model never aliases the model that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    index: u32,
    generation: u32,
}

impl ModelId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the model store.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Child entries
// =============================================================================

/// One entry of an element's `children` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Child {
    /// Literal text. Rendered as a fresh host text node on every pass.
    Text(String),
    /// Reference to a nested view-bearing model.
    Model(ModelId),
}

impl Child {
    /// The referenced model, if this entry is not literal text.
    pub fn as_model(&self) -> Option<ModelId> {
        match self {
            Child::Model(id) => Some(*id),
            Child::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Child::Text(_))
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<ModelId> for Child {
    fn from(id: ModelId) -> Self {
        Child::Model(id)
    }
}

/// Model references of a children list, in order, duplicates included.
pub fn child_models(children: &[Child]) -> Vec<ModelId> {
    children.iter().filter_map(Child::as_model).collect()
}

// =============================================================================
// Styles
// =============================================================================

/// Inline style mapping: property name to value, or `None` for "unset".
///
/// Unset entries remove the property when applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Styles(BTreeMap<String, Option<String>>);

impl Styles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Styles::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`Styles::unset`].
    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.unset(name);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Some(value.into()));
    }

    pub fn unset(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), None);
    }

    /// Value of `name`, `None` when absent or unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Styles {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut styles = Styles::new();
        for (k, v) in iter {
            styles.set(k, v);
        }
        styles
    }
}

// =============================================================================
// Bounding box
// =============================================================================

/// Axis-aligned box in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Same size, anchored at the origin of its own coordinate space.
    pub const fn relative(self) -> Self {
        Self::new(0.0, 0.0, self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels, parsed from inline style values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    /// Parse a CSS color: a basic named color, `#rgb` or `#rrggbb`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        match value.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "yellow" => Some(Self::YELLOW),
            "cyan" | "aqua" => Some(Self::CYAN),
            "magenta" | "fuchsia" => Some(Self::MAGENTA),
            "gray" | "grey" => Some(Self::GRAY),
            _ => None,
        }
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self::rgb(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_models_keeps_order_and_duplicates() {
        let a = ModelId::new(0, 0);
        let b = ModelId::new(1, 0);
        let children = vec![Child::from("x"), a.into(), b.into(), "y".into(), a.into()];
        assert_eq!(child_models(&children), vec![a, b, a]);
    }

    #[test]
    fn test_styles_unset_reads_as_none() {
        let styles = Styles::new().with("color", "red").without("background");
        assert_eq!(styles.get("color"), Some("red"));
        assert_eq!(styles.get("background"), None);
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn test_bbox_relative() {
        let b = BBox::new(3.0, 4.0, 10.0, 2.0);
        assert_eq!(b.relative(), BBox::new(0.0, 0.0, 10.0, 2.0));
        assert!(b.contains(3.0, 4.0));
        assert!(!b.contains(13.0, 4.0));
    }

    #[test]
    fn test_rgba_parse() {
        assert_eq!(Rgba::parse("red"), Some(Rgba::RED));
        assert_eq!(Rgba::parse("#00ff00"), Some(Rgba::rgb(0, 255, 0)));
        assert_eq!(Rgba::parse("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("nope"), None);
        assert_eq!(Rgba::parse("#12"), None);
    }
}
