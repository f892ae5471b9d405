//! Models - the domain data views are built from.
//!
//! Models live in a thread-local store and are addressed by generational
//! [`ModelId`](crate::types::ModelId) handles, so views key their child
//! registries by handle rather than by object identity.
//!
//! Every reactive attribute is a spark-signals [`Signal`](spark_signals::Signal).
//! Views subscribe with effects; writing through [`set_children`] or
//! [`set_style`] notifies them synchronously.
//!
//! ```ignore
//! use spark_views::model::{create_element, create_text, set_children, ElementProps, TextProps};
//!
//! let label = create_text(TextProps { content: "hi".into(), ..Default::default() });
//! let row = create_element(ElementProps {
//!     tag: "div".into(),
//!     children: vec!["a: ".into(), label.into()],
//!     ..Default::default()
//! });
//!
//! // Reorder; the label's view is reused, not rebuilt
//! set_children(row, vec![label.into(), "a: ".into()])?;
//! ```

mod store;

pub use store::*;

use spark_signals::{Signal, signal};

use crate::host::HostId;
use crate::types::{Child, Styles};

// =============================================================================
// Props
// =============================================================================

/// Initial attributes of an element model.
#[derive(Debug, Clone)]
pub struct ElementProps {
    /// Host tag of the element's own node.
    pub tag: String,
    pub style: Styles,
    pub children: Vec<Child>,
    /// Place the view into this host element instead of its parent's.
    pub render_into: Option<HostId>,
}

impl Default for ElementProps {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            style: Styles::default(),
            children: Vec::new(),
            render_into: None,
        }
    }
}

/// Initial attributes of a text model.
#[derive(Debug, Clone, Default)]
pub struct TextProps {
    pub content: String,
    /// Place the view into this host element instead of its parent's.
    pub render_into: Option<HostId>,
}

// =============================================================================
// Models
// =============================================================================

/// A composite model: styled element with ordered children.
#[derive(Clone)]
pub struct ElementModel {
    pub tag: String,
    pub style: Signal<Styles>,
    pub children: Signal<Vec<Child>>,
    pub render_into: Option<HostId>,
}

impl ElementModel {
    fn from_props(props: ElementProps) -> Self {
        Self {
            tag: props.tag,
            style: signal(props.style),
            children: signal(props.children),
            render_into: props.render_into,
        }
    }
}

/// A leaf model rendering a single host text node.
#[derive(Clone)]
pub struct TextModel {
    pub content: Signal<String>,
    pub render_into: Option<HostId>,
}

impl TextModel {
    fn from_props(props: TextProps) -> Self {
        Self {
            content: signal(props.content),
            render_into: props.render_into,
        }
    }
}

/// Any model held by the store.
///
/// Cloning is cheap: signals are shared handles.
#[derive(Clone)]
pub enum Model {
    Element(ElementModel),
    Text(TextModel),
}

impl Model {
    pub fn kind(&self) -> &'static str {
        match self {
            Model::Element(_) => "element",
            Model::Text(_) => "text",
        }
    }

    pub fn render_into(&self) -> Option<HostId> {
        match self {
            Model::Element(m) => m.render_into,
            Model::Text(m) => m.render_into,
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Element(m) => f
                .debug_struct("Element")
                .field("tag", &m.tag)
                .field("render_into", &m.render_into)
                .finish_non_exhaustive(),
            Model::Text(m) => f
                .debug_struct("Text")
                .field("render_into", &m.render_into)
                .finish_non_exhaustive(),
        }
    }
}
