//! # spark-views
//!
//! Reactive composite views with incremental child reconciliation.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! Models are plain data in a thread-local store, addressed by generational
//! handles. Each reactive attribute is a signal. Views are retained-mode nodes
//! built from models; a composite view owns its child views and a host
//! element, and reconciles both whenever the model's `children` change:
//!
//! ```text
//! set_children() → children signal → UpdateGate → build_views → relocate / render → host tree
//! ```
//!
//! Unchanged child views are never rebuilt or re-rendered on reorder, only
//! relocated. Literal text is recreated on every pass.
//!
//! ## Modules
//!
//! - [`types`] - Core types (ModelId, Child, Styles, BBox, Rgba)
//! - [`host`] - Host document: elements, text nodes, inline style, markup
//! - [`model`] - Model store and reactive attributes
//! - [`view`] - View trait, builder, element and text views
//! - [`pipeline`] - Executor, update scheduling, mounting
//! - [`layout`] - Taffy-backed bounding boxes
//! - [`renderer`] - Plain and ANSI terminal output

pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod view;

// Re-export commonly used items
pub use types::*;

pub use config::{UPDATE_POLICY_ENV, UpdatePolicy, ViewConfig};
pub use error::{HostError, ViewError};

pub use host::{HostId, RenderingTarget, apply_styles, clear_styles};

pub use model::{ElementModel, ElementProps, Model, TextModel, TextProps};

pub use view::{
    AnyView, BuildOptions, BuildResult, DefaultFactory, ElementView, Lifecycle, TextView,
    UpdateReport, View, ViewContext, ViewFactory, ViewFlags, ViewStorage, build_view,
    build_views, downcast_view, remove_views,
};

pub use pipeline::{MountHandle, Runtime, UpdateGate};

pub use layout::bounding_box;

pub use renderer::{render_plain, write_ansi};

/// Everything needed to define models and mount them.
pub mod prelude {
    pub use crate::config::{UpdatePolicy, ViewConfig};
    pub use crate::error::ViewError;
    pub use crate::host::{self, HostId};
    pub use crate::model::{self, ElementProps, TextProps};
    pub use crate::pipeline::{MountHandle, Runtime};
    pub use crate::types::{Child, ModelId, Styles};
    pub use crate::view::{AnyView, View};
}
