//! Rendering targets.

use super::document::{self, HostId};
use crate::error::HostError;

/// An append-capable destination for host content.
///
/// Children place themselves through a target and never reach into their
/// parent's element directly. A view's default target is its own element;
/// a view may declare a different one to be placed outside its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderingTarget {
    element: HostId,
}

impl RenderingTarget {
    pub const fn new(element: HostId) -> Self {
        Self { element }
    }

    /// The host element content is appended to.
    pub const fn element(&self) -> HostId {
        self.element
    }

    /// Append `node` as the last child, relocating it if already attached.
    pub fn append(&self, node: HostId) -> Result<(), HostError> {
        document::append_child(self.element, node)
    }
}

impl From<HostId> for RenderingTarget {
    fn from(element: HostId) -> Self {
        Self::new(element)
    }
}
