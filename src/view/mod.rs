//! Views - retained-mode nodes built from models.
//!
//! A view owns exactly one host element (`el`) for its whole life. Composite
//! views ([`ElementView`]) additionally own a registry of child views and
//! reconcile it against the model's `children` whenever they change.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --lazy_initialize--> Initializing --> Ready
//!       |                                 |             |
//!       +------------- remove() ----------+-------------+--> Removed
//! ```
//!
//! Ownership and placement are separate relations. The parent that built a
//! view disposes it; the view may still be placed into another host element
//! through its [`rendering_target`](View::rendering_target).

mod build;
mod element;
mod text;

pub use build::*;
pub use element::{ElementView, UpdateReport};
pub use text::TextView;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use bitflags::bitflags;
use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::host::{HostId, RenderingTarget};
use crate::layout;
use crate::types::{BBox, ModelId};

/// Shared handle to any view.
pub type AnyView = Rc<dyn View>;

// =============================================================================
// Lifecycle & flags
// =============================================================================

/// Where a view is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    /// Child views are being materialized.
    Initializing,
    Ready,
    /// Terminal. Nothing leaves this state.
    Removed,
}

bitflags! {
    /// Progress markers orthogonal to [`Lifecycle`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ViewFlags: u8 {
        const SIGNALS_CONNECTED = 1 << 0;
        const RENDERED = 1 << 1;
        const FINISHED = 1 << 2;
    }
}

// =============================================================================
// Context
// =============================================================================

/// Per-runtime state shared by every view of a tree.
pub struct ViewContext {
    spawner: LocalSpawner,
    factory: Rc<dyn ViewFactory>,
    config: ViewConfig,
    errors: RefCell<Vec<ViewError>>,
    idle: Cell<bool>,
    in_flight: Cell<usize>,
}

impl ViewContext {
    pub fn new(spawner: LocalSpawner, factory: Rc<dyn ViewFactory>, config: ViewConfig) -> Self {
        Self {
            spawner,
            factory,
            config,
            errors: RefCell::new(Vec::new()),
            idle: Cell::new(false),
            in_flight: Cell::new(0),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn factory(&self) -> Rc<dyn ViewFactory> {
        self.factory.clone()
    }

    /// Spawn a task onto the runtime's executor.
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<(), ViewError> {
        self.spawner
            .spawn_local(task)
            .map_err(|err| ViewError::Spawn(err.to_string()))
    }

    /// Record an error raised where no caller can receive it.
    pub fn record_error(&self, err: ViewError) {
        self.errors.borrow_mut().push(err);
    }

    pub fn take_errors(&self) -> Vec<ViewError> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    /// True once the whole tree has finished its latest render or update
    /// and no update task is still running or waiting.
    pub fn is_idle(&self) -> bool {
        self.idle.get() && self.in_flight.get() == 0
    }

    pub(crate) fn set_idle(&self, idle: bool) {
        self.idle.set(idle);
    }

    pub(crate) fn begin_update(&self) {
        self.in_flight.set(self.in_flight.get() + 1);
    }

    pub(crate) fn end_update(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
    }
}

// =============================================================================
// View trait
// =============================================================================

/// A retained-mode node bound to one model.
///
/// Implementors provide state access and the four lifecycle operations
/// (`lazy_initialize`, `connect_signals`, `render`, `remove`); placement,
/// completion tracking and measurement are provided.
pub trait View {
    fn model_id(&self) -> ModelId;

    /// The host element this view owns.
    fn el(&self) -> HostId;

    fn lifecycle(&self) -> Lifecycle;

    fn flags(&self) -> ViewFlags;

    fn set_flags(&self, flags: ViewFlags);

    /// The view that built this one, if it is still alive.
    fn parent(&self) -> Option<AnyView>;

    fn context(&self) -> &Rc<ViewContext>;

    /// Placement override. `None` means "wherever the parent puts me".
    fn rendering_target(&self) -> Option<RenderingTarget> {
        None
    }

    /// Materialize descendants. Valid once, from `Uninitialized`.
    fn lazy_initialize(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), ViewError>>;

    /// Subscribe to model changes. Runs at most once.
    fn connect_signals(&self);

    /// Rebuild this view's host content from the current model.
    fn render(&self) -> Result<(), ViewError>;

    /// Dispose this view and every descendant. Idempotent.
    fn remove(&self) -> Result<(), ViewError>;

    /// Child views currently owned by this view.
    fn children(&self) -> Vec<AnyView> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;

    // -------------------------------------------------------------------------
    // Provided
    // -------------------------------------------------------------------------

    fn self_target(&self) -> RenderingTarget {
        RenderingTarget::new(self.el())
    }

    /// Render, then attach `el` to `target`.
    fn render_to(&self, target: &RenderingTarget) -> Result<(), ViewError> {
        self.render()?;
        target.append(self.el())?;
        Ok(())
    }

    /// Hook run once the subtree below this view has been attached.
    fn after_render(&self) {}

    /// Run `after_render` over the subtree, children first.
    fn r_after_render(&self) {
        for child in self.children() {
            child.r_after_render();
        }
        self.after_render();
    }

    fn insert_flags(&self, flags: ViewFlags) {
        self.set_flags(self.flags() | flags);
    }

    fn is_removed(&self) -> bool {
        self.lifecycle() == Lifecycle::Removed
    }

    /// True when this view and every descendant have finished.
    fn has_finished(&self) -> bool {
        self.flags().contains(ViewFlags::FINISHED)
            && self.children().iter().all(|child| child.has_finished())
    }

    /// Mark this view rendered and finished, then tell the ancestors.
    fn finish(&self) {
        self.insert_flags(ViewFlags::RENDERED | ViewFlags::FINISHED);
        self.notify_finished();
    }

    /// Forward completion to the root, which marks the context idle once the
    /// whole tree has finished.
    fn notify_finished(&self) {
        match self.parent() {
            Some(parent) => parent.notify_finished(),
            None => {
                if self.has_finished() {
                    self.context().set_idle(true);
                }
            }
        }
    }

    /// Size of the host element, anchored at the origin.
    fn bbox(&self) -> BBox {
        layout::bounding_box(self.el()).relative()
    }
}

/// Borrow a view as its concrete type.
pub fn downcast_view<T: View + 'static>(view: &AnyView) -> Option<&T> {
    view.as_any().downcast_ref::<T>()
}

/// Fail unless the view is `Ready`.
pub(crate) fn ensure_ready(view: &dyn View) -> Result<(), ViewError> {
    match view.lifecycle() {
        Lifecycle::Ready => Ok(()),
        Lifecycle::Removed => Err(ViewError::Removed(view.model_id())),
        Lifecycle::Uninitialized | Lifecycle::Initializing => {
            Err(ViewError::NotReady(view.model_id()))
        }
    }
}
