//! Mount API - runtime setup and the root view.
//!
//! Provides the main entry points:
//! - `Runtime::new()` - Create an executor and a view context
//! - `Runtime::mount()` - Build, render and attach a root view
//! - `Runtime::tick()` - Run scheduled update passes until nothing is ready
//!
//! # Example
//!
//! ```ignore
//! use spark_views::prelude::*;
//!
//! let container = host::create_element("body");
//! let root = model::create_element(ElementProps {
//!     children: vec!["count: ".into(), "0".into()],
//!     ..Default::default()
//! });
//!
//! let mut runtime = Runtime::new(ViewConfig::from_env());
//! let handle = runtime.mount(root, container)?;
//!
//! model::set_children(root, vec!["count: ".into(), "1".into()])?;
//! runtime.tick();
//! assert!(handle.is_idle());
//!
//! handle.unmount()?;
//! ```

use std::future::Future;
use std::rc::Rc;

use futures::executor::LocalPool;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::host::{HostId, RenderingTarget};
use crate::types::ModelId;
use crate::view::{AnyView, BuildOptions, DefaultFactory, ViewContext, ViewFactory, build_view};

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`Runtime::mount`].
///
/// Dropping the handle leaves the tree mounted; call [`unmount`](Self::unmount)
/// to dispose it.
pub struct MountHandle {
    root: AnyView,
    container: HostId,
}

impl MountHandle {
    pub fn root(&self) -> &AnyView {
        &self.root
    }

    pub fn container(&self) -> HostId {
        self.container
    }

    /// True once every view has finished its latest render or update and no
    /// update pass is still running or waiting.
    pub fn is_idle(&self) -> bool {
        self.root.context().is_idle()
    }

    /// Remove the root view and every descendant.
    pub fn unmount(self) -> Result<(), ViewError> {
        self.root.remove()
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Single-threaded executor plus the context shared by its views.
///
/// Update passes scheduled by model changes only make progress while the
/// runtime is driven with [`tick`](Self::tick) or [`run_until`](Self::run_until).
pub struct Runtime {
    pool: LocalPool,
    context: Rc<ViewContext>,
}

impl Runtime {
    pub fn new(config: ViewConfig) -> Self {
        Self::with_factory(config, Rc::new(DefaultFactory))
    }

    /// Runtime whose views are created by `factory`.
    pub fn with_factory(config: ViewConfig, factory: Rc<dyn ViewFactory>) -> Self {
        let pool = LocalPool::new();
        let context = Rc::new(ViewContext::new(pool.spawner(), factory, config));
        Self { pool, context }
    }

    pub fn context(&self) -> &Rc<ViewContext> {
        &self.context
    }

    /// Build the view for `model`, render it and append it to `container`.
    ///
    /// Blocks until materialization completes. A view that fails to render
    /// is removed before the error returns.
    pub fn mount(&mut self, model: ModelId, container: HostId) -> Result<MountHandle, ViewError> {
        let options = BuildOptions::root(self.context.clone());
        let root = self.run_until(build_view(model, options))?;

        if let Err(err) = root.render_to(&RenderingTarget::new(container)) {
            if let Err(remove_err) = root.remove() {
                tracing::warn!(model = %model, %remove_err, "failed to remove root after render failure");
            }
            return Err(err);
        }
        root.r_after_render();

        tracing::debug!(model = %model, "mounted");
        Ok(MountHandle { root, container })
    }

    /// Flush pending effects, run every task that can make progress, then
    /// return.
    pub fn tick(&mut self) {
        spark_signals::flush_sync();
        self.pool.run_until_stalled();
    }

    /// Drive the executor until `future` completes.
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }

    /// Errors recorded by update passes since the last call.
    pub fn take_errors(&self) -> Vec<ViewError> {
        self.context.take_errors()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}
