//! Element View - the composite node.
//!
//! Owns a host element, a registry of child views and the literal text nodes
//! of its latest pass. Two ways to bring the host content in line with the
//! model:
//!
//! - [`render`](View::render): full rebuild. Empties the element, re-applies
//!   style and renders every child view into place.
//! - [`update_children`](ElementView::update_children): incremental. Builds
//!   only missing child views, disposes stale ones and re-appends the rest in
//!   model order. Existing child views are relocated, never re-rendered.
//!
//! Updates run on the runtime's executor, scheduled by the `children` signal
//! through an [`UpdateGate`] unless the context asks for concurrent passes.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture};
use spark_signals::effect;

use super::{
    AnyView, BuildOptions, BuildResult, Lifecycle, View, ViewContext, ViewFlags, ViewStorage,
    build_views, ensure_ready, remove_views,
};
use super::build::prune_views;
use crate::config::UpdatePolicy;
use crate::error::ViewError;
use crate::host::{self, HostId, RenderingTarget, apply_styles, clear_styles};
use crate::model::ElementModel;
use crate::pipeline::UpdateGate;
use crate::types::{Child, ModelId, child_models};

/// Counts from one incremental update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateReport {
    /// Child views built and rendered by this pass.
    pub created: usize,
    /// Child views disposed because their model left `children`.
    pub removed: usize,
    /// Existing child views re-appended without rendering.
    pub relocated: usize,
    /// Children with no view in the registry or that could not be placed.
    pub skipped: usize,
}

pub struct ElementView {
    this: Weak<ElementView>,
    model_id: ModelId,
    model: ElementModel,
    el: HostId,
    parent: Option<Weak<dyn View>>,
    context: Rc<ViewContext>,
    child_views: RefCell<ViewStorage>,
    text_nodes: RefCell<Vec<HostId>>,
    lifecycle: Cell<Lifecycle>,
    flags: Cell<ViewFlags>,
    gate: UpdateGate,
    effects: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl ElementView {
    /// Create the view and its host element. Child views are not built until
    /// [`lazy_initialize`](View::lazy_initialize).
    pub fn new(model_id: ModelId, model: ElementModel, options: BuildOptions) -> Rc<Self> {
        let el = host::create_element(&model.tag);
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            model_id,
            model,
            el,
            parent: options.parent,
            context: options.context,
            child_views: RefCell::new(ViewStorage::new()),
            text_nodes: RefCell::new(Vec::new()),
            lifecycle: Cell::new(Lifecycle::Uninitialized),
            flags: Cell::new(ViewFlags::empty()),
            gate: UpdateGate::new(),
            effects: RefCell::new(Vec::new()),
        })
    }

    pub fn model(&self) -> &ElementModel {
        &self.model
    }

    /// The registry view for `model`, if any.
    pub fn child_view(&self, model: ModelId) -> Option<AnyView> {
        self.child_views.borrow().get(model)
    }

    pub fn child_count(&self) -> usize {
        self.child_views.borrow().len()
    }

    /// Literal text nodes appended by the latest pass, in order.
    pub fn text_nodes(&self) -> Vec<HostId> {
        self.text_nodes.borrow().clone()
    }

    /// True while an update pass is running or owed.
    pub fn is_updating(&self) -> bool {
        self.gate.is_busy()
    }

    fn child_options(&self) -> BuildOptions {
        let parent: Weak<dyn View> = self.this.clone();
        BuildOptions {
            parent: Some(parent),
            context: self.context.clone(),
        }
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Reconcile the registry with the current `children`.
    ///
    /// Returns `None` if this view was removed while the build was pending;
    /// whatever the build produced has been disposed by then.
    async fn build_children(&self) -> Result<Option<BuildResult>, ViewError> {
        let models = child_models(&self.model.children.get());
        let mut result = build_views(&self.child_views, &models, self.child_options()).await?;

        if self.is_removed() {
            tracing::debug!(
                model = %self.model_id,
                built = result.created.len(),
                "removed during materialization, disposing"
            );
            // remove() drained the registry before the build committed
            if let Err(err) = remove_views(&self.child_views) {
                tracing::warn!(model = %self.model_id, %err, "failed to dispose views built after removal");
            }
            return Ok(None);
        }

        // `children` may have moved on while the build was pending
        let current = child_models(&self.model.children.get());
        let pruned = prune_views(&self.child_views, &current);
        if !pruned.is_empty() {
            tracing::debug!(
                model = %self.model_id,
                pruned = pruned.len(),
                "dropping views for children removed during materialization"
            );
            result.created.retain(|view| !pruned.contains(&view.model_id()));
            result.removed.extend(pruned);
        }
        Ok(Some(result))
    }

    // =========================================================================
    // Incremental update
    // =========================================================================

    /// Bring host content in line with `children` without rebuilding views
    /// that already exist.
    ///
    /// A failed build returns before any host content is touched. A child
    /// that cannot be placed is logged and skipped; its siblings still are.
    pub async fn update_children(&self) -> Result<UpdateReport, ViewError> {
        ensure_ready(self)?;

        let Some(built) = self.build_children().await? else {
            return Ok(UpdateReport::default());
        };

        for view in self.child_views.borrow().values() {
            host::detach(view.el());
        }
        self.release_text_nodes();

        let mut report = UpdateReport {
            created: built.created.len(),
            removed: built.removed.len(),
            ..Default::default()
        };
        let mut rendered: Vec<AnyView> = Vec::new();

        for child in self.model.children.get() {
            match child {
                Child::Text(text) => {
                    if let Err(err) = self.append_text(&text) {
                        tracing::warn!(parent = %self.model_id, %err, "failed to append text");
                        report.skipped += 1;
                    }
                }
                Child::Model(id) => {
                    let Some(view) = self.child_view(id) else {
                        tracing::trace!(parent = %self.model_id, model = %id, "no view, skipping");
                        report.skipped += 1;
                        continue;
                    };
                    let target = view.rendering_target().unwrap_or_else(|| self.self_target());
                    let fresh = built.created.iter().any(|c| Rc::ptr_eq(c, &view))
                        && !rendered.iter().any(|r| Rc::ptr_eq(r, &view));
                    let placed = if fresh {
                        tracing::trace!(parent = %self.model_id, model = %id, "render");
                        rendered.push(view.clone());
                        view.render_to(&target)
                    } else {
                        tracing::trace!(parent = %self.model_id, model = %id, "relocate");
                        target.append(view.el()).map_err(ViewError::from)
                    };
                    match placed {
                        Ok(()) if !fresh => report.relocated += 1,
                        Ok(()) => {}
                        Err(err) => {
                            tracing::warn!(parent = %self.model_id, model = %id, %err, "failed to place child");
                            report.skipped += 1;
                        }
                    }
                }
            }
        }

        self.r_after_render();
        self.finish();

        tracing::debug!(
            model = %self.model_id,
            created = report.created,
            removed = report.removed,
            relocated = report.relocated,
            skipped = report.skipped,
            "children updated"
        );
        Ok(report)
    }

    /// Start an update pass on the executor, honoring the update policy.
    fn schedule_update(self: &Rc<Self>) {
        if self.is_removed() {
            return;
        }
        let gated = match self.context.config().update_policy {
            UpdatePolicy::Serialized => {
                if !self.gate.request() {
                    tracing::trace!(model = %self.model_id, "update coalesced");
                    return;
                }
                true
            }
            UpdatePolicy::Concurrent => false,
        };

        self.context.begin_update();
        let view = self.clone();
        let task = async move {
            loop {
                if view.is_removed() {
                    break;
                }
                // Merged follow-ups are passes of their own
                view.context.set_idle(false);
                if let Err(err) = view.update_children().await {
                    tracing::error!(model = %view.model_id, %err, "children update failed");
                    view.context.record_error(err);
                }
                if !gated || !view.gate.finish() {
                    break;
                }
            }
            view.context.end_update();
        };
        self.context.set_idle(false);
        if let Err(err) = self.context.spawn(task) {
            tracing::error!(model = %self.model_id, %err, "could not schedule update");
            self.context.end_update();
            if gated {
                self.gate.reset();
            }
            self.context.record_error(err);
        }
    }

    // =========================================================================
    // Host helpers
    // =========================================================================

    fn append_text(&self, content: &str) -> Result<(), ViewError> {
        let node = host::create_text(content);
        self.text_nodes.borrow_mut().push(node);
        host::append_child(self.el, node)?;
        Ok(())
    }

    fn release_text_nodes(&self) {
        let nodes = std::mem::take(&mut *self.text_nodes.borrow_mut());
        for node in nodes {
            host::release(node);
        }
    }

    fn apply_style(&self) {
        clear_styles(self.el);
        apply_styles(self.el, &self.model.style.get());
    }
}

impl View for ElementView {
    fn model_id(&self) -> ModelId {
        self.model_id
    }

    fn el(&self) -> HostId {
        self.el
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    fn flags(&self) -> ViewFlags {
        self.flags.get()
    }

    fn set_flags(&self, flags: ViewFlags) {
        self.flags.set(flags);
    }

    fn parent(&self) -> Option<AnyView> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn context(&self) -> &Rc<ViewContext> {
        &self.context
    }

    fn rendering_target(&self) -> Option<RenderingTarget> {
        self.model.render_into.map(RenderingTarget::new)
    }

    fn lazy_initialize(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), ViewError>> {
        async move {
            let state = self.lifecycle.get();
            if state != Lifecycle::Uninitialized {
                return Err(ViewError::InvalidState {
                    model: self.model_id,
                    operation: "initialize",
                    state,
                });
            }
            self.lifecycle.set(Lifecycle::Initializing);

            if self.build_children().await?.is_some() {
                self.lifecycle.set(Lifecycle::Ready);
            }
            Ok(())
        }
        .boxed_local()
    }

    fn connect_signals(&self) {
        if self.is_removed() || self.flags().contains(ViewFlags::SIGNALS_CONNECTED) {
            return;
        }
        self.insert_flags(ViewFlags::SIGNALS_CONNECTED);

        // Both effects run once on creation to subscribe; that run is skipped.
        let children = self.model.children.clone();
        let weak = self.this.clone();
        let primed = Cell::new(false);
        let stop_children = effect(move || {
            let _ = children.get();
            if !primed.replace(true) {
                return;
            }
            if let Some(view) = weak.upgrade() {
                view.schedule_update();
            }
        });

        let style = self.model.style.clone();
        let weak = self.this.clone();
        let primed = Cell::new(false);
        let stop_style = effect(move || {
            let _ = style.get();
            if !primed.replace(true) {
                return;
            }
            if let Some(view) = weak.upgrade() {
                if !view.is_removed() {
                    view.apply_style();
                }
            }
        });

        let mut effects = self.effects.borrow_mut();
        effects.push(Box::new(stop_children));
        effects.push(Box::new(stop_style));
    }

    fn render(&self) -> Result<(), ViewError> {
        ensure_ready(self)?;

        host::empty(self.el);
        self.release_text_nodes();
        self.apply_style();

        for child in self.model.children.get() {
            match child {
                Child::Text(text) => {
                    if let Err(err) = self.append_text(&text) {
                        tracing::warn!(parent = %self.model_id, %err, "failed to append text");
                    }
                }
                Child::Model(id) => {
                    let Some(view) = self.child_view(id) else {
                        tracing::trace!(parent = %self.model_id, model = %id, "no view, skipping");
                        continue;
                    };
                    let target = view.rendering_target().unwrap_or_else(|| self.self_target());
                    if let Err(err) = view.render_to(&target) {
                        tracing::warn!(parent = %self.model_id, model = %id, %err, "failed to place child");
                    }
                }
            }
        }

        self.finish();
        Ok(())
    }

    fn remove(&self) -> Result<(), ViewError> {
        if self.lifecycle.replace(Lifecycle::Removed) == Lifecycle::Removed {
            return Ok(());
        }
        self.gate.reset();

        let effects = std::mem::take(&mut *self.effects.borrow_mut());
        for stop in effects {
            stop();
        }

        let result = remove_views(&self.child_views);
        self.release_text_nodes();
        host::release(self.el);

        tracing::trace!(model = %self.model_id, "element view removed");
        result
    }

    fn children(&self) -> Vec<AnyView> {
        self.child_views.borrow().values()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
