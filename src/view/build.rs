//! View Builder - materializes child views and keeps registries in sync.
//!
//! `build_views` reconciles a [`ViewStorage`] against the model references an
//! element wants:
//! - stale entries are disposed right away
//! - missing references are built concurrently through the context's
//!   [`ViewFactory`], each initialized and wired before it is committed
//! - a reference never ends up with two live views
//!
//! No registry borrow is held across an await, so a view may be removed
//! (and its registry drained) while a build is pending.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use futures::future::{self, FutureExt, LocalBoxFuture};

use super::{AnyView, ElementView, TextView, View, ViewContext};
use crate::error::ViewError;
use crate::model::{Model, get_model};
use crate::types::ModelId;

// =============================================================================
// Registry
// =============================================================================

/// Child view registry of one element, keyed by model handle.
#[derive(Default)]
pub struct ViewStorage {
    views: HashMap<ModelId, AnyView>,
}

impl ViewStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: ModelId) -> Option<AnyView> {
        self.views.get(&model).cloned()
    }

    pub fn contains(&self, model: ModelId) -> bool {
        self.views.contains_key(&model)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn values(&self) -> Vec<AnyView> {
        self.views.values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<ModelId> {
        self.views.keys().copied().collect()
    }

    fn insert(&mut self, model: ModelId, view: AnyView) {
        self.views.insert(model, view);
    }

    /// Take every entry whose model is not in `keep`.
    fn drain_stale(&mut self, keep: &HashSet<ModelId>) -> Vec<(ModelId, AnyView)> {
        let stale: Vec<ModelId> = self
            .views
            .keys()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect();
        stale
            .into_iter()
            .filter_map(|id| self.views.remove(&id).map(|view| (id, view)))
            .collect()
    }

    fn drain(&mut self) -> Vec<(ModelId, AnyView)> {
        self.views.drain().collect()
    }
}

// =============================================================================
// Options & results
// =============================================================================

/// Where a new view sits: its owner and the runtime it belongs to.
#[derive(Clone)]
pub struct BuildOptions {
    pub parent: Option<Weak<dyn View>>,
    pub context: Rc<ViewContext>,
}

impl BuildOptions {
    /// Options for a view with no parent.
    pub fn root(context: Rc<ViewContext>) -> Self {
        Self {
            parent: None,
            context,
        }
    }
}

/// Outcome of one [`build_views`] pass.
#[derive(Default)]
pub struct BuildResult {
    /// Views built and committed by this pass.
    pub created: Vec<AnyView>,
    /// Models whose views were disposed as stale.
    pub removed: Vec<ModelId>,
}

// =============================================================================
// Factory
// =============================================================================

/// Creates the view for a model. Creation may suspend.
pub trait ViewFactory {
    fn create(
        &self,
        model: ModelId,
        options: BuildOptions,
    ) -> LocalBoxFuture<'static, Result<AnyView, ViewError>>;
}

/// Element models get an [`ElementView`], text models a [`TextView`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl ViewFactory for DefaultFactory {
    fn create(
        &self,
        model: ModelId,
        options: BuildOptions,
    ) -> LocalBoxFuture<'static, Result<AnyView, ViewError>> {
        let view = match get_model(model) {
            Some(Model::Element(element)) => Ok(ElementView::new(model, element, options) as AnyView),
            Some(Model::Text(text)) => Ok(TextView::new(model, text, options) as AnyView),
            None => Err(ViewError::UnknownModel(model)),
        };
        future::ready(view).boxed_local()
    }
}

// =============================================================================
// Building
// =============================================================================

/// Create, initialize and wire the view for one model.
///
/// A view whose initialization fails is removed before the error returns.
pub async fn build_view(model: ModelId, options: BuildOptions) -> Result<AnyView, ViewError> {
    let factory = options.context.factory();
    let view = factory.create(model, options).await?;
    if let Err(err) = view.clone().lazy_initialize().await {
        dispose(&view, model);
        return Err(err);
    }
    view.connect_signals();
    Ok(view)
}

/// Reconcile `storage` against `models` (order and duplicates irrelevant).
///
/// On failure every view built by this pass is disposed and the first error
/// is returned; entries that were already present are left alone.
pub async fn build_views(
    storage: &RefCell<ViewStorage>,
    models: &[ModelId],
    options: BuildOptions,
) -> Result<BuildResult, ViewError> {
    let removed = prune_views(storage, models);

    let mut missing = Vec::new();
    let mut seen = HashSet::new();
    for &id in models {
        if seen.insert(id) && !storage.borrow().contains(id) {
            missing.push(id);
        }
    }

    let results = future::join_all(
        missing
            .iter()
            .map(|&id| build_view(id, options.clone())),
    )
    .await;

    let mut built = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (id, result) in missing.into_iter().zip(results) {
        match result {
            Ok(view) => built.push((id, view)),
            Err(err) => {
                tracing::debug!(model = %id, %err, "view build failed");
                first_error.get_or_insert(err);
            }
        }
    }
    if let Some(err) = first_error {
        for (id, view) in built {
            dispose(&view, id);
        }
        return Err(err);
    }

    // Another pass may have committed the same model while this one waited.
    let mut created = Vec::with_capacity(built.len());
    let mut duplicates = Vec::new();
    {
        let mut storage = storage.borrow_mut();
        for (id, view) in built {
            if storage.contains(id) {
                duplicates.push((id, view));
            } else {
                storage.insert(id, view.clone());
                created.push(view);
            }
        }
    }
    for (id, view) in duplicates {
        tracing::trace!(model = %id, "discarding duplicate view");
        dispose(&view, id);
    }

    Ok(BuildResult { created, removed })
}

/// Dispose the entries of `storage` whose model is not in `models`.
///
/// Returns the ids that were dropped.
pub(crate) fn prune_views(storage: &RefCell<ViewStorage>, models: &[ModelId]) -> Vec<ModelId> {
    let desired: HashSet<ModelId> = models.iter().copied().collect();
    let stale = storage.borrow_mut().drain_stale(&desired);
    let mut removed = Vec::with_capacity(stale.len());
    for (id, view) in stale {
        dispose(&view, id);
        removed.push(id);
    }
    removed
}

/// Dispose every view in `storage`, leaving it empty.
///
/// Keeps going after a failure; returns the first one.
pub fn remove_views(storage: &RefCell<ViewStorage>) -> Result<(), ViewError> {
    let views = storage.borrow_mut().drain();
    let mut first_error = None;
    for (id, view) in views {
        if let Err(err) = view.remove() {
            tracing::warn!(model = %id, %err, "failed to remove child view");
            first_error.get_or_insert(err);
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn dispose(view: &AnyView, model: ModelId) {
    if let Err(err) = view.remove() {
        tracing::warn!(model = %model, %err, "failed to remove view");
    }
}
