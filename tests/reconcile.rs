//! Reconciliation tests for composite views.
//!
//! Child models here are text models built as `TrackedView`s, which count how
//! often they are created, rendered, finished and removed. Element models go
//! through the default factory, so the composite under test is the real
//! `ElementView`.
//!
//! Run with: RUST_LOG=spark_views=trace cargo test --test reconcile -- --nocapture

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use spark_views::host::{self, HostId};
use spark_views::model::{self, ElementProps, Model, TextModel, TextProps};
use spark_views::{
    AnyView, BuildOptions, Child, DefaultFactory, ElementView, Lifecycle, ModelId,
    RenderingTarget, Runtime, Styles, UpdatePolicy, View, ViewConfig, ViewContext, ViewError,
    ViewFactory, ViewFlags, downcast_view, render_plain,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// TRACKED VIEWS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    created: u32,
    rendered: u32,
    after_render: u32,
    removed: u32,
}

#[derive(Default)]
struct Tracker {
    counts: RefCell<HashMap<ModelId, Counts>>,
}

impl Tracker {
    fn bump(&self, model: ModelId, f: impl FnOnce(&mut Counts)) {
        f(self.counts.borrow_mut().entry(model).or_default());
    }

    fn get(&self, model: ModelId) -> Counts {
        self.counts.borrow().get(&model).copied().unwrap_or_default()
    }
}

/// Leaf view over a text model that records its lifecycle calls.
struct TrackedView {
    model_id: ModelId,
    model: TextModel,
    el: HostId,
    parent: Option<Weak<dyn View>>,
    context: Rc<ViewContext>,
    lifecycle: Cell<Lifecycle>,
    flags: Cell<ViewFlags>,
    tracker: Rc<Tracker>,
}

impl View for TrackedView {
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
        self.lifecycle.set(Lifecycle::Ready);
        future::ready(Ok(())).boxed_local()
    }

    fn connect_signals(&self) {
        self.insert_flags(ViewFlags::SIGNALS_CONNECTED);
    }

    fn render(&self) -> Result<(), ViewError> {
        if self.is_removed() {
            return Err(ViewError::Removed(self.model_id));
        }
        host::set_text(self.el, &self.model.content.get());
        self.tracker.bump(self.model_id, |c| c.rendered += 1);
        self.finish();
        Ok(())
    }

    fn after_render(&self) {
        self.tracker.bump(self.model_id, |c| c.after_render += 1);
    }

    fn remove(&self) -> Result<(), ViewError> {
        if self.lifecycle.replace(Lifecycle::Removed) == Lifecycle::Removed {
            return Ok(());
        }
        host::release(self.el);
        self.tracker.bump(self.model_id, |c| c.removed += 1);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Text models become tracked views; creation can be held back or made to fail.
#[derive(Default)]
struct TrackingFactory {
    tracker: Rc<Tracker>,
    gates: RefCell<HashMap<ModelId, oneshot::Receiver<()>>>,
    failing: RefCell<HashSet<ModelId>>,
}

impl TrackingFactory {
    /// Hold back creation of `model` until the returned sender fires.
    fn gate(&self, model: ModelId) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(model, rx);
        tx
    }

    fn fail(&self, model: ModelId) {
        self.failing.borrow_mut().insert(model);
    }
}

impl ViewFactory for TrackingFactory {
    fn create(
        &self,
        model: ModelId,
        options: BuildOptions,
    ) -> LocalBoxFuture<'static, Result<AnyView, ViewError>> {
        let text = match model::get_model(model) {
            Some(Model::Text(text)) => text,
            _ => return DefaultFactory.create(model, options),
        };
        if self.failing.borrow().contains(&model) {
            let err = ViewError::Materialize {
                model,
                reason: "held failure".into(),
            };
            return future::ready(Err(err)).boxed_local();
        }

        let gate = self.gates.borrow_mut().remove(&model);
        let tracker = self.tracker.clone();
        async move {
            if let Some(gate) = gate {
                gate.await.map_err(|_| ViewError::Materialize {
                    model,
                    reason: "gate dropped".into(),
                })?;
            }
            tracker.bump(model, |c| c.created += 1);
            let el = host::create_text(&text.content.get());
            let view: AnyView = Rc::new(TrackedView {
                model_id: model,
                model: text,
                el,
                parent: options.parent,
                context: options.context,
                lifecycle: Cell::new(Lifecycle::Uninitialized),
                flags: Cell::new(ViewFlags::empty()),
                tracker,
            });
            Ok(view)
        }
        .boxed_local()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

struct Fixture {
    runtime: Runtime,
    factory: Rc<TrackingFactory>,
    container: HostId,
}

fn setup(policy: UpdatePolicy) -> Fixture {
    init_tracing();
    host::reset_document();
    model::reset_models();

    let factory = Rc::new(TrackingFactory::default());
    let runtime = Runtime::with_factory(
        ViewConfig::default().with_update_policy(policy),
        factory.clone(),
    );
    Fixture {
        runtime,
        factory,
        container: host::create_element("body"),
    }
}

fn leaf(content: &str) -> ModelId {
    model::create_text(TextProps {
        content: content.into(),
        ..Default::default()
    })
}

fn row(children: Vec<Child>) -> ModelId {
    model::create_element(ElementProps {
        children,
        ..Default::default()
    })
}

fn element(view: &AnyView) -> &ElementView {
    downcast_view::<ElementView>(view).expect("root is an element view")
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn test_host_order_follows_children() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let root = row(vec!["1".into(), a.into(), "2".into(), b.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    assert_eq!(host::text_content(fx.container), "1A2B");

    model::set_children(root, vec![b.into(), "3".into(), a.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(host::text_content(fx.container), "B3A");
    assert_eq!(render_plain(fx.container), "B3A");
    assert!(handle.is_idle());
}

#[test]
fn test_reorder_relocates_without_rebuilding() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let c = leaf("C");
    let root = row(vec![a.into(), b.into(), c.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let view = element(handle.root());
    let before: Vec<AnyView> = [a, b, c].iter().map(|&m| view.child_view(m).unwrap()).collect();

    model::set_children(root, vec![c.into(), a.into(), b.into()]).unwrap();
    let report = fx.runtime.run_until(view.update_children()).unwrap();
    fx.runtime.tick();

    assert_eq!(report.created, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.relocated, 3);
    assert_eq!(host::text_content(fx.container), "CAB");
    for (model, old) in [a, b, c].iter().zip(&before) {
        assert!(Rc::ptr_eq(&view.child_view(*model).unwrap(), old));
        let counts = fx.factory.tracker.get(*model);
        assert_eq!(counts.created, 1);
        assert_eq!(counts.rendered, 1);
        assert_eq!(counts.removed, 0);
    }
}

#[test]
fn test_literal_text_is_recreated() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let root = row(vec!["x".into(), a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let old_text = element(handle.root()).text_nodes();
    assert_eq!(old_text.len(), 1);

    model::set_children(root, vec!["y".into(), a.into()]).unwrap();
    fx.runtime.tick();

    let new_text = element(handle.root()).text_nodes();
    assert!(!host::is_alive(old_text[0]));
    assert_ne!(old_text, new_text);
    assert_eq!(host::text_content(fx.container), "yA");
}

#[test]
fn test_unmount_disposes_every_view() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let inner = row(vec!["in".into(), b.into()]);
    let root = row(vec![a.into(), inner.into(), "out".into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let root_view = handle.root().clone();
    let inner_view = element(&root_view).child_view(inner).unwrap();

    handle.unmount().unwrap();

    assert!(root_view.is_removed());
    assert!(inner_view.is_removed());
    assert!(root_view.children().is_empty());
    assert!(inner_view.children().is_empty());
    assert_eq!(fx.factory.tracker.get(a).removed, 1);
    assert_eq!(fx.factory.tracker.get(b).removed, 1);
    // Only the container is left
    assert_eq!(host::node_count(), 1);
    assert_eq!(host::to_markup(fx.container), "<body></body>");
}

#[test]
fn test_style_change_replaces_previous_style() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let root = model::create_element(ElementProps {
        style: Styles::new().with("color", "red").with("width", "10"),
        children: vec![a.into()],
        ..Default::default()
    });

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let el = handle.root().el();
    assert_eq!(host::style_property(el, "color").as_deref(), Some("red"));

    model::set_style(root, Styles::new().with("background", "blue").without("color")).unwrap();
    fx.runtime.tick();

    let style = host::style(el);
    assert_eq!(style.len(), 1);
    assert_eq!(style.get("background").map(String::as_str), Some("blue"));
    // Children untouched
    assert_eq!(fx.factory.tracker.get(a).rendered, 1);
    assert_eq!(host::text_content(fx.container), "A");
}

#[test]
fn test_hello_then_drop_reference() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("world");
    let root = row(vec!["hello".into(), a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let el = handle.root().el();
    let kids = host::children(el);
    assert_eq!(kids.len(), 2);
    assert_eq!(host::text(kids[0]).as_deref(), Some("hello"));
    assert_eq!(kids[1], element(handle.root()).child_view(a).unwrap().el());

    model::set_children(root, vec!["hello".into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(element(handle.root()).child_count(), 0);
    assert_eq!(fx.factory.tracker.get(a).removed, 1);
    assert_eq!(host::to_markup(fx.container), "<body><div>hello</div></body>");
}

#[test]
fn test_new_child_is_rendered_once() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let root = row(vec![a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    model::set_children(root, vec![b.into(), a.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(fx.factory.tracker.get(b).created, 1);
    assert_eq!(fx.factory.tracker.get(b).rendered, 1);
    assert_eq!(fx.factory.tracker.get(a).rendered, 1);
    assert_eq!(fx.factory.tracker.get(a).after_render, 2);
    assert_eq!(host::text_content(fx.container), "BA");
    assert!(handle.root().has_finished());
}

#[test]
fn test_duplicate_reference_builds_one_view() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let root = row(vec![]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    model::set_children(root, vec![a.into(), "-".into(), a.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(element(handle.root()).child_count(), 1);
    assert_eq!(fx.factory.tracker.get(a).created, 1);
    assert_eq!(fx.factory.tracker.get(a).rendered, 1);
    // Last append wins
    assert_eq!(host::text_content(fx.container), "-A");
}

#[test]
fn test_removal_during_pending_build_disposes_late_views() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let slow = leaf("slow");
    let root = row(vec![a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let root_view = handle.root().clone();
    let release = fx.factory.gate(slow);

    model::set_children(root, vec![a.into(), slow.into()]).unwrap();
    fx.runtime.tick();
    assert_eq!(fx.factory.tracker.get(slow).created, 0);
    assert!(element(&root_view).is_updating());

    handle.unmount().unwrap();
    release.send(()).unwrap();
    fx.runtime.tick();

    let slow_counts = fx.factory.tracker.get(slow);
    assert_eq!(slow_counts.created, 1);
    assert_eq!(slow_counts.rendered, 0);
    assert_eq!(slow_counts.removed, 1);
    assert_eq!(element(&root_view).child_count(), 0);
    assert_eq!(root_view.lifecycle(), Lifecycle::Removed);
    assert!(fx.runtime.take_errors().is_empty());
    assert_eq!(host::node_count(), 1);
}

#[test]
fn test_serialized_updates_coalesce() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let c = leaf("C");
    let root = row(vec![a.into()]);

    fx.runtime.mount(root, fx.container).unwrap();
    model::set_children(root, vec![a.into(), b.into()]).unwrap();
    model::set_children(root, vec![c.into(), a.into()]).unwrap();
    model::set_children(root, vec![a.into(), c.into()]).unwrap();
    fx.runtime.tick();

    // One pass plus one follow-up, both seeing the latest children
    assert_eq!(fx.factory.tracker.get(a).after_render, 3);
    assert_eq!(fx.factory.tracker.get(b).created, 0);
    assert_eq!(fx.factory.tracker.get(c).created, 1);
    assert_eq!(host::text_content(fx.container), "AC");
}

#[test]
fn test_concurrent_policy_runs_every_pass() {
    let mut fx = setup(UpdatePolicy::Concurrent);
    let a = leaf("A");
    let c = leaf("C");
    let root = row(vec![a.into()]);

    fx.runtime.mount(root, fx.container).unwrap();
    model::set_children(root, vec![c.into(), a.into()]).unwrap();
    model::set_children(root, vec![a.into(), c.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(fx.factory.tracker.get(a).after_render, 3);
    assert_eq!(fx.factory.tracker.get(c).created, 1);
    assert_eq!(host::text_content(fx.container), "AC");
}

#[test]
fn test_placement_override_keeps_ownership() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let elsewhere = host::create_element("aside");
    let floating = model::create_text(TextProps {
        content: "F".into(),
        render_into: Some(elsewhere),
    });
    let root = row(vec!["t".into(), floating.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let floating_view = element(handle.root()).child_view(floating).unwrap();

    assert_eq!(host::to_markup(fx.container), "<body><div>t</div></body>");
    assert_eq!(host::to_markup(elsewhere), "<aside>F</aside>");
    assert_eq!(floating_view.parent().unwrap().model_id(), root);

    model::set_children(root, vec![floating.into(), "u".into()]).unwrap();
    fx.runtime.tick();
    assert_eq!(host::to_markup(elsewhere), "<aside>F</aside>");
    assert_eq!(host::to_markup(fx.container), "<body><div>u</div></body>");

    handle.unmount().unwrap();
    assert!(floating_view.is_removed());
    assert_eq!(host::to_markup(elsewhere), "<aside></aside>");
}

#[test]
fn test_failed_build_leaves_content_intact() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let ok = leaf("ok");
    let broken = leaf("broken");
    let root = row(vec!["x".into(), a.into()]);
    fx.factory.fail(broken);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    model::set_children(root, vec!["y".into(), ok.into(), broken.into(), a.into()]).unwrap();
    fx.runtime.tick();

    let errors = fx.runtime.take_errors();
    assert_eq!(
        errors,
        vec![ViewError::Materialize {
            model: broken,
            reason: "held failure".into(),
        }]
    );
    assert_eq!(host::text_content(fx.container), "xA");
    assert_eq!(fx.factory.tracker.get(ok).removed, fx.factory.tracker.get(ok).created);
    assert_eq!(fx.factory.tracker.get(a).removed, 0);
    assert_eq!(element(handle.root()).child_count(), 1);
}

#[test]
fn test_nested_elements_update_independently() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let b = leaf("B");
    let inner = row(vec![a.into()]);
    let root = row(vec![inner.into(), "|".into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let inner_view = element(handle.root()).child_view(inner).unwrap();

    model::set_children(inner, vec![b.into(), a.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(host::text_content(fx.container), "BA|");
    assert!(Rc::ptr_eq(
        &element(handle.root()).child_view(inner).unwrap(),
        &inner_view
    ));
    assert_eq!(fx.factory.tracker.get(a).rendered, 1);
    assert!(handle.is_idle());
}

#[test]
fn test_idle_waits_for_follow_up_pass() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let a = leaf("A");
    let s1 = leaf("S1");
    let s2 = leaf("S2");
    let root = row(vec![a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let release_s1 = fx.factory.gate(s1);
    let release_s2 = fx.factory.gate(s2);

    model::set_children(root, vec![a.into(), s1.into()]).unwrap();
    fx.runtime.tick();
    model::set_children(root, vec![a.into(), s2.into()]).unwrap();

    // First pass ends, the merged follow-up is now waiting on s2
    release_s1.send(()).unwrap();
    fx.runtime.tick();
    assert!(element(handle.root()).is_updating());
    assert!(!handle.is_idle());
    assert_eq!(host::text_content(fx.container), "A");

    release_s2.send(()).unwrap();
    fx.runtime.tick();
    assert!(!element(handle.root()).is_updating());
    assert!(handle.is_idle());
    assert_eq!(host::text_content(fx.container), "AS2");
    assert_eq!(fx.factory.tracker.get(s1).created, 1);
    assert_eq!(fx.factory.tracker.get(s1).removed, 1);
    assert_eq!(fx.factory.tracker.get(s2).rendered, 1);
    assert!(fx.runtime.take_errors().is_empty());
}

#[test]
fn test_released_placement_target_skips_only_that_child() {
    let mut fx = setup(UpdatePolicy::Serialized);
    let elsewhere = host::create_element("aside");
    let floating = model::create_text(TextProps {
        content: "F".into(),
        render_into: Some(elsewhere),
    });
    let a = leaf("A");
    let root = row(vec!["t".into(), floating.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let floating_view = element(handle.root()).child_view(floating).unwrap();
    host::release(elsewhere);

    model::set_children(root, vec![floating.into(), "u".into(), a.into()]).unwrap();
    fx.runtime.tick();

    assert_eq!(host::text_content(fx.container), "uA");
    assert!(fx.runtime.take_errors().is_empty());
    assert!(handle.is_idle());
    assert!(!floating_view.is_removed());
    assert_eq!(element(handle.root()).child_count(), 2);

    let report = fx
        .runtime
        .run_until(element(handle.root()).update_children())
        .unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.relocated, 1);
    assert_eq!(host::text_content(fx.container), "uA");

    // A full render skips it the same way
    handle.root().render().unwrap();
    assert_eq!(host::text_content(fx.container), "uA");
    assert_eq!(fx.factory.tracker.get(a).rendered, 2);
}

#[test]
fn test_concurrent_late_pass_drops_removed_model() {
    let mut fx = setup(UpdatePolicy::Concurrent);
    let a = leaf("A");
    let s1 = leaf("S1");
    let root = row(vec![a.into()]);

    let handle = fx.runtime.mount(root, fx.container).unwrap();
    let release = fx.factory.gate(s1);

    model::set_children(root, vec![a.into(), s1.into()]).unwrap();
    fx.runtime.tick();
    model::set_children(root, vec![a.into()]).unwrap();
    fx.runtime.tick();
    // The first pass is still waiting on s1
    assert!(!handle.is_idle());

    release.send(()).unwrap();
    fx.runtime.tick();

    let counts = fx.factory.tracker.get(s1);
    assert_eq!(counts.created, 1);
    assert_eq!(counts.rendered, 0);
    assert_eq!(counts.removed, 1);
    assert_eq!(element(handle.root()).child_count(), 1);
    assert!(element(handle.root()).child_view(s1).is_none());
    assert_eq!(host::text_content(fx.container), "A");
    assert!(handle.is_idle());
}
