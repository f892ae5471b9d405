//! Text View - leaf view over a single host text node.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::{self, FutureExt, LocalBoxFuture};
use spark_signals::effect;

use super::{AnyView, BuildOptions, Lifecycle, View, ViewContext, ViewFlags, ensure_ready};
use crate::error::ViewError;
use crate::host::{self, HostId, RenderingTarget};
use crate::model::TextModel;
use crate::types::ModelId;

pub struct TextView {
    model_id: ModelId,
    model: TextModel,
    el: HostId,
    parent: Option<Weak<dyn View>>,
    context: Rc<ViewContext>,
    lifecycle: Cell<Lifecycle>,
    flags: Cell<ViewFlags>,
    stop_effect: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl TextView {
    pub fn new(model_id: ModelId, model: TextModel, options: BuildOptions) -> Rc<Self> {
        let el = host::create_text(&model.content.get());
        Rc::new(Self {
            model_id,
            model,
            el,
            parent: options.parent,
            context: options.context,
            lifecycle: Cell::new(Lifecycle::Uninitialized),
            flags: Cell::new(ViewFlags::empty()),
            stop_effect: RefCell::new(None),
        })
    }
}

impl View for TextView {
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
        let result = match self.lifecycle.get() {
            Lifecycle::Uninitialized => {
                self.lifecycle.set(Lifecycle::Ready);
                Ok(())
            }
            state => Err(ViewError::InvalidState {
                model: self.model_id,
                operation: "initialize",
                state,
            }),
        };
        future::ready(result).boxed_local()
    }

    fn connect_signals(&self) {
        if self.is_removed() || self.flags().contains(ViewFlags::SIGNALS_CONNECTED) {
            return;
        }
        self.insert_flags(ViewFlags::SIGNALS_CONNECTED);

        // The host node is a plain handle; writing to a released one is a no-op
        let content = self.model.content.clone();
        let el = self.el;
        let stop = effect(move || {
            host::set_text(el, &content.get());
        });
        *self.stop_effect.borrow_mut() = Some(Box::new(stop));
    }

    fn render(&self) -> Result<(), ViewError> {
        ensure_ready(self)?;
        host::set_text(self.el, &self.model.content.get());
        self.finish();
        Ok(())
    }

    fn remove(&self) -> Result<(), ViewError> {
        if self.lifecycle.replace(Lifecycle::Removed) == Lifecycle::Removed {
            return Ok(());
        }
        if let Some(stop) = self.stop_effect.borrow_mut().take() {
            stop();
        }
        host::release(self.el);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::host::reset_document;
    use crate::model::{TextProps, create_text, reset_models, set_text};
    use crate::view::{DefaultFactory, build_view};
    use futures::executor::{LocalPool, block_on};

    #[test]
    fn test_content_follows_model() {
        reset_document();
        reset_models();
        let pool = LocalPool::new();
        let context = Rc::new(ViewContext::new(
            pool.spawner(),
            Rc::new(DefaultFactory),
            ViewConfig::default(),
        ));
        let model = create_text(TextProps {
            content: "one".into(),
            ..Default::default()
        });

        let view = block_on(build_view(model, BuildOptions::root(context))).unwrap();
        view.render().unwrap();
        assert_eq!(host::text(view.el()).as_deref(), Some("one"));

        set_text(model, "two").unwrap();
        assert_eq!(host::text(view.el()).as_deref(), Some("two"));

        view.remove().unwrap();
        set_text(model, "three").unwrap();
        assert!(!host::is_alive(view.el()));
    }
}
