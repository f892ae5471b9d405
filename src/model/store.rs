//! Model Store - handle allocation for models.
//!
//! Manages the lifecycle of model handles:
//! - Slot arena with free list for O(1) reuse
//! - Generation counter per slot, bumped on destroy
//! - Signal handles cloned out before writing, so effects triggered by a
//!   write may read the store again

use std::cell::RefCell;

use super::{ElementModel, ElementProps, Model, TextModel, TextProps};
use crate::error::ViewError;
use crate::types::{Child, ModelId, Styles};

// =============================================================================
// Store State
// =============================================================================

#[derive(Default)]
struct Slot {
    generation: u32,
    model: Option<Model>,
}

thread_local! {
    /// Model slots, indexed by `ModelId::index`.
    static SLOTS: RefCell<Vec<Slot>> = RefCell::new(Vec::new());

    /// Pool of freed slot indices for reuse.
    static FREE_SLOTS: RefCell<Vec<u32>> = RefCell::new(Vec::new());
}

fn insert(model: Model) -> ModelId {
    let reused = FREE_SLOTS.with(|free| free.borrow_mut().pop());
    SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        match reused {
            Some(index) => {
                let slot = &mut slots[index as usize];
                slot.model = Some(model);
                ModelId::new(index, slot.generation)
            }
            None => {
                let index = slots.len() as u32;
                slots.push(Slot {
                    generation: 0,
                    model: Some(model),
                });
                ModelId::new(index, 0)
            }
        }
    })
}

// =============================================================================
// Creation
// =============================================================================

/// Create an element model and return its handle.
pub fn create_element(props: ElementProps) -> ModelId {
    insert(Model::Element(ElementModel::from_props(props)))
}

/// Create a text model and return its handle.
pub fn create_text(props: TextProps) -> ModelId {
    insert(Model::Text(TextModel::from_props(props)))
}

/// Destroy a model. Its handle, and every copy of it, goes stale.
///
/// Returns false if the handle was already stale. Views built from the model
/// keep their signal handles until they are removed.
pub fn destroy_model(id: ModelId) -> bool {
    let destroyed = SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        match slots.get_mut(id.index()) {
            Some(slot) if slot.generation == id.generation() && slot.model.is_some() => {
                slot.model = None;
                slot.generation = slot.generation.wrapping_add(1);
                true
            }
            _ => false,
        }
    });
    if destroyed {
        FREE_SLOTS.with(|free| free.borrow_mut().push(id.index() as u32));
    }
    destroyed
}

// =============================================================================
// Lookups
// =============================================================================

/// Get a model by handle. Cheap: signals are shared, not copied.
pub fn get_model(id: ModelId) -> Option<Model> {
    SLOTS.with(|slots| {
        let slots = slots.borrow();
        let slot = slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.model.clone()
    })
}

pub fn is_alive(id: ModelId) -> bool {
    get_model(id).is_some()
}

/// Get an element model, failing for stale handles and text models.
pub fn element_model(id: ModelId) -> Result<ElementModel, ViewError> {
    match get_model(id) {
        Some(Model::Element(model)) => Ok(model),
        Some(_) => Err(ViewError::KindMismatch {
            model: id,
            expected: "element",
        }),
        None => Err(ViewError::UnknownModel(id)),
    }
}

/// Get a text model, failing for stale handles and element models.
pub fn text_model(id: ModelId) -> Result<TextModel, ViewError> {
    match get_model(id) {
        Some(Model::Text(model)) => Ok(model),
        Some(_) => Err(ViewError::KindMismatch {
            model: id,
            expected: "text",
        }),
        None => Err(ViewError::UnknownModel(id)),
    }
}

/// Count of live models.
pub fn model_count() -> usize {
    SLOTS.with(|slots| slots.borrow().iter().filter(|s| s.model.is_some()).count())
}

// =============================================================================
// Attribute writes
// =============================================================================

/// Replace an element's children. Notifies views subscribed to `children`.
pub fn set_children(id: ModelId, children: Vec<Child>) -> Result<(), ViewError> {
    let model = element_model(id)?;
    model.children.set(children);
    Ok(())
}

/// Replace an element's style. Notifies views subscribed to `style`.
pub fn set_style(id: ModelId, style: Styles) -> Result<(), ViewError> {
    let model = element_model(id)?;
    model.style.set(style);
    Ok(())
}

/// Replace a text model's content.
pub fn set_text(id: ModelId, content: impl Into<String>) -> Result<(), ViewError> {
    let model = text_model(id)?;
    model.content.set(content.into());
    Ok(())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every model (for testing).
pub fn reset_models() {
    SLOTS.with(|slots| slots.borrow_mut().clear());
    FREE_SLOTS.with(|free| free.borrow_mut().clear());
}
