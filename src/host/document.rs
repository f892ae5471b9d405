//! Host document - arena of host elements and text nodes.
//!
//! Nodes are slots in a thread-local arena addressed by generational
//! [`HostId`]s:
//! - Free slot pool for O(1) reuse
//! - Generation bump on release, so stale handles read as dead
//! - Append relocates: appending an attached node first detaches it
//!
//! Ownership is explicit. Detaching never frees a node; only [`release`] does,
//! and the caller that created a node is the one that releases it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::HostError;

// =============================================================================
// Handles and nodes
// =============================================================================

/// Handle to a node in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId {
    index: u32,
    generation: u32,
}

impl HostId {
    pub const fn index(self) -> usize {
        self.index as usize
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        style: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<HostId>,
    children: Vec<HostId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Default)]
struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Document {
    fn get(&self, id: HostId) -> Option<&Node> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: HostId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn insert(&mut self, kind: NodeKind) -> HostId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return HostId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        HostId {
            index,
            generation: 0,
        }
    }

    fn detach(&mut self, id: HostId) {
        let Some(parent) = self.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|&c| c != id);
        }
    }

    fn is_ancestor(&self, ancestor: HostId, mut node: HostId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }
}

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::default());
}

fn with_doc<R>(f: impl FnOnce(&Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&doc.borrow()))
}

fn with_doc_mut<R>(f: impl FnOnce(&mut Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&mut doc.borrow_mut()))
}

// =============================================================================
// Creation and release
// =============================================================================

/// Create a detached element node.
pub fn create_element(tag: &str) -> HostId {
    with_doc_mut(|doc| {
        doc.insert(NodeKind::Element {
            tag: tag.to_string(),
            style: BTreeMap::new(),
        })
    })
}

/// Create a detached text node.
pub fn create_text(content: &str) -> HostId {
    with_doc_mut(|doc| doc.insert(NodeKind::Text(content.to_string())))
}

/// Detach and free a node. Its children are detached, not freed.
///
/// Releasing a dead handle is a no-op.
pub fn release(id: HostId) {
    with_doc_mut(|doc| {
        if doc.get(id).is_none() {
            return;
        }
        doc.detach(id);
        let children = doc
            .get_mut(id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in children {
            if let Some(child) = doc.get_mut(child) {
                child.parent = None;
            }
        }
        let slot = &mut doc.slots[id.index()];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        doc.free.push(id.index);
        doc.live -= 1;
    })
}

pub fn is_alive(id: HostId) -> bool {
    with_doc(|doc| doc.get(id).is_some())
}

/// Number of live nodes in the document.
pub fn node_count() -> usize {
    with_doc(|doc| doc.live)
}

// =============================================================================
// Tree structure
// =============================================================================

/// Append `child` as the last child of `parent`.
///
/// An attached `child` is moved, never duplicated. Appending a node that is
/// already the last child leaves the tree unchanged.
pub fn append_child(parent: HostId, child: HostId) -> Result<(), HostError> {
    with_doc_mut(|doc| {
        match doc.get(parent).map(|n| &n.kind) {
            None => return Err(HostError::DeadNode(parent)),
            Some(NodeKind::Text(_)) => return Err(HostError::NotAContainer(parent)),
            Some(NodeKind::Element { .. }) => {}
        }
        if doc.get(child).is_none() {
            return Err(HostError::DeadNode(child));
        }
        if doc.is_ancestor(child, parent) {
            return Err(HostError::Cycle { parent, child });
        }
        doc.detach(child);
        if let Some(node) = doc.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = doc.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    })
}

/// Remove a node from its parent without freeing it.
pub fn detach(id: HostId) {
    with_doc_mut(|doc| doc.detach(id))
}

/// Detach every child of `id`.
pub fn empty(id: HostId) {
    with_doc_mut(|doc| {
        let children = doc
            .get_mut(id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in children {
            if let Some(child) = doc.get_mut(child) {
                child.parent = None;
            }
        }
    })
}

pub fn parent(id: HostId) -> Option<HostId> {
    with_doc(|doc| doc.get(id).and_then(|n| n.parent))
}

pub fn children(id: HostId) -> Vec<HostId> {
    with_doc(|doc| doc.get(id).map(|n| n.children.clone()).unwrap_or_default())
}

/// Topmost ancestor of `id` (itself when detached).
pub fn root_of(mut id: HostId) -> HostId {
    while let Some(parent) = parent(id) {
        id = parent;
    }
    id
}

// =============================================================================
// Node data
// =============================================================================

/// Tag name of an element, `None` for text or dead nodes.
pub fn tag(id: HostId) -> Option<String> {
    with_doc(|doc| match doc.get(id).map(|n| &n.kind) {
        Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
        _ => None,
    })
}

/// Content of a text node, `None` for elements or dead nodes.
pub fn text(id: HostId) -> Option<String> {
    with_doc(|doc| match doc.get(id).map(|n| &n.kind) {
        Some(NodeKind::Text(content)) => Some(content.clone()),
        _ => None,
    })
}

pub fn is_text(id: HostId) -> bool {
    with_doc(|doc| matches!(doc.get(id).map(|n| &n.kind), Some(NodeKind::Text(_))))
}

/// Replace the content of a text node. No-op for elements.
pub fn set_text(id: HostId, content: &str) {
    with_doc_mut(|doc| {
        if let Some(Node {
            kind: NodeKind::Text(current),
            ..
        }) = doc.get_mut(id)
        {
            *current = content.to_string();
        }
    })
}

/// Concatenated text of a subtree, in document order.
pub fn text_content(id: HostId) -> String {
    let mut out = String::new();
    with_doc(|doc| collect_text(doc, id, &mut out));
    out
}

fn collect_text(doc: &Document, id: HostId, out: &mut String) {
    let Some(node) = doc.get(id) else { return };
    match &node.kind {
        NodeKind::Text(content) => out.push_str(content),
        NodeKind::Element { .. } => {
            for &child in &node.children {
                collect_text(doc, child, out);
            }
        }
    }
}

// =============================================================================
// Inline style
// =============================================================================

pub fn set_style_property(id: HostId, name: &str, value: &str) {
    with_doc_mut(|doc| {
        if let Some(Node {
            kind: NodeKind::Element { style, .. },
            ..
        }) = doc.get_mut(id)
        {
            style.insert(name.to_string(), value.to_string());
        }
    })
}

pub fn remove_style_property(id: HostId, name: &str) {
    with_doc_mut(|doc| {
        if let Some(Node {
            kind: NodeKind::Element { style, .. },
            ..
        }) = doc.get_mut(id)
        {
            style.remove(name);
        }
    })
}

/// Drop the whole inline style of an element.
pub fn clear_style(id: HostId) {
    with_doc_mut(|doc| {
        if let Some(Node {
            kind: NodeKind::Element { style, .. },
            ..
        }) = doc.get_mut(id)
        {
            style.clear();
        }
    })
}

/// Inline style of an element (empty for text or dead nodes).
pub fn style(id: HostId) -> BTreeMap<String, String> {
    with_doc(|doc| match doc.get(id).map(|n| &n.kind) {
        Some(NodeKind::Element { style, .. }) => style.clone(),
        _ => BTreeMap::new(),
    })
}

pub fn style_property(id: HostId, name: &str) -> Option<String> {
    with_doc(|doc| match doc.get(id).map(|n| &n.kind) {
        Some(NodeKind::Element { style, .. }) => style.get(name).cloned(),
        _ => None,
    })
}

// =============================================================================
// Markup
// =============================================================================

/// Serialize a subtree as HTML-like markup.
///
/// ```text
/// <div style="color: red">hello<span></span></div>
/// ```
pub fn to_markup(id: HostId) -> String {
    let mut out = String::new();
    with_doc(|doc| write_markup(doc, id, &mut out));
    out
}

fn write_markup(doc: &Document, id: HostId, out: &mut String) {
    let Some(node) = doc.get(id) else { return };
    match &node.kind {
        NodeKind::Text(content) => escape_into(content, out),
        NodeKind::Element { tag, style } => {
            out.push('<');
            out.push_str(tag);
            if !style.is_empty() {
                let inline = style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                let _ = write!(out, " style=\"{inline}\"");
            }
            out.push('>');
            for &child in &node.children {
                write_markup(doc, child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every node (for testing).
pub fn reset_document() {
    with_doc_mut(|doc| *doc = Document::default());
}
