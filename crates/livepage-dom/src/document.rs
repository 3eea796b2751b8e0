//! In-memory DOM.
//!
//! [`Document`] is an arena of nodes addressed by generational [`NodeId`]s.
//! Removing a node frees its whole subtree; a stale [`NodeId`] never aliases
//! a node created later, so "is this still the same node" checks are exact.

use std::collections::BTreeMap;
use std::fmt;

use crate::live::{DomError, LiveDom, NodeShape};
use crate::raw_text;
use crate::vnode::{self, VNode, parse_fragment};

/// Handle to a node of a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
enum NodeKind {
    Root,
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Arena-backed mutable DOM.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                data: Some(NodeData {
                    kind: NodeKind::Root,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
        }
    }

    /// Parse an HTML document or fragment.
    ///
    /// # Errors
    ///
    /// Returns the `tl` parse error if the input cannot be tokenized.
    pub fn parse(html: &str) -> Result<Self, tl::ParseError> {
        let mut document = Self::new();
        let root = document.root();
        for node in parse_fragment(html)? {
            let id = document.build(&node);
            document.attach(root, id, None);
        }
        Ok(document)
    }

    /// The root node (parent of top-level nodes).
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: self.slots[0].generation,
        }
    }

    /// Parent of `node`, if it is attached to one.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|data| data.parent)
    }

    /// Returns true if `node` exists and is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = node;
        loop {
            if current == root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// First attached element whose `id` attribute equals `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(|kind| match kind {
            NodeKind::Element { attributes, .. } => {
                attributes.get("id").is_some_and(|value| value == id)
            }
            _ => false,
        })
    }

    /// First attached element with tag `tag` (lowercase), in document order.
    #[must_use]
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        self.find(|kind| matches!(kind, NodeKind::Element { tag: t, .. } if t == tag))
    }

    /// Render the children of `node` as HTML.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(data) = self.get(node) {
            for child in &data.children {
                self.render_into(*child, &mut out);
            }
        }
        out
    }

    /// Render `node` itself as HTML.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.render_into(node, &mut out);
        out
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.data.is_some()).count()
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.slots
            .get(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn require(&self, node: NodeId) -> Result<&NodeData, DomError> {
        self.get(node)
            .ok_or_else(|| DomError::UnknownNode(node.to_string()))
    }

    fn require_mut(&mut self, node: NodeId) -> Result<&mut NodeData, DomError> {
        self.get_mut(node)
            .ok_or_else(|| DomError::UnknownNode(node.to_string()))
    }

    fn find(&self, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            let data = self.get(node)?;
            if predicate(&data.kind) {
                return Some(node);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        None
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.data = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    /// Build a detached subtree from `vnode`.
    fn build(&mut self, vnode: &VNode) -> NodeId {
        match vnode {
            VNode::Element(element) => {
                let id = self.allocate(NodeKind::Element {
                    tag: element.tag.clone(),
                    attributes: element.attributes.clone(),
                });
                for child in &element.children {
                    let child_id = self.build(child);
                    self.attach(id, child_id, None);
                }
                id
            }
            VNode::Text(text) => self.allocate(NodeKind::Text(text.clone())),
            VNode::Comment(body) => self.allocate(NodeKind::Comment(body.clone())),
        }
    }

    /// Link `child` under `parent` at the position of `reference` (or last).
    ///
    /// Both nodes must exist; callers check that beforehand.
    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<usize>) {
        if let Some(data) = self.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.get_mut(parent) {
            match reference {
                Some(position) => data.children.insert(position, child),
                None => data.children.push(child),
            }
        }
    }

    /// Unlink `child` from its parent without freeing it.
    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(data) = self.get_mut(parent) {
            data.children.retain(|c| *c != child);
        }
        if let Some(data) = self.get_mut(child) {
            data.parent = None;
        }
    }

    /// Free `node` and its whole subtree.
    fn release(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                stack.extend(data.children);
                self.free.push(current.index);
            }
        }
    }

    fn position_in(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.require(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| DomError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            })
    }

    fn render_into(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Root => {
                for child in &data.children {
                    self.render_into(*child, out);
                }
            }
            NodeKind::Element { tag, attributes } => {
                vnode::write_start_tag(out, tag, attributes.iter());
                if vnode::is_void_element(tag) {
                    return;
                }
                let verbatim = raw_text::is_raw_text_element(tag);
                for child in &data.children {
                    match self.get(*child).map(|data| &data.kind) {
                        Some(NodeKind::Text(text)) if verbatim => out.push_str(text),
                        _ => self.render_into(*child, out),
                    }
                }
                vnode::write_end_tag(out, tag);
            }
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::Comment(body) => vnode::write_comment(out, body),
        }
    }
}

impl LiveDom for Document {
    type Node = NodeId;

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.get(*node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn shape(&self, node: &NodeId) -> NodeShape {
        match self.get(*node).map(|data| &data.kind) {
            Some(NodeKind::Element { tag, attributes }) => NodeShape::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
            },
            Some(NodeKind::Text(text)) => NodeShape::Text(text.clone()),
            Some(NodeKind::Comment(body)) => NodeShape::Comment(body.clone()),
            Some(NodeKind::Root) | None => NodeShape::Other,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.require_mut(*node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.to_owned(), value.to_owned());
                Ok(())
            }
            _ => Err(DomError::NotAnElement(node.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
        match &mut self.require_mut(*node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.remove(name);
                Ok(())
            }
            _ => Err(DomError::NotAnElement(node.to_string())),
        }
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.require_mut(*node)?.kind {
            NodeKind::Text(content) | NodeKind::Comment(content) => {
                text.clone_into(content);
                Ok(())
            }
            _ => Err(DomError::Host(format!(
                "{node} is neither a text nor a comment node"
            ))),
        }
    }

    fn create(&mut self, vnode: &VNode) -> Result<NodeId, DomError> {
        Ok(self.build(vnode))
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        self.require(*parent)?;
        self.require(*child)?;
        if let Some(reference) = reference {
            self.position_in(*parent, *reference)?;
        }
        self.detach(*child);
        // Detaching may shift the reference when child was an earlier sibling.
        let position = reference
            .map(|reference| self.position_in(*parent, *reference))
            .transpose()?;
        self.attach(*parent, *child, position);
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.position_in(*parent, *child)?;
        self.detach(*child);
        self.release(*child);
        Ok(())
    }

    fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) -> Result<(), DomError> {
        self.require(*new)?;
        self.position_in(*parent, *old)?;
        self.detach(*new);
        let position = self.position_in(*parent, *old)?;
        if let Some(data) = self.get_mut(*parent) {
            data.children[position] = *new;
        }
        if let Some(data) = self.get_mut(*new) {
            data.parent = Some(*parent);
        }
        if let Some(data) = self.get_mut(*old) {
            data.parent = None;
        }
        self.release(*old);
        Ok(())
    }
}
