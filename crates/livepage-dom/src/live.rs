//! The mutable DOM seam.
//!
//! [`LiveDom`] is what the diff engine reads from and writes to. The
//! in-memory [`Document`](crate::Document) implements it for tests and the
//! headless mirror; the browser crate implements it over `web_sys::Node`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::vnode::VNode;

/// Read-only view of a live node, as needed by the diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeShape {
    /// Element with lowercase tag name and attributes.
    Element {
        /// Lowercase tag name.
        tag: String,
        /// Attributes by lowercase name.
        attributes: BTreeMap<String, String>,
    },
    /// Text node.
    Text(String),
    /// Comment node.
    Comment(String),
    /// Anything else (document, doctype, processing instruction).
    Other,
}

/// DOM operation error.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The node handle does not refer to a node of this DOM.
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    /// An element operation was applied to a non-element node.
    #[error("Not an element: {0}")]
    NotAnElement(String),
    /// The node is not a child of the given parent.
    #[error("Node {child} is not a child of {parent}")]
    NotAChild {
        /// Parent node description.
        parent: String,
        /// Child node description.
        child: String,
    },
    /// Error reported by the host DOM implementation.
    #[error("Host DOM error: {0}")]
    Host(String),
}

/// A mutable DOM the diff engine can converge.
///
/// Node handles are cheap to clone and compare by identity: two handles are
/// equal exactly when they refer to the same node.
pub trait LiveDom {
    /// Node handle.
    type Node: Clone + PartialEq + Debug;

    /// Children of `node` in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Shape of `node` (kind, tag, attributes or text).
    fn shape(&self, node: &Self::Node) -> NodeShape;

    /// Set attribute `name` on element `node`.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str)
    -> Result<(), DomError>;

    /// Remove attribute `name` from element `node`.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), DomError>;

    /// Replace the content of a text or comment node.
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// Build a detached node (and its subtree) from `vnode`.
    fn create(&mut self, vnode: &VNode) -> Result<Self::Node, DomError>;

    /// Build a detached node that will be inserted under `parent`.
    ///
    /// DOMs that place elements in namespaces override this to pick the
    /// namespace in effect under `parent`.
    fn create_child(&mut self, _parent: &Self::Node, vnode: &VNode) -> Result<Self::Node, DomError> {
        self.create(vnode)
    }

    /// Insert `child` into `parent` before `reference`, or append when
    /// `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Put `new` in place of `old` under `parent`.
    fn replace_child(
        &mut self,
        parent: &Self::Node,
        new: &Self::Node,
        old: &Self::Node,
    ) -> Result<(), DomError>;

    /// Value of attribute `name` on `node`, if `node` is an element that has it.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
        match self.shape(node) {
            NodeShape::Element { mut attributes, .. } => attributes.remove(name),
            _ => None,
        }
    }
}
