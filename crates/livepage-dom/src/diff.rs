//! Structural diff between a live DOM subtree and a detached proposal.
//!
//! Children are walked pairwise. Two nodes are the "same" when they have the
//! same kind and, for elements, the same tag and `id`. Same nodes are patched
//! in place (attributes, text, then their children); a one-step lookahead
//! turns single insertions and removals into [`Patch::Insert`] and
//! [`Patch::Remove`] so that the following siblings keep their identity.
//! Anything else is replaced.
//!
//! Only the children of the live root are diffed: the root's own attributes
//! belong to the host page and are left alone.

use std::collections::BTreeMap;

use crate::live::{DomError, LiveDom, NodeShape};
use crate::vnode::{VElement, VNode};

/// A single DOM mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch<N> {
    /// Set (add or change) an attribute.
    SetAttribute {
        /// Target element.
        node: N,
        /// Attribute name.
        name: String,
        /// New value.
        value: String,
    },
    /// Remove an attribute.
    RemoveAttribute {
        /// Target element.
        node: N,
        /// Attribute name.
        name: String,
    },
    /// Change the content of a text or comment node.
    SetText {
        /// Target node.
        node: N,
        /// New content.
        text: String,
    },
    /// Insert a new subtree before `before`, or append when `None`.
    Insert {
        /// Parent element.
        parent: N,
        /// Sibling to insert before.
        before: Option<N>,
        /// Subtree to create.
        node: VNode,
    },
    /// Remove a child.
    Remove {
        /// Parent element.
        parent: N,
        /// Child to remove.
        node: N,
    },
    /// Replace a child with a new subtree.
    Replace {
        /// Parent element.
        parent: N,
        /// Child to replace.
        old: N,
        /// Subtree to create in its place.
        node: VNode,
    },
}

/// Compute the patches converging the children of `live` to `proposed`'s.
pub fn diff<D: LiveDom>(dom: &D, live: &D::Node, proposed: &VElement) -> Vec<Patch<D::Node>> {
    let mut patches = Vec::new();
    diff_children(dom, live, &proposed.children, &mut patches);
    tracing::debug!(patches = patches.len(), "Computed DOM diff");
    patches
}

/// Apply `patches` in order.
///
/// # Errors
///
/// Returns the first [`DomError`] reported by the DOM. Patches before the
/// failing one stay applied.
pub fn apply<D: LiveDom>(dom: &mut D, patches: Vec<Patch<D::Node>>) -> Result<(), DomError> {
    for patch in patches {
        match patch {
            Patch::SetAttribute { node, name, value } => dom.set_attribute(&node, &name, &value)?,
            Patch::RemoveAttribute { node, name } => dom.remove_attribute(&node, &name)?,
            Patch::SetText { node, text } => dom.set_text(&node, &text)?,
            Patch::Insert {
                parent,
                before,
                node,
            } => {
                let created = dom.create_child(&parent, &node)?;
                dom.insert_before(&parent, &created, before.as_ref())?;
            }
            Patch::Remove { parent, node } => dom.remove_child(&parent, &node)?,
            Patch::Replace { parent, old, node } => {
                let created = dom.create_child(&parent, &node)?;
                dom.replace_child(&parent, &created, &old)?;
            }
        }
    }
    Ok(())
}

fn is_same(shape: &NodeShape, proposed: &VNode) -> bool {
    match (shape, proposed) {
        (NodeShape::Element { tag, attributes }, VNode::Element(element)) => {
            *tag == element.tag && attributes.get("id") == element.attributes.get("id")
        }
        (NodeShape::Text(_), VNode::Text(_)) | (NodeShape::Comment(_), VNode::Comment(_)) => true,
        _ => false,
    }
}

fn diff_children<D: LiveDom>(
    dom: &D,
    parent: &D::Node,
    proposed: &[VNode],
    patches: &mut Vec<Patch<D::Node>>,
) {
    let live = dom.children(parent);
    let shapes: Vec<NodeShape> = live.iter().map(|child| dom.shape(child)).collect();

    let (mut i, mut j) = (0, 0);
    while i < live.len() && j < proposed.len() {
        if is_same(&shapes[i], &proposed[j]) {
            diff_node(dom, &live[i], &shapes[i], &proposed[j], patches);
            i += 1;
            j += 1;
        } else if j + 1 < proposed.len() && is_same(&shapes[i], &proposed[j + 1]) {
            patches.push(Patch::Insert {
                parent: parent.clone(),
                before: Some(live[i].clone()),
                node: proposed[j].clone(),
            });
            j += 1;
        } else if i + 1 < live.len() && is_same(&shapes[i + 1], &proposed[j]) {
            patches.push(Patch::Remove {
                parent: parent.clone(),
                node: live[i].clone(),
            });
            i += 1;
        } else {
            patches.push(Patch::Replace {
                parent: parent.clone(),
                old: live[i].clone(),
                node: proposed[j].clone(),
            });
            i += 1;
            j += 1;
        }
    }

    for node in &live[i..] {
        patches.push(Patch::Remove {
            parent: parent.clone(),
            node: node.clone(),
        });
    }
    for node in &proposed[j..] {
        patches.push(Patch::Insert {
            parent: parent.clone(),
            before: None,
            node: node.clone(),
        });
    }
}

fn diff_node<D: LiveDom>(
    dom: &D,
    node: &D::Node,
    shape: &NodeShape,
    proposed: &VNode,
    patches: &mut Vec<Patch<D::Node>>,
) {
    match (shape, proposed) {
        (NodeShape::Element { attributes, .. }, VNode::Element(element)) => {
            diff_attributes(node, attributes, &element.attributes, patches);
            diff_children(dom, node, &element.children, patches);
        }
        (NodeShape::Text(current), VNode::Text(text))
        | (NodeShape::Comment(current), VNode::Comment(text)) => {
            if current != text {
                patches.push(Patch::SetText {
                    node: node.clone(),
                    text: text.clone(),
                });
            }
        }
        _ => {}
    }
}

fn diff_attributes<N: Clone>(
    node: &N,
    current: &BTreeMap<String, String>,
    proposed: &BTreeMap<String, String>,
    patches: &mut Vec<Patch<N>>,
) {
    for name in current.keys().filter(|name| !proposed.contains_key(*name)) {
        patches.push(Patch::RemoveAttribute {
            node: node.clone(),
            name: name.clone(),
        });
    }
    for (name, value) in proposed {
        if current.get(name) != Some(value) {
            patches.push(Patch::SetAttribute {
                node: node.clone(),
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
}
