//! [`LiveDom`] over the browser DOM.

use std::collections::BTreeMap;

use livepage_client::{ClientError, ClientSettings, PageNodes};
use livepage_dom::{DomError, LiveDom, Namespace, NodeShape, VNode, attribute_namespace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node};

/// The page's live DOM.
pub(crate) struct BrowserDom {
    document: Document,
}

impl BrowserDom {
    pub(crate) fn new(document: Document) -> Self {
        Self { document }
    }

    /// Look up the live region, head and status hooks.
    pub(crate) fn locate(&self, settings: &ClientSettings) -> Result<PageNodes<Node>, ClientError> {
        let by_id = |id: &str| self.document.get_element_by_id(id).map(Node::from);
        let container = by_id(&settings.container_id)
            .ok_or_else(|| ClientError::ContainerNotFound(settings.container_id.clone()))?;
        Ok(PageNodes {
            container,
            head: self.document.head().map(Node::from),
            status_panel: by_id(&settings.status.panel_id),
            status_icon: by_id(&settings.status.icon_id),
        })
    }
}

fn host(e: &JsValue) -> DomError {
    DomError::Host(format!("{e:?}"))
}

fn element(node: &Node) -> Result<&Element, DomError> {
    node.dyn_ref::<Element>()
        .ok_or_else(|| DomError::NotAnElement(node.node_name()))
}

fn namespace_of(element: &Element) -> Namespace {
    Namespace::from_uri(element.namespace_uri().as_deref())
}

/// Set `name`, restoring SVG camel case and `xlink:`/`xml:` namespaces.
fn set_element_attribute(element: &Element, name: &str, value: &str) -> Result<(), DomError> {
    let result = match attribute_namespace(name) {
        Some(uri) => element.set_attribute_ns(Some(uri), name, value),
        None => element.set_attribute(namespace_of(element).attribute_name(name), value),
    };
    result.map_err(|e| host(&e))
}

fn remove_element_attribute(element: &Element, name: &str) -> Result<(), DomError> {
    let result = match attribute_namespace(name) {
        Some(uri) => {
            let local = name.split_once(':').map_or(name, |(_, local)| local);
            element.remove_attribute_ns(Some(uri), local)
        }
        None => element.remove_attribute(namespace_of(element).attribute_name(name)),
    };
    result.map_err(|e| host(&e))
}

impl BrowserDom {
    /// Build `vnode` as it would appear where `namespace` is in effect.
    fn build(&self, vnode: &VNode, namespace: Namespace) -> Result<Node, DomError> {
        match vnode {
            VNode::Element(velement) => {
                let namespace = namespace.of_element(&velement.tag);
                let element = match namespace {
                    Namespace::Html => self.document.create_element(&velement.tag),
                    _ => self.document.create_element_ns(
                        Some(namespace.uri()),
                        namespace.local_name(&velement.tag),
                    ),
                }
                .map_err(|e| host(&e))?;
                for (name, value) in &velement.attributes {
                    set_element_attribute(&element, name, value)?;
                }
                let inner = namespace.of_children(&velement.tag);
                for child in &velement.children {
                    let child = self.build(child, inner)?;
                    element.append_child(&child).map_err(|e| host(&e))?;
                }
                Ok(element.into())
            }
            VNode::Text(text) => Ok(self.document.create_text_node(text).into()),
            VNode::Comment(text) => Ok(self.document.create_comment(text).into()),
        }
    }
}

impl LiveDom for BrowserDom {
    type Node = Node;

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    // Names are lowercased like parsed trees; writes restore SVG camel case.
    fn shape(&self, node: &Node) -> NodeShape {
        match node.node_type() {
            Node::ELEMENT_NODE => {
                let Some(element) = node.dyn_ref::<Element>() else {
                    return NodeShape::Other;
                };
                let attributes: BTreeMap<String, String> = element
                    .get_attribute_names()
                    .iter()
                    .filter_map(|name| name.as_string())
                    .filter_map(|name| {
                        let value = element.get_attribute(&name)?;
                        Some((name.to_ascii_lowercase(), value))
                    })
                    .collect();
                NodeShape::Element {
                    tag: element.local_name().to_ascii_lowercase(),
                    attributes,
                }
            }
            Node::TEXT_NODE => NodeShape::Text(node.text_content().unwrap_or_default()),
            Node::COMMENT_NODE => NodeShape::Comment(node.text_content().unwrap_or_default()),
            _ => NodeShape::Other,
        }
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        let element = node.dyn_ref::<Element>()?;
        element.get_attribute(namespace_of(element).attribute_name(name))
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        set_element_attribute(element(node)?, name, value)
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), DomError> {
        remove_element_attribute(element(node)?, name)
    }

    fn set_text(&mut self, node: &Node, text: &str) -> Result<(), DomError> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn create(&mut self, vnode: &VNode) -> Result<Node, DomError> {
        self.build(vnode, Namespace::Html)
    }

    fn create_child(&mut self, parent: &Node, vnode: &VNode) -> Result<Node, DomError> {
        let namespace = parent.dyn_ref::<Element>().map_or(Namespace::Html, |parent| {
            namespace_of(parent).of_children(&parent.local_name().to_ascii_lowercase())
        });
        self.build(vnode, namespace)
    }

    fn insert_before(
        &mut self,
        parent: &Node,
        child: &Node,
        reference: Option<&Node>,
    ) -> Result<(), DomError> {
        parent
            .insert_before(child, reference)
            .map(drop)
            .map_err(|e| host(&e))
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        parent.remove_child(child).map(drop).map_err(|e| host(&e))
    }

    fn replace_child(&mut self, parent: &Node, new: &Node, old: &Node) -> Result<(), DomError> {
        parent
            .replace_child(new, old)
            .map(drop)
            .map_err(|e| host(&e))
    }
}
