//! Detached node tree parsed from HTML.
//!
//! Parsing is built on `tl`. Text and attribute values are entity-decoded on
//! the way in and re-encoded when rendering, so a [`VNode`] always holds the
//! logical (unescaped) content. `<script>` and `<style>` bodies are the
//! exception: they are kept and written out verbatim.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tl::{Children, Node, NodeHandle, Parser, ParserOptions};

use crate::raw_text::{self, Extracted};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Returns true if `tag` is an HTML void element.
pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A node of a detached tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VNode {
    /// Element with tag, attributes and children.
    Element(VElement),
    /// Text content (unescaped).
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
}

/// A detached element.
///
/// Attribute names and tag names are lowercase. Attributes are kept sorted by
/// name, which also fixes their rendering order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VElement {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes by name.
    pub attributes: BTreeMap<String, String>,
    /// Child nodes in document order.
    pub children: Vec<VNode>,
}

impl VElement {
    /// Create an element with no attributes and no children.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_owned());
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    /// Value of the `id` attribute, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    /// Render the children as HTML.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.render_into(&mut out);
        }
        out
    }
}

impl VNode {
    /// Render this node as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                write_start_tag(out, &element.tag, element.attributes.iter());
                if is_void_element(&element.tag) {
                    return;
                }
                let verbatim = raw_text::is_raw_text_element(&element.tag);
                for child in &element.children {
                    match child {
                        Self::Text(text) if verbatim => out.push_str(text),
                        _ => child.render_into(out),
                    }
                }
                write_end_tag(out, &element.tag);
            }
            Self::Text(text) => out.push_str(&html_escape::encode_text(text)),
            Self::Comment(body) => write_comment(out, body),
        }
    }
}

/// Write `<tag a="b">` into `out`.
pub(crate) fn write_start_tag<'a>(
    out: &mut String,
    tag: &str,
    attributes: impl Iterator<Item = (&'a String, &'a String)>,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        let _ = write!(
            out,
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(value)
        );
    }
    out.push('>');
}

/// Write `</tag>` into `out`.
pub(crate) fn write_end_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Write `<!--body-->` into `out`.
pub(crate) fn write_comment(out: &mut String, body: &str) {
    out.push_str("<!--");
    out.push_str(body);
    out.push_str("-->");
}

/// Parse an HTML fragment into a list of detached nodes.
///
/// Doctype declarations and processing instructions are dropped. Everything
/// else, including whitespace-only text, is kept so that rendering the result
/// reproduces the input structure.
///
/// # Errors
///
/// Returns the `tl` parse error if the input cannot be tokenized.
pub fn parse_fragment(html: &str) -> Result<Vec<VNode>, tl::ParseError> {
    let extracted = raw_text::extract(html);
    let dom = tl::parse(&extracted.html, ParserOptions::default())?;
    Ok(convert_children(dom.children(), dom.parser(), &extracted))
}

fn convert_top_children(
    children: Option<Children<'_, '_>>,
    parser: &Parser<'_>,
    extracted: &Extracted,
) -> Vec<VNode> {
    children.map_or_else(Vec::new, |children| {
        convert_children(&children.top().to_vec(), parser, extracted)
    })
}

fn convert_children(handles: &[NodeHandle], parser: &Parser<'_>, extracted: &Extracted) -> Vec<VNode> {
    handles
        .iter()
        .filter_map(|handle| handle.get(parser))
        .filter_map(|node| convert_node(node, parser, extracted))
        .collect()
}

/// Restore the body cut out of a raw-text element.
fn text_body(tag: &str, node: &Node<'_>, parser: &Parser<'_>, extracted: &Extracted) -> Vec<VNode> {
    let placeholder: String = node
        .children()
        .map(|children| {
            children
                .top()
                .iter()
                .filter_map(|handle| handle.get(parser))
                .map(|child| child.inner_text(parser).into_owned())
                .collect()
        })
        .unwrap_or_default();
    let Some(body) = extracted.body(&placeholder) else {
        return Vec::new();
    };
    let text = if raw_text::is_raw_text_element(tag) {
        body.to_owned()
    } else {
        html_escape::decode_html_entities(body).into_owned()
    };
    vec![VNode::Text(text)]
}

fn convert_node(node: &Node<'_>, parser: &Parser<'_>, extracted: &Extracted) -> Option<VNode> {
    match node {
        Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            if name.starts_with('!') || name.starts_with('?') {
                return None;
            }

            let attributes = tag
                .attributes()
                .iter()
                .map(|(key, value)| {
                    let value = value
                        .map(|v| html_escape::decode_html_entities(&v).into_owned())
                        .unwrap_or_default();
                    (key.to_ascii_lowercase(), value)
                })
                .collect();

            let children = if is_void_element(&name) {
                Vec::new()
            } else if raw_text::has_text_body(&name) {
                text_body(&name, node, parser, extracted)
            } else {
                convert_top_children(node.children(), parser, extracted)
            };

            Some(VNode::Element(VElement {
                tag: name,
                attributes,
                children,
            }))
        }
        Node::Raw(bytes) => {
            let raw = bytes.as_utf8_str();
            Some(VNode::Text(
                html_escape::decode_html_entities(&raw).into_owned(),
            ))
        }
        Node::Comment(bytes) => {
            let raw = bytes.as_utf8_str();
            let body = raw
                .strip_prefix("<!--")
                .and_then(|rest| rest.strip_suffix("-->"))
                .unwrap_or(&raw);
            Some(VNode::Comment(body.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(nodes: &[VNode]) -> String {
        nodes.iter().map(VNode::to_html).collect()
    }

    #[test]
    fn test_parse_simple_element() {
        let nodes = parse_fragment("<div>X</div>").unwrap();

        assert_eq!(
            nodes,
            vec![VNode::Element(
                VElement::new("div").with_children(vec![VNode::Text("X".to_owned())])
            )]
        );
    }

    #[test]
    fn test_parse_nested_with_attributes() {
        let nodes = parse_fragment(r#"<nav id="top"><a href="/a.html">A</a></nav>"#).unwrap();

        let VNode::Element(nav) = &nodes[0] else {
            panic!("expected element, got {:?}", nodes[0]);
        };
        assert_eq!(nav.tag, "nav");
        assert_eq!(nav.id(), Some("top"));
        let VNode::Element(link) = &nav.children[0] else {
            panic!("expected link element");
        };
        assert_eq!(link.attributes.get("href").map(String::as_str), Some("/a.html"));
    }

    #[test]
    fn test_parse_lowercases_names() {
        let nodes = parse_fragment(r#"<DIV Class="x">y</DIV>"#).unwrap();

        let VNode::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.tag, "div");
        assert_eq!(div.attributes.get("class").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_parse_decodes_entities() {
        let nodes = parse_fragment(r#"<p title="a &amp; b">1 &lt; 2</p>"#).unwrap();

        let VNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.attributes.get("title").map(String::as_str), Some("a & b"));
        assert_eq!(p.children, vec![VNode::Text("1 < 2".to_owned())]);
    }

    #[test]
    fn test_parse_keeps_comments() {
        let nodes = parse_fragment("<!-- note --><p>x</p>").unwrap();

        assert_eq!(nodes[0], VNode::Comment(" note ".to_owned()));
    }

    #[test]
    fn test_parse_void_element_has_no_children() {
        let nodes = parse_fragment(r#"<p>a<br>b</p>"#).unwrap();

        assert_eq!(render(&nodes), "<p>a<br>b</p>");
    }

    #[test]
    fn test_render_escapes_text_and_attributes() {
        let element = VElement::new("p")
            .with_attribute("title", "say \"hi\"")
            .with_children(vec![VNode::Text("<b> & co".to_owned())]);

        assert_eq!(
            VNode::Element(element).to_html(),
            r#"<p title="say &quot;hi&quot;">&lt;b&gt; &amp; co</p>"#
        );
    }

    #[test]
    fn test_render_roundtrip_plain_markup() {
        let html = r#"<nav><ul><li><a href="/index.html">Home</a></li></ul></nav><article><h1>Title</h1><p>Body</p></article>"#;

        assert_eq!(render(&parse_fragment(html).unwrap()), html);
    }

    #[test]
    fn test_script_and_style_bodies_are_verbatim() {
        let html = r#"<div id="m"><script>if (a < b && c) { x = "&amp;"; }</script><style>a > b { color: red }</style></div>"#;

        let nodes = parse_fragment(html).unwrap();

        let VNode::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(
            div.children,
            vec![
                VNode::Element(VElement::new("script").with_children(vec![VNode::Text(
                    r#"if (a < b && c) { x = "&amp;"; }"#.to_owned()
                )])),
                VNode::Element(
                    VElement::new("style")
                        .with_children(vec![VNode::Text("a > b { color: red }".to_owned())])
                ),
            ]
        );
        assert_eq!(render(&nodes), html);
    }

    #[test]
    fn test_json_metadata_script_roundtrip() {
        let html = r#"<script type="application/json" id="MetaData">{"title": "<b>&amp;</b>"}</script><article><p>x</p></article>"#;

        assert_eq!(render(&parse_fragment(html).unwrap()), html);
    }

    #[test]
    fn test_title_and_textarea_decode_entities_without_tags() {
        let nodes = parse_fragment("<title>a &amp; <b></title><textarea><p>x</p></textarea>").unwrap();

        assert_eq!(
            nodes,
            vec![
                VNode::Element(
                    VElement::new("title").with_children(vec![VNode::Text("a & <b>".to_owned())])
                ),
                VNode::Element(
                    VElement::new("textarea").with_children(vec![VNode::Text("<p>x</p>".to_owned())])
                ),
            ]
        );
        assert_eq!(
            render(&nodes),
            "<title>a &amp; &lt;b&gt;</title><textarea>&lt;p&gt;x&lt;/p&gt;</textarea>"
        );
    }

    #[test]
    fn test_empty_script_has_no_children() {
        let nodes = parse_fragment(r#"<script src="/app.js"></script><p>x</p>"#).unwrap();

        let VNode::Element(script) = &nodes[0] else {
            panic!("expected element");
        };
        assert!(script.children.is_empty());
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_parse_empty_fragment() {
        assert!(parse_fragment("").unwrap().is_empty());
    }

    #[test]
    fn test_inner_html() {
        let element = VElement::new("div").with_children(parse_fragment("<p>A</p>").unwrap());

        assert_eq!(element.inner_html(), "<p>A</p>");
    }
}
