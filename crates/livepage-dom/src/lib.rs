//! HTML fragment model and structural DOM diff for livepage.
//!
//! The live-reload client receives complete HTML snapshots of a page region
//! and must converge the displayed region to them without replacing nodes
//! that did not change. This crate provides the pieces for that:
//!
//! - [`VNode`] / [`VElement`]: a detached tree parsed from an HTML fragment
//! - [`LiveDom`] trait: the seam to a concrete, mutable DOM
//! - [`Document`]: in-memory [`LiveDom`] implementation (tests, headless mirror)
//! - [`diff`] / [`apply`]: structural diff producing a [`Patch`] list, and its application
//!
//! # Example
//!
//! ```ignore
//! use livepage_dom::{Document, VElement, apply, diff, parse_fragment};
//!
//! let mut doc = Document::parse(r#"<div id="main"><p>old</p></div>"#)?;
//! let main = doc.get_element_by_id("main").unwrap();
//!
//! let proposed = VElement::new("div")
//!     .with_attribute("id", "main")
//!     .with_children(parse_fragment("<p>new</p>")?);
//! let patches = diff(&doc, &main, &proposed);
//! apply(&mut doc, patches)?;
//!
//! assert_eq!(doc.inner_html(main), "<p>new</p>");
//! ```

mod diff;
mod document;
mod live;
mod namespace;
mod raw_text;
mod vnode;

pub use diff::{Patch, apply, diff};
pub use document::{Document, NodeId};
pub use live::{DomError, LiveDom, NodeShape};
pub use namespace::{Namespace, attribute_namespace};
pub use tl::ParseError;
pub use vnode::{VElement, VNode, parse_fragment};
