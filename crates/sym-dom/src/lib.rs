//! Minimal document model for the Symbiont content engine.
//!
//! The engine never talks to a browser DOM directly. Templates are parsed
//! into owned [`Fragment`]s, mutated by the data binder, and mounted into a
//! document tree owned by the engine. This crate provides:
//!
//! - [`Node`], [`Element`], [`Fragment`]: the tree itself
//! - [`ParentNode`]: DOM-style queries (`query`, `query_all`, `text_content`)
//! - [`Selector`]: tag, `#id`, `.class` and `[attr]` / `[attr=value]` selectors
//! - [`parse_fragment`]: lenient HTML fragment parser built on `quick-xml`
//! - [`escape_text`] / [`escape_attr`]: serializer escaping helpers
//!
//! # Example
//!
//! ```
//! use sym_dom::{ParentNode, Selector, parse_fragment};
//!
//! let mut fragment = parse_fragment(r#"<article><h2 data-bind="title"></h2></article>"#).unwrap();
//! let heading = fragment.query_mut(&Selector::attr("data-bind")).unwrap();
//! heading.set_text("Hello");
//! assert_eq!(fragment.to_html(), r#"<article><h2 data-bind="title">Hello</h2></article>"#);
//! ```

mod entities;
mod error;
mod node;
mod parser;
mod selector;
mod serializer;

pub use error::ParseError;
pub use node::{Element, Fragment, Node, NodePath, ParentNode};
pub use parser::parse_fragment;
pub use selector::Selector;
pub use serializer::{escape_attr, escape_text, is_void_element};
