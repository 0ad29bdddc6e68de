//! Lenient HTML fragment parser.
//!
//! Template markup is HTML, not XML, so the tokenizer is configured to
//! tolerate what hand-written templates contain:
//!
//! - void elements written without a closing slash (`<img src="x">`)
//! - valueless attributes (`<p optional>`)
//! - mismatched or missing end tags (closed at the nearest matching ancestor
//!   or at end of input)
//! - HTML named entities (`&nbsp;`, `&mdash;`)
//! - a bare `&` or a `<` that does not open a tag, both kept as text
//!
//! Comments, processing instructions and doctypes are dropped.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::decode_entity;
use crate::error::ParseError;
use crate::node::{Element, Fragment, Node};
use crate::serializer::is_void_element;

/// Parse an HTML fragment.
///
/// # Errors
///
/// Returns [`ParseError`] when the tokenizer cannot make sense of the input
/// (for example an unterminated tag or attribute quote).
pub fn parse_fragment(markup: &str) -> Result<Fragment, ParseError> {
    let markup = escape_stray_markup(markup);
    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = decode_element(&reader, &e);
                if is_void_element(&element.tag) {
                    builder.push_node(element.into());
                } else {
                    builder.open.push(element);
                }
            }
            Event::Empty(e) => {
                let element = decode_element(&reader, &e);
                builder.push_node(element.into());
            }
            Event::End(e) => {
                let tag = decode_name(&reader, e.name().as_ref());
                builder.close(&tag);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                builder.push_text(&text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                builder.push_text(&decode_entity(&entity));
            }
            Event::CData(e) => {
                builder.push_text(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    Ok(builder.finish())
}

/// Escape `&` that does not start a character reference and `<` that does
/// not start a tag, so the tokenizer reads them as text. Comments and CDATA
/// sections are copied unchanged.
fn escape_stray_markup(markup: &str) -> Cow<'_, str> {
    if !markup.contains(['&', '<']) {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 16);
    let mut rest = markup;
    while let Some(pos) = rest.find(['&', '<']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with('&') {
            out.push_str(if is_reference(tail) { "&" } else { "&amp;" });
            rest = &tail[1..];
        } else if let Some(len) = raw_section_len(tail) {
            out.push_str(&tail[..len]);
            rest = &tail[len..];
        } else {
            out.push_str(if opens_tag(tail) { "<" } else { "&lt;" });
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `&name;`, `&#123;` or `&#x1F;` at the start of `tail`.
fn is_reference(tail: &str) -> bool {
    let body = &tail[1..];
    let Some(end) = body.find(';') else {
        return false;
    };
    let name = &body[..end];
    match name.strip_prefix('#') {
        Some(numeric) => match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()),
        },
        None => {
            name.starts_with(|c: char| c.is_ascii_alphabetic())
                && name.chars().all(|c| c.is_ascii_alphanumeric())
        }
    }
}

/// Length of a comment or CDATA section at the start of `tail`.
fn raw_section_len(tail: &str) -> Option<usize> {
    let (open, close) = if tail.starts_with("<!--") {
        ("<!--", "-->")
    } else if tail.starts_with("<![CDATA[") {
        ("<![CDATA[", "]]>")
    } else {
        return None;
    };
    Some(
        tail[open.len()..]
            .find(close)
            .map_or(tail.len(), |end| open.len() + end + close.len()),
    )
}

fn opens_tag(tail: &str) -> bool {
    let mut chars = tail[1..].chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => true,
        Some('!' | '?') => true,
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Stack of open elements plus the finished top-level nodes.
#[derive(Default)]
struct TreeBuilder {
    root: Fragment,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn push_node(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.children.push(node),
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root.children,
        };
        // Entity references arrive as separate events; merge them into the
        // surrounding text so that `a&amp;b` stays one text node.
        if let Some(Node::Text(last)) = siblings.last_mut() {
            last.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_owned()));
        }
    }

    fn close(&mut self, tag: &str) {
        let Some(position) = self.open.iter().rposition(|el| el.tag == tag) else {
            // Stray end tag with no open element: ignore, like browsers do.
            return;
        };
        while self.open.len() > position {
            if let Some(element) = self.open.pop() {
                self.push_node(element.into());
            }
        }
    }

    fn finish(mut self) -> Fragment {
        while let Some(element) = self.open.pop() {
            self.push_node(element.into());
        }
        self.root
    }
}

fn decode_element(reader: &Reader<&[u8]>, start: &BytesStart) -> Element {
    let mut element = Element::new(&decode_name(reader, start.name().as_ref()));
    for attr in start.html_attributes().flatten() {
        let name = decode_name(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        element.set_attr(name, value);
    }
    element
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            std::borrow::Cow::into_owned,
        )
        .to_ascii_lowercase()
}
