//! XML pretty-printing
//!
//! Parses an XML blob into a small in-memory tree and serializes it back with
//! two-space indentation, a UTF-8 standalone declaration, and a stable
//! attribute layout. Whitespace-only text between elements is replaced by
//! indentation; text with real content is left exactly as it was.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OpcError, Result};

/// XML declaration written at the top of every pretty-printed blob
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>";

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// A parsed XML document: the root element plus any comments or processing
/// instructions around it
#[derive(Debug, Clone, PartialEq)]
struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

/// Pretty-print `blob`, returning the full serialized text including the
/// trailing newline
pub fn prettify(blob: &[u8]) -> Result<String> {
    let mut document = parse(blob)?;
    indent_children(&mut document.root, 0);

    let mut out = String::with_capacity(blob.len() + blob.len() / 4);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    for node in &document.prolog {
        write_node(&mut out, node);
        out.push('\n');
    }
    write_element(&mut out, &document.root);
    out.push('\n');
    for node in &document.epilog {
        write_node(&mut out, node);
        out.push('\n');
    }
    Ok(out)
}

/// Pretty-print `blob` with surrounding whitespace removed
pub fn pretty_text(blob: &[u8]) -> Result<String> {
    Ok(prettify(blob)?.trim().to_string())
}

fn parse(blob: &[u8]) -> Result<Document> {
    let blob = blob.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(blob);
    let text = std::str::from_utf8(blob)
        .map_err(|e| OpcError::Encoding(format!("byte offset {}", e.valid_up_to())))?;
    // XML processors normalize line endings before parsing.
    let text = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    };

    let mut reader = Reader::from_str(&text);
    let mut stack: Vec<Element> = Vec::new();
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let node = match reader.read_event()? {
            Event::Start(e) => {
                stack.push(start_element(&e)?);
                continue;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| OpcError::InvalidXml("unexpected end tag".to_string()))?;
                Node::Element(element)
            }
            Event::Empty(e) => Node::Element(start_element(&e)?),
            Event::Text(e) => Node::Text(e.unescape()?.into_owned()),
            Event::CData(e) => Node::Text(decode(&e.into_inner())?),
            Event::Comment(e) => Node::Comment(decode(&e)?),
            Event::PI(e) => Node::ProcessingInstruction(decode(&e)?),
            Event::Decl(_) | Event::DocType(_) => continue,
            Event::Eof => break,
        };

        if let Some(parent) = stack.last_mut() {
            push_child(parent, node);
            continue;
        }
        match node {
            Node::Element(element) => {
                if root.is_some() {
                    return Err(OpcError::InvalidXml(
                        "more than one root element".to_string(),
                    ));
                }
                root = Some(element);
            }
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    return Err(OpcError::InvalidXml(
                        "text content outside the root element".to_string(),
                    ));
                }
            }
            misc => {
                if root.is_some() {
                    epilog.push(misc);
                } else {
                    prolog.push(misc);
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(OpcError::InvalidXml(format!(
            "element '{}' is not closed",
            open.name
        )));
    }
    let root = root.ok_or_else(|| OpcError::InvalidXml("no root element".to_string()))?;
    Ok(Document {
        prolog,
        root,
        epilog,
    })
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = decode(e.name().as_ref())?;
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = decode(attr.key.as_ref())?;
        // Literal whitespace in attribute values normalizes to a space;
        // character references survive as the characters they encode.
        let raw = decode(&attr.value)?.replace(['\t', '\n', '\r'], " ");
        let value = unescape(&raw)?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn push_child(parent: &mut Element, node: Node) {
    if let Node::Text(text) = &node {
        if let Some(Node::Text(previous)) = parent.children.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    parent.children.push(node);
}

fn decode(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| OpcError::Encoding(format!("byte offset {}", e.valid_up_to())))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Replace whitespace-only text around the child nodes of `element` with
/// newline-plus-indent text, recursively
///
/// An element with non-blank text among its children is mixed content and
/// is left exactly as parsed, including its whole subtree.
fn indent_children(element: &mut Element, level: usize) {
    let has_element_children = element
        .children
        .iter()
        .any(|node| !matches!(node, Node::Text(_)));
    let is_mixed = element
        .children
        .iter()
        .any(|node| matches!(node, Node::Text(text) if !is_blank(text)));
    if !has_element_children || is_mixed {
        return;
    }

    let child_indent = format!("\n{}", INDENT.repeat(level + 1));
    let closing_indent = format!("\n{}", INDENT.repeat(level));

    let nodes = std::mem::take(&mut element.children);
    let mut children = Vec::with_capacity(nodes.len() * 2 + 1);
    for mut node in nodes {
        match &mut node {
            Node::Text(_) => continue,
            Node::Element(child) => indent_children(child, level + 1),
            _ => {}
        }
        children.push(Node::Text(child_indent.clone()));
        children.push(node);
    }
    children.push(Node::Text(closing_indent));

    element.children = children;
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => escape_text(out, text),
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::ProcessingInstruction(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);

    // Namespace declarations precede ordinary attributes, each group in
    // document order.
    let (nsdecls, attrs): (Vec<_>, Vec<_>) = element
        .attributes
        .iter()
        .partition(|(key, _)| is_nsdecl(key));
    for (key, value) in nsdecls.into_iter().chain(attrs) {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attribute(out, value);
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn is_nsdecl(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}
