//! Canonical text presentation of package items
//!
//! Each XML item kind gets a rendering that removes variation authoring
//! tools introduce between saves without changing meaning:
//!
//! - content types: `<Default>` and `<Override>` entries sorted
//! - relationships: `Id` values anonymized to `x`, entries sorted
//! - XML parts: root element attributes wrapped one per line and sorted
//!   (default namespace, other namespace declarations, other attributes)
//!
//! Binary items have no text rendering.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{OpcError, Result};
use crate::package::{ItemKind, PackageItem};
use crate::xml;

/// Indent used for wrapped root element attributes
const ATTR_INDENT: &str = "    ";

/// Presents a single package item as canonical text
#[derive(Debug, Clone, Copy)]
pub struct ItemPresenter<'a> {
    item: &'a PackageItem,
}

impl<'a> ItemPresenter<'a> {
    pub fn new(item: &'a PackageItem) -> Self {
        Self { item }
    }

    pub fn item(&self) -> &'a PackageItem {
        self.item
    }

    /// Effective path of the item with `/` as the separator on every platform
    pub fn filename(&self) -> String {
        self.item.path().to_string_lossy().replace('\\', "/")
    }

    /// Pretty-printed XML of the item, without trailing whitespace
    pub fn xml(&self) -> Result<String> {
        xml::pretty_text(self.item.blob())
    }

    /// Canonical text of the item, chosen by item kind
    pub fn text(&self) -> Result<String> {
        match self.item.kind() {
            ItemKind::ContentTypes => Ok(content_types_text(&self.xml()?)),
            ItemKind::Relationships => Ok(rels_item_text(&self.xml()?)),
            ItemKind::XmlPart => Ok(prettify_nsdecls(&self.xml()?)),
            ItemKind::Binary => Err(OpcError::Unsupported(format!(
                "binary item '{}' has no text representation",
                self.item.uri()
            ))),
        }
    }
}

/// Canonical text of `item`; shorthand for [`ItemPresenter::text`]
pub fn canonical_text(item: &PackageItem) -> Result<String> {
    ItemPresenter::new(item).text()
}

/// Index of the root element's start tag line in pretty-printed XML
fn root_line_index(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.starts_with('<') && !line.starts_with("<?") && !line.starts_with("<!"))
}

/// Keep the lines up to the root start tag, then `children`, then the closing
/// root tag
fn reassemble(lines: &[&str], root_idx: usize, children: Vec<String>) -> String {
    let mut out: Vec<String> = lines[..=root_idx].iter().map(|l| l.to_string()).collect();
    out.extend(children);
    if let Some(last) = lines.last() {
        out.push(last.to_string());
    }
    out.join("\n")
}

/// Sort the `<Default>` entries and the `<Override>` entries of a content
/// types item, defaults first
fn content_types_text(xml: &str) -> String {
    let lines: Vec<&str> = xml.split('\n').collect();
    let root_idx = match root_line_index(&lines) {
        Some(idx) if idx + 1 < lines.len() => idx,
        _ => return xml.to_string(),
    };

    let mut defaults: Vec<String> = Vec::new();
    let mut overrides: Vec<String> = Vec::new();
    for line in &lines[root_idx + 1..] {
        if line.starts_with("  <Default") {
            defaults.push(line.to_string());
        } else if line.starts_with("  <Override") {
            overrides.push(line.to_string());
        }
    }
    defaults.sort();
    overrides.sort();
    defaults.extend(overrides);

    reassemble(&lines, root_idx, defaults)
}

fn rel_id_re() -> &'static Regex {
    static REL_ID_RE: OnceLock<Regex> = OnceLock::new();
    REL_ID_RE.get_or_init(|| Regex::new(r#" Id="[^"]*""#).unwrap())
}

/// Anonymize relationship IDs to `x` and sort the `<Relationship>` entries
fn rels_item_text(xml: &str) -> String {
    let lines: Vec<&str> = xml.split('\n').collect();
    let root_idx = match root_line_index(&lines) {
        Some(idx) if idx + 1 < lines.len() => idx,
        _ => return xml.to_string(),
    };

    let mut relationships: Vec<String> = lines[root_idx + 1..]
        .iter()
        .filter(|line| line.starts_with("  <Relationship"))
        .map(|line| rel_id_re().replace_all(line, r#" Id="x""#).into_owned())
        .collect();
    relationships.sort();

    reassemble(&lines, root_idx, relationships)
}

fn attr_re() -> &'static Regex {
    static ATTR_RE: OnceLock<Regex> = OnceLock::new();
    ATTR_RE.get_or_init(|| Regex::new(r#"[^\s="<>/]+="[^"]*""#).unwrap())
}

/// Split a start tag line into head, attributes, and tail, e.g.
/// `("<p:sld", ["xmlns:p=\"urn:p\"", "name=\"x\""], ">")`
fn parse_attrs(rootline: &str) -> (&str, Vec<&str>, &str) {
    let matches: Vec<_> = attr_re().find_iter(rootline).collect();
    match (matches.first(), matches.last()) {
        (Some(first), Some(last)) => (
            rootline[..first.start()].trim(),
            matches.iter().map(|m| m.as_str()).collect(),
            rootline[last.end()..].trim(),
        ),
        _ => (rootline, Vec::new(), ""),
    }
}

/// Order attributes as: default namespace declaration, other namespace
/// declarations, remaining attributes; each group sorted
fn sequence_attrs(attributes: Vec<&str>) -> Vec<&str> {
    let mut def_nsdecls = Vec::new();
    let mut nsdecls = Vec::new();
    let mut attrs = Vec::new();
    for attr in attributes {
        if attr.starts_with("xmlns=") {
            def_nsdecls.push(attr);
        } else if attr.starts_with("xmlns:") {
            nsdecls.push(attr);
        } else {
            attrs.push(attr);
        }
    }
    def_nsdecls.sort_unstable();
    nsdecls.sort_unstable();
    attrs.sort_unstable();
    def_nsdecls.into_iter().chain(nsdecls).chain(attrs).collect()
}

fn pretty_rootline(head: &str, attrs: &[&str], tail: &str) -> String {
    let mut rootline = head.to_string();
    for attr in attrs {
        rootline.push('\n');
        rootline.push_str(ATTR_INDENT);
        rootline.push_str(attr);
    }
    if !tail.is_empty() {
        rootline.push('\n');
        rootline.push_str(ATTR_INDENT);
        rootline.push_str(tail);
    }
    rootline
}

/// Wrap and sort the attributes of the root element's start tag so namespace
/// declarations line up one per line in a stable order
pub fn prettify_nsdecls(xml: &str) -> String {
    let mut lines: Vec<String> = xml.split('\n').map(str::to_string).collect();
    let root_idx = {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        root_line_index(&refs)
    };
    let Some(root_idx) = root_idx else {
        return xml.to_string();
    };

    let rootline = {
        let (head, attributes, tail) = parse_attrs(&lines[root_idx]);
        if attributes.is_empty() {
            return xml.to_string();
        }
        pretty_rootline(head, &sequence_attrs(attributes), tail)
    };
    lines[root_idx] = rootline;
    lines.join("\n")
}
