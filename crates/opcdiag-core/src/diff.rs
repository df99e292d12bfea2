//! Diffs between packages and their items
//!
//! Items are compared by their canonical text (see [`crate::presenter`]), so
//! only meaningful changes show up.

use std::fmt;

use log::debug;
use similar::{ChangeTag, TextDiff};

use crate::error::Result;
use crate::package::{Package, PackageItem, CONTENT_TYPES_URI};
use crate::presenter::ItemPresenter;

/// Default number of context lines around each change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Unified diff listing between `text_1` and `text_2`
///
/// Returns an empty string when the texts are identical. File and hunk
/// header lines keep their own line terminator and every line is then
/// joined with `\n`, so each header is followed by a blank line:
///
/// ```text
/// --- filename
///
/// +++ filename_2
///
/// @@ -1,3 +1,3 @@
///
///  foobar
/// +goobar
/// ```
pub fn unified_diff(
    text_1: &str,
    text_2: &str,
    filename_1: &str,
    filename_2: &str,
    context_lines: usize,
) -> String {
    let lines_1: Vec<&str> = text_1.split('\n').collect();
    let lines_2: Vec<&str> = text_2.split('\n').collect();
    if lines_1 == lines_2 {
        return String::new();
    }

    let diff = TextDiff::from_slices(&lines_1, &lines_2);
    let mut unified = diff.unified_diff();
    unified.context_radius(context_lines);

    let mut out: Vec<String> = vec![
        header_line("---", filename_1),
        header_line("+++", filename_2),
    ];
    for hunk in unified.iter_hunks() {
        out.push(format!("{}\n", hunk.header()));
        out.extend(hunk.iter_changes().map(|change| {
            let sign = match change.tag() {
                ChangeTag::Equal => ' ',
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
            };
            format!("{}{}", sign, change.value())
        }));
    }

    out.join("\n")
}

/// `--- name` / `+++ name` header with its terminator, never ending in a
/// dangling space
fn header_line(marker: &str, filename: &str) -> String {
    format!("{} {}", marker, filename).trim_end().to_string() + "\n"
}

/// Forms diffs between packages and their items
#[derive(Debug, Clone, Copy)]
pub struct DiffPresenter {
    context_lines: usize,
}

impl Default for DiffPresenter {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

impl DiffPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Diff between the item identified by `uri_tail` in `package_1` and its
    /// counterpart in `package_2`
    pub fn named_item_diff(
        &self,
        package_1: &Package,
        package_2: &Package,
        uri_tail: &str,
    ) -> Result<String> {
        let item_1 = package_1.find_item_by_uri_tail(uri_tail)?;
        let item_2 = package_2.find_item_by_uri_tail(uri_tail)?;
        self.item_diff(item_1, item_2)
    }

    /// Diffs between the rels items in `package_1` and their counterparts in
    /// `package_2`, in pack URI order; items without differences are omitted
    pub fn rels_diffs(&self, package_1: &Package, package_2: &Package) -> Result<Vec<String>> {
        self.item_diffs(package_1.rels_items(), package_2)
    }

    /// Diffs between the XML parts in `package_1` and their counterparts in
    /// `package_2`, in pack URI order; parts without differences are omitted
    pub fn xml_part_diffs(
        &self,
        package_1: &Package,
        package_2: &Package,
    ) -> Result<Vec<String>> {
        self.item_diffs(package_1.xml_parts(), package_2)
    }

    /// Content types, rels, and XML part diffs between two packages
    pub fn package_diff(&self, package_1: &Package, package_2: &Package) -> Result<PackageDiff> {
        Ok(PackageDiff {
            content_types: self.named_item_diff(package_1, package_2, CONTENT_TYPES_URI)?,
            rels: self.rels_diffs(package_1, package_2)?,
            xml_parts: self.xml_part_diffs(package_1, package_2)?,
        })
    }

    /// Diff between the canonical text of two items
    pub fn item_diff(&self, item_1: &PackageItem, item_2: &PackageItem) -> Result<String> {
        let presenter_1 = ItemPresenter::new(item_1);
        let presenter_2 = ItemPresenter::new(item_2);
        Ok(unified_diff(
            &presenter_1.text()?,
            &presenter_2.text()?,
            &presenter_1.filename(),
            &presenter_2.filename(),
            self.context_lines,
        ))
    }

    fn item_diffs(&self, items: Vec<&PackageItem>, package_2: &Package) -> Result<Vec<String>> {
        let mut diffs = Vec::new();
        for item in items {
            let counterpart = package_2.find_item_by_uri_tail(item.uri())?;
            let diff = self.item_diff(item, counterpart)?;
            if !diff.is_empty() {
                debug!("{} differs", item.uri());
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }
}

/// Consolidated diff between two packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDiff {
    pub content_types: String,
    pub rels: Vec<String>,
    pub xml_parts: Vec<String>,
}

impl PackageDiff {
    /// True when the packages showed no meaningful difference
    pub fn is_empty(&self) -> bool {
        self.content_types.is_empty() && self.rels.is_empty() && self.xml_parts.is_empty()
    }

    /// Diff blocks in display order; the content types block only when non-empty
    pub fn blocks(&self) -> Vec<&str> {
        let mut blocks = Vec::new();
        if !self.content_types.is_empty() {
            blocks.push(self.content_types.as_str());
        }
        blocks.extend(self.rels.iter().map(String::as_str));
        blocks.extend(self.xml_parts.iter().map(String::as_str));
        blocks
    }
}

impl fmt::Display for PackageDiff {
    /// Diff blocks separated by blank lines
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.blocks().join("\n\n"))
    }
}
