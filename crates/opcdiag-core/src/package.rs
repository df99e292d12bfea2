//! Package and package item model
//!
//! A [`Package`] is the logical view of an OPC package: every item keyed by
//! its pack URI, each classified by URI pattern into an [`ItemKind`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{OpcError, Result};
use crate::phys_pkg::{uri_to_relpath, BlobCollection, PhysPkg};
use crate::xml;

/// Pack URI of the content types item
pub const CONTENT_TYPES_URI: &str = "[Content_Types].xml";

/// The kind of a package item, decided purely by its URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// The `[Content_Types].xml` item
    ContentTypes,
    /// A relationships item, URI ending in `.rels`
    Relationships,
    /// Any other item with a URI ending in `.xml`
    XmlPart,
    /// Everything else: images, embedded binaries, and so on
    Binary,
}

impl ItemKind {
    pub fn classify(uri: &str) -> Self {
        if uri == CONTENT_TYPES_URI {
            ItemKind::ContentTypes
        } else if uri.ends_with(".rels") {
            ItemKind::Relationships
        } else if uri.ends_with(".xml") {
            ItemKind::XmlPart
        } else {
            ItemKind::Binary
        }
    }

    /// True for every kind whose content is XML
    pub fn is_xml(self) -> bool {
        !matches!(self, ItemKind::Binary)
    }
}

/// Individual item (file, roughly) within an OPC package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageItem {
    uri: String,
    blob: Vec<u8>,
    root_uri: PathBuf,
}

impl PackageItem {
    pub fn new(root_uri: impl Into<PathBuf>, uri: impl Into<String>, blob: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            blob,
            root_uri: root_uri.into(),
        }
    }

    /// The pack URI of this item, e.g. `word/document.xml`
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The binary contents of this item, frequently but not always XML text
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }

    pub fn kind(&self) -> ItemKind {
        ItemKind::classify(&self.uri)
    }

    pub fn is_content_types(&self) -> bool {
        self.kind() == ItemKind::ContentTypes
    }

    pub fn is_rels_item(&self) -> bool {
        self.kind() == ItemKind::Relationships
    }

    pub fn is_xml_part(&self) -> bool {
        self.kind() == ItemKind::XmlPart
    }

    /// Path of this item as though it were extracted into a directory at its
    /// package's root URI
    pub fn path(&self) -> PathBuf {
        self.root_uri.join(uri_to_relpath(&self.uri))
    }

    /// Reformat the XML in this item to indented, human-readable form
    ///
    /// Binary items are left untouched.
    pub fn prettify_xml(&mut self) -> Result<()> {
        if self.kind().is_xml() {
            self.blob = xml::prettify(&self.blob)?.into_bytes();
        }
        Ok(())
    }
}

/// Root of the package graph and main model API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    items: BTreeMap<String, PackageItem>,
}

impl Package {
    /// Build a package from its items; a later item replaces an earlier one
    /// with the same URI
    pub fn new(items: impl IntoIterator<Item = PackageItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.uri.clone(), item))
                .collect(),
        }
    }

    /// Read the package at `path`, either a zip archive (e.g. a `.docx` file)
    /// or a directory containing an extracted package
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_phys_pkg(PhysPkg::read(path)?))
    }

    pub fn from_phys_pkg(phys_pkg: PhysPkg) -> Self {
        let (blobs, root_uri) = phys_pkg.into_parts();
        Self::new(
            blobs
                .into_iter()
                .map(|(uri, blob)| PackageItem::new(root_uri.clone(), uri, blob)),
        )
    }

    /// Items in pack URI order
    pub fn items(&self) -> impl Iterator<Item = &PackageItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item with exactly `uri`
    pub fn get(&self, uri: &str) -> Option<&PackageItem> {
        self.items.get(uri)
    }

    /// The first item, in pack URI order, whose URI ends with `uri_tail`
    ///
    /// When several items share the suffix the lexicographically earliest
    /// wins.
    pub fn find_item_by_uri_tail(&self, uri_tail: &str) -> Result<&PackageItem> {
        self.items
            .values()
            .find(|item| item.uri.ends_with(uri_tail))
            .ok_or_else(|| OpcError::ItemNotFound(uri_tail.to_string()))
    }

    /// Pretty-print the XML of every content types item, relationships item,
    /// and XML part in place
    pub fn prettify_xml(&mut self) -> Result<()> {
        for item in self.items.values_mut() {
            item.prettify_xml()?;
        }
        Ok(())
    }

    /// Relationships items, sorted by pack URI
    pub fn rels_items(&self) -> Vec<&PackageItem> {
        self.items_of_kind(ItemKind::Relationships)
    }

    /// XML parts, sorted by pack URI
    pub fn xml_parts(&self) -> Vec<&PackageItem> {
        self.items_of_kind(ItemKind::XmlPart)
    }

    fn items_of_kind(&self, kind: ItemKind) -> Vec<&PackageItem> {
        self.items.values().filter(|item| item.kind() == kind).collect()
    }

    /// Save this package to a zip archive at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PhysPkg::write_to_zip(&self.blobs(), path)
    }

    /// Save each item of this package as a file under `dirpath`
    ///
    /// An existing directory at `dirpath` is deleted before being recreated.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dirpath: P) -> Result<()> {
        PhysPkg::write_to_dir(&self.blobs(), dirpath)
    }

    /// Replace the blob of the item with the same URI as `src_item`
    ///
    /// Supports narrowing down a problematic part by swapping in the
    /// corresponding item from a known working package. Adding an item under
    /// a URI this package does not already have is not supported.
    pub fn substitute_item(&mut self, src_item: &PackageItem) -> Result<()> {
        let tgt_item = self
            .items
            .get_mut(&src_item.uri)
            .ok_or_else(|| OpcError::ItemNotFound(src_item.uri.clone()))?;
        tgt_item.set_blob(src_item.blob.clone());
        debug!("substituted item {}", src_item.uri);
        Ok(())
    }

    /// Snapshot of the current blob of every item
    pub fn blobs(&self) -> BlobCollection {
        self.items
            .iter()
            .map(|(uri, item)| (uri.clone(), item.blob.clone()))
            .collect()
    }
}
