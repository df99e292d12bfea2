//! Error types for package operations

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, canonicalizing, or writing a package
#[derive(Error, Debug)]
pub enum OpcError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute in XML content
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Malformed character or entity reference in XML content
    #[error("XML escape error: {0}")]
    XmlEscape(#[from] quick_xml::escape::EscapeError),

    /// XML content that is not UTF-8 text
    #[error("XML encoding error in '{0}': content is not valid UTF-8")]
    Encoding(String),

    /// Structurally invalid XML, e.g. no root element
    #[error("Invalid XML structure: {0}")]
    InvalidXml(String),

    /// No package item matches the requested URI (or URI tail)
    #[error("No item with name '{0}'")]
    ItemNotFound(String),

    /// No manifest entry has the requested name
    #[error("No manifest entry named '{0}'")]
    ManifestKeyNotFound(String),

    /// Pack URI that cannot be mapped onto a directory tree
    #[error("Invalid pack URI: '{0}'")]
    InvalidPackUri(String),

    /// A path that must be a directory is some other kind of file
    #[error("target path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Operation that has no meaning for the item kind
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for package operations
pub type Result<T> = std::result::Result<T, OpcError>;
