//! Package manifests
//!
//! A manifest is a sorted sequence of (hash, name) pairs that unambiguously
//! characterizes the contents of a package. Two packages with equal manifests
//! hold byte-for-byte identical items, whether each is stored as a zip
//! archive or expanded into a directory.

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

use sha2::{Digest, Sha256};
use zip::read::ZipArchive;

use crate::diff::{unified_diff, DEFAULT_CONTEXT_LINES};
use crate::error::{OpcError, Result};
use crate::phys_pkg::{filepaths_in_dir, relpath_to_uri};

/// Sorted (hash, name) fingerprint of a package
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    hash_names: Vec<(String, String)>,
}

impl Manifest {
    /// Build a manifest from (hash, name) pairs in any order
    pub fn new(hash_names: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut hash_names: Vec<_> = hash_names.into_iter().collect();
        hash_names.sort_by(|a, b| a.1.cmp(&b.1));
        Self { hash_names }
    }

    /// Manifest of the package at `path`, a directory or a zip archive
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_zip(path)
        }
    }

    /// Manifest of the extracted package at `dirpath`
    pub fn from_dir<P: AsRef<Path>>(dirpath: P) -> Result<Self> {
        let dirpath = dirpath.as_ref();
        let mut hash_names = Vec::new();
        for filepath in filepaths_in_dir(dirpath)? {
            let blob = fs::read(&filepath)?;
            hash_names.push((hash_blob(&blob), relpath_to_uri(dirpath, &filepath)));
        }
        Ok(Self::new(hash_names))
    }

    /// Manifest of the zip package at `zip_path`
    pub fn from_zip<P: AsRef<Path>>(zip_path: P) -> Result<Self> {
        Self::from_reader(File::open(zip_path)?)
    }

    /// Manifest of a zip package read from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut hash_names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut blob = Vec::new();
            file.read_to_end(&mut blob)?;
            hash_names.push((hash_blob(&blob), file.name().to_string()));
        }
        Ok(Self::new(hash_names))
    }

    /// Hash of the entry named exactly `name`
    pub fn get(&self, name: &str) -> Result<&str> {
        self.hash_names
            .iter()
            .find(|entry| entry.1 == name)
            .map(|(hash, _)| hash.as_str())
            .ok_or_else(|| OpcError::ManifestKeyNotFound(name.to_string()))
    }

    /// Replace the hash of the entry named exactly `name`
    pub fn set(&mut self, name: &str, hash: impl Into<String>) -> Result<()> {
        let entry = self
            .hash_names
            .iter_mut()
            .find(|entry| entry.1 == name)
            .ok_or_else(|| OpcError::ManifestKeyNotFound(name.to_string()))?;
        entry.0 = hash.into();
        Ok(())
    }

    /// (hash, name) pairs sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hash_names
            .iter()
            .map(|(hash, name)| (hash.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.hash_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash_names.is_empty()
    }

    /// Unified diff between the listings of this manifest and `other`
    ///
    /// Meant to explain a failed equivalence check.
    pub fn diff(&self, other: &Manifest, filename_1: &str, filename_2: &str) -> String {
        unified_diff(
            &self.to_string(),
            &other.to_string(),
            filename_1,
            filename_2,
            DEFAULT_CONTEXT_LINES,
        )
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "manifest = [")?;
        for (hash, name) in &self.hash_names {
            writeln!(f, "    ('{}',", hash)?;
            writeln!(f, "     '{}'),", name)?;
        }
        write!(f, "]")
    }
}

/// Lowercase hex SHA-256 of `blob`
pub fn hash_blob(blob: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blob);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
