//! Physical package access
//!
//! An OPC package lives on disk either as a zip archive (the usual `.docx`,
//! `.pptx` or `.xlsx` file) or as a directory tree holding the same items
//! expanded into individual files. Both forms read into the same flat
//! [`BlobCollection`] keyed by pack URI, and any blob collection can be
//! written back out in either form.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{OpcError, Result};

/// Raw item contents keyed by pack URI
///
/// Iteration is always in lexicographic URI order.
pub type BlobCollection = BTreeMap<String, Vec<u8>>;

/// A storage form an OPC package can be loaded from
pub trait PhysPkgSource {
    /// Location used to compute effective on-disk paths of the package items
    fn root_uri(&self) -> PathBuf;

    /// Read every item of the package into memory
    fn load_blobs(&self) -> Result<BlobCollection>;
}

/// A package expanded into individual files in a directory
///
/// The directory structure mirrors the pack URIs.
#[derive(Debug, Clone)]
pub struct DirPhysPkg {
    root: PathBuf,
}

impl DirPhysPkg {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PhysPkgSource for DirPhysPkg {
    fn root_uri(&self) -> PathBuf {
        self.root.clone()
    }

    fn load_blobs(&self) -> Result<BlobCollection> {
        let mut blobs = BlobCollection::new();
        for filepath in filepaths_in_dir(&self.root)? {
            let uri = relpath_to_uri(&self.root, &filepath);
            blobs.insert(uri, fs::read(&filepath)?);
        }
        debug!(
            "read {} items from directory {}",
            blobs.len(),
            self.root.display()
        );
        Ok(blobs)
    }
}

/// A package in the typically encountered form, a zip archive
#[derive(Debug, Clone)]
pub struct ZipPhysPkg {
    path: PathBuf,
}

impl ZipPhysPkg {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the items of a zip archive from any reader that implements Read + Seek
    pub fn blobs_from_reader<R: Read + Seek>(reader: R) -> Result<BlobCollection> {
        let mut archive = ZipArchive::new(reader)?;
        let mut blobs = BlobCollection::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            blobs.insert(name, contents);
        }

        Ok(blobs)
    }
}

impl PhysPkgSource for ZipPhysPkg {
    /// The zip path with its extension removed, e.g. `deck` for `deck.pptx`
    fn root_uri(&self) -> PathBuf {
        self.path.with_extension("")
    }

    fn load_blobs(&self) -> Result<BlobCollection> {
        // The archive (and its file handle) is dropped before returning.
        let blobs = Self::blobs_from_reader(File::open(&self.path)?)?;
        debug!(
            "read {} items from zip archive {}",
            blobs.len(),
            self.path.display()
        );
        Ok(blobs)
    }
}

/// A package loaded into memory from one of its physical forms
#[derive(Debug, Clone)]
pub struct PhysPkg {
    blobs: BlobCollection,
    root_uri: PathBuf,
}

impl PhysPkg {
    pub fn new(blobs: BlobCollection, root_uri: impl Into<PathBuf>) -> Self {
        Self {
            blobs,
            root_uri: root_uri.into(),
        }
    }

    /// Load the package at `path`
    ///
    /// A directory is read as an expanded package, anything else as a zip
    /// archive.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::read_from(&DirPhysPkg::new(path))
        } else {
            Self::read_from(&ZipPhysPkg::new(path))
        }
    }

    /// Load a package from an explicit storage form
    pub fn read_from(source: &dyn PhysPkgSource) -> Result<Self> {
        Ok(Self::new(source.load_blobs()?, source.root_uri()))
    }

    pub fn root_uri(&self) -> &Path {
        &self.root_uri
    }

    pub fn blobs(&self) -> &BlobCollection {
        &self.blobs
    }

    pub fn into_parts(self) -> (BlobCollection, PathBuf) {
        (self.blobs, self.root_uri)
    }

    /// Write `blobs` to a zip archive at `path`, replacing any existing file
    ///
    /// Entries are written in URI order using deflate compression.
    pub fn write_to_zip<P: AsRef<Path>>(blobs: &BlobCollection, path: P) -> Result<()> {
        let path = path.as_ref();
        Self::write_zip_to(blobs, File::create(path)?)?;
        debug!("wrote {} items to zip archive {}", blobs.len(), path.display());
        Ok(())
    }

    /// Write `blobs` as a zip archive to any writer
    pub fn write_zip_to<W: Write + Seek>(blobs: &BlobCollection, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (uri, blob) in blobs {
            zip.start_file(uri.as_str(), options)?;
            zip.write_all(blob)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Write each blob to a file under `dirpath`, using its URI as the relative path
    ///
    /// An existing directory at `dirpath` is deleted before being recreated.
    /// Fails with [`OpcError::NotADirectory`] when `dirpath` is an existing
    /// file, leaving that file untouched.
    pub fn write_to_dir<P: AsRef<Path>>(blobs: &BlobCollection, dirpath: P) -> Result<()> {
        let dirpath = dirpath.as_ref();
        clear_or_make_dir(dirpath)?;
        for (uri, blob) in blobs {
            write_blob_to_dir(dirpath, uri, blob)?;
        }
        debug!("wrote {} items to directory {}", blobs.len(), dirpath.display());
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PhysPkg {
    type Item = (&'a String, &'a Vec<u8>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

/// Convert a pack URI into a relative filesystem path
///
/// Empty and `.` segments are dropped, so a leading `/` is harmless.
pub fn uri_to_relpath(uri: &str) -> PathBuf {
    uri.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Compute the pack URI of `filepath` relative to the package `root`
pub fn relpath_to_uri(root: &Path, filepath: &Path) -> String {
    let relpath = filepath.strip_prefix(root).unwrap_or(filepath);
    relpath
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sorted paths of every regular file under `dirpath`, visiting subdirectories
pub fn filepaths_in_dir(dirpath: &Path) -> Result<Vec<PathBuf>> {
    let mut filepaths = Vec::new();
    collect_filepaths(dirpath, &mut filepaths)?;
    filepaths.sort();
    Ok(filepaths)
}

fn collect_filepaths(dirpath: &Path, filepaths: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dirpath)? {
        let entry = entry?;
        // file_type() does not follow symlinks; linked directories are skipped
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_filepaths(&path, filepaths)?;
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            filepaths.push(path);
        }
    }
    Ok(())
}

/// Leave an empty directory at `dirpath`, creating intermediate directories as needed
fn clear_or_make_dir(dirpath: &Path) -> Result<()> {
    if dirpath.exists() {
        if !dirpath.is_dir() {
            return Err(OpcError::NotADirectory(dirpath.to_path_buf()));
        }
        warn!("removing existing directory {}", dirpath.display());
        fs::remove_dir_all(dirpath)?;
    }
    fs::create_dir_all(dirpath)?;
    Ok(())
}

fn write_blob_to_dir(dirpath: &Path, uri: &str, blob: &[u8]) -> Result<()> {
    if uri.split('/').any(|segment| segment == "..") {
        return Err(OpcError::InvalidPackUri(uri.to_string()));
    }
    let fullpath = dirpath.join(uri_to_relpath(uri));
    if let Some(parent) = fullpath.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&fullpath, blob)?;
    Ok(())
}
