//! Console output for command results
//!
//! Every message ends with a newline and displayed paths use forward
//! slashes. Logging goes to stderr, so everything written here is command
//! output.

use std::io::{self, Write};
use std::path::Path;

use opcdiag_core::PackageDiff;

/// Formats command results onto a writer, normally stdout
pub struct OpcView<W: Write> {
    out: W,
}

impl<W: Write> OpcView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the view and return the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write a unified diff; an empty diff writes nothing
    pub fn item_diff(&mut self, diff: &str) -> io::Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{}", diff)
    }

    /// Write a consolidated package diff as blocks separated by blank lines
    pub fn package_diff(&mut self, diff: &PackageDiff) -> io::Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{}", diff)
    }

    /// Write the canonical text of a package item
    pub fn pkg_item(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    /// Confirm an item substitution
    pub fn substitute(
        &mut self,
        uri: &str,
        src_pkg_path: &Path,
        tgt_pkg_path: &Path,
        result_pkg_path: &Path,
    ) -> io::Result<()> {
        let msg = format!(
            "substituted '{}' from '{}' into '{}' and saved the result as '{}'",
            uri,
            src_pkg_path.display(),
            tgt_pkg_path.display(),
            result_pkg_path.display()
        );
        writeln!(self.out, "{}", msg.replace('\\', "/"))
    }
}
