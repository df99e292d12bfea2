//! opcdiag CLI - Command-line interface library
//!
//! This library provides the CLI functionality for opcdiag, including:
//! - Browse: Show the canonical text of one package item
//! - Diff / Diff-item: Show meaningful differences between packages
//! - Extract / Repackage: Convert between zip packages and directories
//! - Substitute: Swap one item from a package into another
//!
//! # Library Usage
//!
//! ```ignore
//! use opcdiag_cli::{browse_command, OpcView};
//!
//! let mut view = OpcView::new(std::io::stdout());
//! browse_command(&pkg_path, "core.xml", &mut view)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Show a pretty-printed part
//! opc browse deck.pptx slideMaster1.xml
//!
//! # Compare two packages (exit status 1 when they differ)
//! opc diff base.pptx changed.pptx
//!
//! # Extract a package for editing, then zip it back up
//! opc extract deck.pptx deck/
//! opc repackage deck/ rebuilt.pptx
//! ```

pub mod app;
pub mod config;
pub mod view;

// Re-export main entry point and types
pub use app::{
    browse_command, diff_command, diff_item_command, extract_command, repackage_command,
    substitute_command,
};
pub use app::{run, run_cli, Cli, Commands};
pub use config::{DiffSettings, ExtractSettings, Settings};
pub use view::OpcView;
