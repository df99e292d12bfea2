//! CLI Application logic
//!
//! Contains the command-line interface implementation. Each command reads
//! its packages fresh, performs one operation, and reports through an
//! [`OpcView`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use opcdiag_core::{DiffPresenter, ItemPresenter, Package};

use crate::config::Settings;
use crate::view::OpcView;

#[derive(Parser, Debug)]
#[command(name = "opc")]
#[command(
    author,
    version,
    about = "Browse and diff Office Open XML packages",
    long_about = None,
    after_help = "'opc <command> --help' lists command-specific help"
)]
pub struct Cli {
    /// Settings file (defaults to ./opcdiag.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List pretty-printed XML for a specified package part
    Browse {
        /// Path to OPC package file
        #[arg(value_name = "PKG_PATH")]
        pkg_path: PathBuf,

        /// Filename portion of the pack URI for the part to browse
        #[arg(value_name = "FILENAME")]
        filename: String,
    },

    /// Show differences between two OPC package files
    Diff {
        /// First package to compare
        #[arg(value_name = "PKG_1_PATH")]
        pkg_1_path: PathBuf,

        /// Second package to compare
        #[arg(value_name = "PKG_2_PATH")]
        pkg_2_path: PathBuf,
    },

    /// Show differences between a specified item in two OPC package files
    DiffItem {
        /// First package
        #[arg(value_name = "PKG_1_PATH")]
        pkg_1_path: PathBuf,

        /// Second package
        #[arg(value_name = "PKG_2_PATH")]
        pkg_2_path: PathBuf,

        /// Filename portion of the pack URI for the item to compare
        #[arg(value_name = "FILENAME")]
        filename: String,
    },

    /// Extract all items in a package to a directory
    Extract {
        /// Path to package
        #[arg(value_name = "PKG_PATH")]
        pkg_path: PathBuf,

        /// Directory into which to extract package items
        #[arg(value_name = "DIRPATH")]
        dirpath: PathBuf,
    },

    /// Build an OPC package from the contents of a directory
    Repackage {
        /// Directory containing expanded package files
        #[arg(value_name = "DIRPATH")]
        dirpath: PathBuf,

        /// Path at which to save the new package file
        #[arg(value_name = "NEW_PACKAGE")]
        new_package: PathBuf,
    },

    /// Substitute a part from one package into another
    Substitute {
        /// Filename portion of the pack URI for the part to substitute
        #[arg(value_name = "FILENAME")]
        filename: String,

        /// Package from which to source the part identified by FILENAME
        #[arg(value_name = "SRC_PKG_PATH")]
        src_pkg_path: PathBuf,

        /// Package from which to get all remaining parts
        #[arg(value_name = "TGT_PKG_PATH")]
        tgt_pkg_path: PathBuf,

        /// Path at which to store the resulting package file
        #[arg(value_name = "RESULT_PKG_PATH")]
        result_pkg_path: PathBuf,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments, installs logging, and dispatches to the
/// appropriate command. The `diff` command exits with status 1 when the
/// packages differ.
pub fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let status = run(cli, stdout.lock())?;
    Ok(ExitCode::from(status))
}

/// Execute a parsed command line, writing command output to `out`
///
/// Returns the process exit status: 1 when `diff` found differences,
/// 0 otherwise.
pub fn run<W: Write>(cli: Cli, out: W) -> Result<u8> {
    let settings = Settings::load(cli.config.as_deref())?;
    let mut view = OpcView::new(out);

    match cli.command {
        Commands::Browse { pkg_path, filename } => {
            browse_command(&pkg_path, &filename, &mut view)?;
        }
        Commands::Diff {
            pkg_1_path,
            pkg_2_path,
        } => {
            if diff_command(&pkg_1_path, &pkg_2_path, &settings, &mut view)? {
                return Ok(1);
            }
        }
        Commands::DiffItem {
            pkg_1_path,
            pkg_2_path,
            filename,
        } => {
            diff_item_command(&pkg_1_path, &pkg_2_path, &filename, &settings, &mut view)?;
        }
        Commands::Extract { pkg_path, dirpath } => {
            extract_command(&pkg_path, &dirpath, &settings)?;
        }
        Commands::Repackage {
            dirpath,
            new_package,
        } => {
            repackage_command(&dirpath, &new_package)?;
        }
        Commands::Substitute {
            filename,
            src_pkg_path,
            tgt_pkg_path,
            result_pkg_path,
        } => {
            substitute_command(
                &filename,
                &src_pkg_path,
                &tgt_pkg_path,
                &result_pkg_path,
                &mut view,
            )?;
        }
    }

    Ok(0)
}

/// Install a stderr subscriber; `RUST_LOG` applies unless `verbose` is set
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("opcdiag v{}", opcdiag_core::VERSION);
}

/// Execute the browse command
pub fn browse_command<W: Write>(
    pkg_path: &Path,
    uri_tail: &str,
    view: &mut OpcView<W>,
) -> Result<()> {
    ensure_exists(pkg_path, "PKG_PATH")?;

    let package = read_package(pkg_path)?;
    let item = package.find_item_by_uri_tail(uri_tail)?;
    let text = ItemPresenter::new(item)
        .text()
        .with_context(|| format!("Failed to present item: {}", item.uri()))?;

    view.pkg_item(&text)?;
    Ok(())
}

/// Execute the diff command, returning true when the packages differ
pub fn diff_command<W: Write>(
    pkg_1_path: &Path,
    pkg_2_path: &Path,
    settings: &Settings,
    view: &mut OpcView<W>,
) -> Result<bool> {
    ensure_exists(pkg_1_path, "PKG_1_PATH")?;
    ensure_exists(pkg_2_path, "PKG_2_PATH")?;

    let package_1 = read_package(pkg_1_path)?;
    let package_2 = read_package(pkg_2_path)?;
    let diff = diff_presenter(settings)
        .package_diff(&package_1, &package_2)
        .with_context(|| {
            format!(
                "Failed to diff {} against {}",
                pkg_1_path.display(),
                pkg_2_path.display()
            )
        })?;

    view.package_diff(&diff)?;
    Ok(!diff.is_empty())
}

/// Execute the diff-item command
pub fn diff_item_command<W: Write>(
    pkg_1_path: &Path,
    pkg_2_path: &Path,
    uri_tail: &str,
    settings: &Settings,
    view: &mut OpcView<W>,
) -> Result<()> {
    ensure_exists(pkg_1_path, "PKG_1_PATH")?;
    ensure_exists(pkg_2_path, "PKG_2_PATH")?;

    let package_1 = read_package(pkg_1_path)?;
    let package_2 = read_package(pkg_2_path)?;
    let diff = diff_presenter(settings).named_item_diff(&package_1, &package_2, uri_tail)?;

    view.item_diff(&diff)?;
    Ok(())
}

/// Execute the extract command
pub fn extract_command(pkg_path: &Path, dirpath: &Path, settings: &Settings) -> Result<()> {
    ensure_exists(pkg_path, "PKG_PATH")?;

    let mut package = read_package(pkg_path)?;
    if settings.extract.prettify {
        package
            .prettify_xml()
            .with_context(|| format!("Failed to pretty-print XML in {}", pkg_path.display()))?;
    }
    package
        .save_to_dir(dirpath)
        .with_context(|| format!("Failed to extract into {}", dirpath.display()))?;

    info!("extracted {} items to {}", package.len(), dirpath.display());
    Ok(())
}

/// Execute the repackage command
pub fn repackage_command(dirpath: &Path, new_package: &Path) -> Result<()> {
    if !dirpath.is_dir() {
        bail!("DIRPATH '{}' not found or not a directory", dirpath.display());
    }

    let package = read_package(dirpath)?;
    package
        .save(new_package)
        .with_context(|| format!("Failed to write package: {}", new_package.display()))?;

    info!("packaged {} items as {}", package.len(), new_package.display());
    Ok(())
}

/// Execute the substitute command
pub fn substitute_command<W: Write>(
    uri_tail: &str,
    src_pkg_path: &Path,
    tgt_pkg_path: &Path,
    result_pkg_path: &Path,
    view: &mut OpcView<W>,
) -> Result<()> {
    ensure_exists(src_pkg_path, "SRC_PKG_PATH")?;
    ensure_exists(tgt_pkg_path, "TGT_PKG_PATH")?;

    let src_package = read_package(src_pkg_path)?;
    let mut tgt_package = read_package(tgt_pkg_path)?;
    let src_item = src_package.find_item_by_uri_tail(uri_tail)?;
    tgt_package.substitute_item(src_item)?;
    tgt_package
        .save(result_pkg_path)
        .with_context(|| format!("Failed to write package: {}", result_pkg_path.display()))?;

    view.substitute(src_item.uri(), src_pkg_path, tgt_pkg_path, result_pkg_path)?;
    Ok(())
}

fn ensure_exists(path: &Path, metavar: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} '{}' does not exist", metavar, path.display());
    }
    Ok(())
}

fn read_package(path: &Path) -> Result<Package> {
    Package::read(path).with_context(|| format!("Failed to read package: {}", path.display()))
}

fn diff_presenter(settings: &Settings) -> DiffPresenter {
    DiffPresenter::new().with_context_lines(settings.diff.context_lines)
}
