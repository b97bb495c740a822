//! Command-line interface definitions.
//!
//! Accounts, output location and tool paths all live in the configuration
//! file; the command line only says where that file is.

use clap::Parser;
use std::path::PathBuf;

/// Archive the latest articles of WeChat official accounts as PDF documents.
///
/// # Examples
///
/// ```sh
/// # Defaults: built-in account list, WebDriver on localhost:4444
/// mp_archive
///
/// # Custom configuration
/// mp_archive --config ./mp_archive.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "MP_ARCHIVE_CONFIG")]
    pub config: Option<PathBuf>,
}
