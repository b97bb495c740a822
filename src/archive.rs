//! Article persistence through an external HTML-to-PDF converter.
//!
//! Documents are laid out as:
//!
//! ```text
//! output_dir/
//! └── {account}/
//!     ├── {description}.pdf
//!     └── articles.json        (see outputs::json)
//! ```

use crate::error::{ArchiveError, Result};
use crate::models::Article;
use crate::utils::{sanitize_file_stem, truncate_for_log};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{info, instrument};

/// Binary looked up on `PATH` when no converter path is configured.
pub const CONVERTER_BIN: &str = "wkhtmltopdf";

/// Directory holding one account's documents under `root`.
pub fn account_dir(root: &Path, account: &str) -> PathBuf {
    root.join(sanitize_file_stem(account))
}

/// Produces one local document per article.
pub trait ArticleArchiver {
    /// Render `article` to a local document and return its path.
    async fn archive(&self, article: &Article) -> Result<PathBuf>;
}

/// [`ArticleArchiver`] that runs `wkhtmltopdf` against each article URL.
#[derive(Debug, Clone)]
pub struct PdfArchiver {
    root: PathBuf,
    converter: Option<PathBuf>,
}

impl PdfArchiver {
    /// `converter` overrides the `PATH` lookup of [`CONVERTER_BIN`].
    pub fn new(root: impl Into<PathBuf>, converter: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            converter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `article` is written.
    pub fn document_path(&self, article: &Article) -> PathBuf {
        account_dir(&self.root, &article.source_account)
            .join(format!("{}.pdf", article.file_stem()))
    }

    /// Locate the converter binary.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ToolUnavailable`] if the configured path is not a file
    /// or the binary is not on `PATH`.
    pub fn converter(&self) -> Result<PathBuf> {
        match &self.converter {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(ArchiveError::ToolUnavailable {
                reason: format!("configured converter {} does not exist", path.display()),
            }),
            None => which::which(CONVERTER_BIN).map_err(|e| ArchiveError::ToolUnavailable {
                reason: format!(
                    "{CONVERTER_BIN} not found in PATH ({e}); \
                     install it from https://wkhtmltopdf.org"
                ),
            }),
        }
    }
}

impl ArticleArchiver for PdfArchiver {
    #[instrument(
        level = "info",
        skip_all,
        fields(account = %article.source_account, aid = %article.aid)
    )]
    async fn archive(&self, article: &Article) -> Result<PathBuf> {
        let converter = self.converter()?;
        let output_path = self.document_path(article);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let output = Command::new(&converter)
            .arg("--quiet")
            .arg(&article.link)
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| ArchiveError::ToolUnavailable {
                reason: format!("failed to execute {}: {e}", converter.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArchiveError::Conversion {
                url: article.link.clone(),
                status: output.status.code(),
                stderr: truncate_for_log(stderr.trim(), 300),
            });
        }

        info!(title = %article.title, path = %output_path.display(), "Archived article");
        Ok(output_path)
    }
}
