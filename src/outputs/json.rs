//! Per-account JSON manifest.
//!
//! Written once an account's batch has fully succeeded, next to its
//! documents:
//!
//! ```text
//! output_dir/
//! └── {account}/
//!     └── articles.json
//! ```

use crate::error::Result;
use crate::models::{AccountManifest, Article};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const MANIFEST_FILE: &str = "articles.json";

/// Write `articles.json` into `account_dir`, replacing any previous manifest.
#[instrument(level = "info", skip_all, fields(account = %account, dir = %account_dir.display()))]
pub async fn write_manifest(
    account_dir: &Path,
    account: &str,
    fakeid: &str,
    total_articles: u64,
    articles: &[Article],
) -> Result<PathBuf> {
    let manifest = AccountManifest {
        account,
        fakeid,
        total_articles,
        archived_at: Local::now().to_rfc3339(),
        articles,
    };
    let json = serde_json::to_string_pretty(&manifest)?;

    if let Err(e) = fs::create_dir_all(account_dir).await {
        error!(error = %e, "Failed to create account directory");
        return Err(e.into());
    }
    let path = account_dir.join(MANIFEST_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), count = articles.len(), "Wrote manifest");
    Ok(path)
}
