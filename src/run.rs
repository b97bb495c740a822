//! The outer loop over configured accounts.
//!
//! Accounts are processed one after another. A failure confined to one
//! account (lookup, conversion, a bad response) is recorded and the loop
//! moves on. A failure of the shared session halts the loop, since every
//! remaining account would hit it too.

use crate::archive::{ArticleArchiver, account_dir};
use crate::auth::AuthProvider;
use crate::browser::Browser;
use crate::error::{ArchiveError, Result};
use crate::feed::AccountFeed;
use crate::outputs::json::write_manifest;
use crate::session::Session;
use std::path::Path;
use tracing::{error, info, instrument, warn};

/// Outcome of one run over the configured accounts.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Accounts whose batch fully succeeded, with the number of documents.
    pub archived: Vec<(String, usize)>,
    /// Accounts that failed, with the error that stopped them.
    pub failed: Vec<(String, ArchiveError)>,
    /// The session became unusable and later accounts were not attempted.
    pub halted: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.halted
    }

    pub fn documents(&self) -> usize {
        self.archived.iter().map(|(_, n)| n).sum()
    }
}

/// Bring the session onto the platform, logging in if needed, then archive
/// every account.
///
/// The session is left intact on error so the caller can still close its
/// browser.
pub async fn login_and_archive<B, A, S>(
    session: &mut Session<B, A>,
    archiver: &S,
    accounts: &[String],
    output_dir: &Path,
) -> Result<RunSummary>
where
    B: Browser,
    A: AuthProvider,
    S: ArticleArchiver,
{
    session.ensure_on_platform().await?;
    Ok(archive_accounts(session, archiver, accounts, output_dir).await)
}

/// Archive the most recent articles of every account in `accounts`.
#[instrument(level = "info", skip_all, fields(accounts = accounts.len()))]
pub async fn archive_accounts<B, A, S>(
    session: &mut Session<B, A>,
    archiver: &S,
    accounts: &[String],
    output_dir: &Path,
) -> RunSummary
where
    B: Browser,
    A: AuthProvider,
    S: ArticleArchiver,
{
    let mut summary = RunSummary::default();
    for name in accounts {
        info!(account = %name, "Collecting articles");
        let mut feed = AccountFeed::new(name.clone());
        match archive_account(&mut feed, session, archiver, output_dir).await {
            Ok(count) => {
                info!(account = %name, count, "Account archived");
                summary.archived.push((name.clone(), count));
            }
            Err(e) => {
                error!(
                    account = %name,
                    error = %e,
                    transport = e.is_transport(),
                    resolved = feed.is_resolved(),
                    populated = feed.is_populated(),
                    article_count = feed.cached_count(),
                    "Account failed"
                );
                let fatal = e.is_session_fatal();
                summary.failed.push((name.clone(), e));
                if fatal {
                    warn!(
                        authenticated = session.is_authenticated(),
                        "Session is unusable; remaining accounts skipped"
                    );
                    summary.halted = true;
                    break;
                }
            }
        }
    }
    summary
}

async fn archive_account<B, A, S>(
    feed: &mut AccountFeed,
    session: &mut Session<B, A>,
    archiver: &S,
    output_dir: &Path,
) -> Result<usize>
where
    B: Browser,
    A: AuthProvider,
    S: ArticleArchiver,
{
    let articles = feed.articles(session, archiver, false).await?;
    // Both are cached by now.
    let fakeid = feed.resolve_identifier(session, false).await?;
    let total = feed.article_count(session, false).await?;
    write_manifest(
        &account_dir(output_dir, feed.name()),
        feed.name(),
        &fakeid,
        total,
        &articles,
    )
    .await?;
    Ok(articles.len())
}
