//! Per-account resolution, listing and archiving.
//!
//! An [`AccountFeed`] resolves an account name in three dependent steps,
//! caching each result independently:
//!
//! 1. **identifier**: first hit of an account search;
//! 2. **article count**: `app_msg_cnt` of a small listing probe;
//! 3. **articles**: one page of [`PAGE_SIZE`] most recent articles, each
//!    handed to an [`ArticleArchiver`] before it is kept.
//!
//! Only the first page is ever fetched, whatever the total count says.

use crate::archive::ArticleArchiver;
use crate::auth::AuthProvider;
use crate::browser::Browser;
use crate::error::{ArchiveError, Result};
use crate::models::Article;
use crate::session::Session;
use tracing::{error, info, instrument};

/// Page size of the count probe.
pub const COUNT_PROBE_SIZE: u32 = 5;

/// Number of most recent articles fetched and archived per account.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct AccountFeed {
    name: String,
    fakeid: Option<String>,
    article_count: Option<u64>,
    articles: Option<Vec<Article>>,
}

impl AccountFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fakeid: None,
            article_count: None,
            articles: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.fakeid.is_some()
    }

    /// The article list has been fetched and archived.
    pub fn is_populated(&self) -> bool {
        self.articles.is_some()
    }

    /// Internal identifier of the account.
    ///
    /// The first search hit is trusted as the account, however well its
    /// name matches.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Lookup`] when the search returns no accounts.
    #[instrument(level = "info", skip(self, session), fields(account = %self.name))]
    pub async fn resolve_identifier<B: Browser, A: AuthProvider>(
        &mut self,
        session: &mut Session<B, A>,
        refresh: bool,
    ) -> Result<String> {
        if !refresh {
            if let Some(fakeid) = &self.fakeid {
                return Ok(fakeid.clone());
            }
        }

        info!("Searching for account");
        let results = session.search_accounts(&self.name).await?;
        let candidates = results.total;
        let first = results
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ArchiveError::Lookup {
                account: self.name.clone(),
            })?;
        info!(
            nickname = %first.nickname,
            alias = %first.alias,
            fakeid = %first.fakeid,
            candidates,
            "Resolved account"
        );

        self.fakeid = Some(first.fakeid.clone());
        Ok(first.fakeid)
    }

    /// Total number of articles the account has published.
    ///
    /// `refresh` re-issues the count probe only; the identifier stays cached.
    #[instrument(level = "info", skip(self, session), fields(account = %self.name))]
    pub async fn article_count<B: Browser, A: AuthProvider>(
        &mut self,
        session: &mut Session<B, A>,
        refresh: bool,
    ) -> Result<u64> {
        if !refresh {
            if let Some(count) = self.article_count {
                return Ok(count);
            }
        }

        let fakeid = self.resolve_identifier(session, false).await?;
        let probe = session.list_articles(&fakeid, 0, COUNT_PROBE_SIZE).await?;
        info!(count = probe.app_msg_cnt, "Fetched article count");

        self.article_count = Some(probe.app_msg_cnt);
        Ok(probe.app_msg_cnt)
    }

    /// Fetch the most recent page of articles and archive each one, in the
    /// order the platform returns them.
    ///
    /// If archiving any article fails, the remaining articles are skipped,
    /// nothing is cached and the error is returned.
    #[instrument(level = "info", skip(self, session, archiver), fields(account = %self.name))]
    pub async fn articles<B: Browser, A: AuthProvider, S: ArticleArchiver>(
        &mut self,
        session: &mut Session<B, A>,
        archiver: &S,
        refresh: bool,
    ) -> Result<Vec<Article>> {
        if !refresh {
            if let Some(articles) = &self.articles {
                return Ok(articles.clone());
            }
        }

        let fakeid = self.resolve_identifier(session, false).await?;
        let total = self.article_count(session, false).await?;
        let page = session.list_articles(&fakeid, 0, PAGE_SIZE).await?;
        if total > page.app_msg_list.len() as u64 {
            info!(
                total,
                fetched = page.app_msg_list.len(),
                "Only the most recent page is archived"
            );
        }

        let mut articles = Vec::with_capacity(page.app_msg_list.len());
        for raw in page.app_msg_list {
            let article = Article::from_listing(&self.name, raw)?;
            if let Err(e) = archiver.archive(&article).await {
                error!(title = %article.title, error = %e, "Archiving failed; abandoning batch");
                return Err(e);
            }
            articles.push(article);
        }
        info!(count = articles.len(), "Archived articles");

        self.articles = Some(articles.clone());
        Ok(articles)
    }

    /// Cached article count, if fetched.
    pub fn cached_count(&self) -> Option<u64> {
        self.article_count
    }
}
