//! Authenticated session with the platform.
//!
//! A [`Session`] owns the browser used to log in and the HTTP client used
//! for API calls. It derives two credentials from the browser and caches
//! each for the life of the process:
//!
//! - **cookies**: harvested once from the browser context;
//! - **token**: read from the address the home page redirects to after
//!   login, e.g. `https://mp.weixin.qq.com/cgi-bin/home?t=home/index&lang=zh_CN&token=51146553`.
//!
//! Either cache is only rebuilt when its accessor is called with
//! `refresh = true`.

use crate::api::PlatformClient;
use crate::auth::AuthProvider;
use crate::browser::Browser;
use crate::error::{ArchiveError, Result};
use crate::models::{ArticleListResponse, SearchResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"token=(\d+)").expect("token pattern is valid"));

/// Pull the numeric token out of a post-login address.
///
/// # Errors
///
/// [`ArchiveError::AuthExtraction`] when the address has no `token=<digits>`
/// fragment, typically because login is incomplete or the redirect has not
/// happened yet.
pub fn extract_token(address: &str) -> Result<String> {
    TOKEN_PATTERN
        .captures(address)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ArchiveError::AuthExtraction {
            address: address.to_string(),
        })
}

pub struct Session<B, A> {
    browser: B,
    auth: A,
    client: PlatformClient,
    redirect_settle: Duration,
    authenticated: bool,
    cookies: Option<BTreeMap<String, String>>,
    token: Option<String>,
}

impl<B: Browser, A: AuthProvider> Session<B, A> {
    /// Create an unauthenticated session. `redirect_settle` is the flat delay
    /// allowed for client-side redirects after navigating home.
    pub fn new(browser: B, auth: A, client: PlatformClient, redirect_settle: Duration) -> Self {
        Self {
            browser,
            auth,
            client,
            redirect_settle,
            authenticated: false,
            cookies: None,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Wait for the operator to finish logging in.
    ///
    /// Blocks without a timeout. Once authenticated, further calls return
    /// immediately.
    #[instrument(level = "info", skip_all)]
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.authenticated {
            debug!("Already authenticated");
            return Ok(());
        }
        info!("Waiting for operator to complete login");
        self.auth.await_approval().await?;
        self.authenticated = true;
        info!("Session authenticated");
        Ok(())
    }

    /// Point the browser at the platform's home page, logging in first if needed.
    #[instrument(level = "info", skip_all)]
    pub async fn ensure_on_platform(&mut self) -> Result<()> {
        let home = self.client.home_url().to_string();
        self.browser.navigate(&home).await?;
        if !self.authenticated {
            self.authenticate().await?;
        }
        Ok(())
    }

    /// Cookie mapping of the browser context.
    ///
    /// Later duplicates of a cookie name overwrite earlier ones.
    pub async fn cookies(&mut self, refresh: bool) -> Result<BTreeMap<String, String>> {
        if !refresh {
            if let Some(cached) = &self.cookies {
                return Ok(cached.clone());
            }
        }
        let jar: BTreeMap<String, String> =
            self.browser.cookie_snapshot().await?.into_iter().collect();
        info!(count = jar.len(), "Harvested browser cookies");
        self.cookies = Some(jar.clone());
        Ok(jar)
    }

    /// Session token taken from the post-login redirect.
    pub async fn token(&mut self, refresh: bool) -> Result<String> {
        if !refresh {
            if let Some(cached) = &self.token {
                return Ok(cached.clone());
            }
        }
        self.ensure_on_platform().await?;
        sleep(self.redirect_settle).await;
        let address = self.browser.current_address().await?;
        let token = extract_token(&address)?;
        info!(token_len = token.len(), "Extracted session token");
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Search accounts by name with the session's credentials.
    pub async fn search_accounts(&mut self, query: &str) -> Result<SearchResponse> {
        let token = self.token(false).await?;
        let cookies = self.cookies(false).await?;
        self.client.search_accounts(&token, &cookies, query).await
    }

    /// Fetch one page of an account's articles with the session's credentials.
    pub async fn list_articles(
        &mut self,
        fakeid: &str,
        begin: u32,
        count: u32,
    ) -> Result<ArticleListResponse> {
        let token = self.token(false).await?;
        let cookies = self.cookies(false).await?;
        self.client
            .list_articles(&token, &cookies, fakeid, begin, count)
            .await
    }

    /// Give the browser back, e.g. to close it at exit.
    pub fn into_browser(self) -> B {
        self.browser
    }
}
