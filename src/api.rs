//! Client for the platform's internal JSON API.
//!
//! Two endpoints are used, both plain `GET`s that need a logged-in token and
//! the browser's cookies:
//!
//! | Endpoint | Path | Purpose |
//! |----------|------|---------|
//! | search | `cgi-bin/searchbiz` | account name → internal identifier (`fakeid`) |
//! | listing | `cgi-bin/appmsg` | `fakeid` → article count and one page of articles |
//!
//! Every response carries a `base_resp` status block. A non-zero `ret`
//! (expired login, frequency control) is reported as
//! [`ArchiveError::Platform`] before the body is interpreted.

use crate::config::PlatformSettings;
use crate::error::{ArchiveError, Result};
use crate::models::{ArticleListResponse, BaseResp, SearchResponse};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use rand::{Rng, rng};
use reqwest::header::{COOKIE, HOST, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

const SEARCH_PATH: &str = "cgi-bin/searchbiz";
const LIST_PATH: &str = "cgi-bin/appmsg";

/// Number of search hits requested; only the first is used.
pub const SEARCH_LIMIT: u32 = 5;

/// Query parameters shared by every API call.
fn common_params(token: &str) -> Vec<(&'static str, String)> {
    vec![
        ("token", token.to_string()),
        ("lang", "zh_CN".to_string()),
        ("f", "json".to_string()),
        ("ajax", "1".to_string()),
        // Anti-cache value; the platform ignores its content.
        ("random", rng().random::<f64>().to_string()),
    ]
}

/// Render a cookie mapping as a `Cookie` header value.
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PlatformClient {
    pub fn new(settings: &PlatformSettings) -> Result<Self> {
        let mut base_url = Url::parse(&settings.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let host = HeaderValue::from_str(&settings.host).map_err(|e| {
            ArchiveError::Config(format!("invalid host header {:?}: {e}", settings.host))
        })?;
        headers.insert(HOST, host);

        let http = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// The platform's home surface.
    pub fn home_url(&self) -> &Url {
        &self.base_url
    }

    /// Search accounts by free-text `query`, requesting the first
    /// [`SEARCH_LIMIT`] matches.
    #[instrument(level = "info", skip(self, token, cookies))]
    pub async fn search_accounts(
        &self,
        token: &str,
        cookies: &BTreeMap<String, String>,
        query: &str,
    ) -> Result<SearchResponse> {
        let mut params = common_params(token);
        params.extend([
            ("action", "search_biz".to_string()),
            ("query", query.to_string()),
            ("begin", "0".to_string()),
            ("count", SEARCH_LIMIT.to_string()),
        ]);
        self.get_json(SEARCH_PATH, &params, cookies).await
    }

    /// Fetch one page of the account identified by `fakeid`, most recent first.
    #[instrument(level = "info", skip(self, token, cookies))]
    pub async fn list_articles(
        &self,
        token: &str,
        cookies: &BTreeMap<String, String>,
        fakeid: &str,
        begin: u32,
        count: u32,
    ) -> Result<ArticleListResponse> {
        let mut params = common_params(token);
        params.extend([
            ("action", "list_ex".to_string()),
            ("begin", begin.to_string()),
            ("count", count.to_string()),
            ("query", String::new()),
            ("fakeid", fakeid.to_string()),
            ("type", "9".to_string()),
        ]);
        self.get_json(LIST_PATH, &params, cookies).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        cookies: &BTreeMap<String, String>,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        let t0 = Instant::now();
        let response = self
            .http
            .get(url)
            .query(params)
            .header(COOKIE, cookie_header(cookies))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            %status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Platform responded"
        );

        if !status.is_success() {
            return Err(ArchiveError::Transport(format!(
                "{path} returned HTTP {status}: {}",
                truncate_for_log(&body, 200)
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(base) = value.get("base_resp") {
            let base: BaseResp = serde_json::from_value(base.clone())?;
            if base.ret != 0 {
                warn!(ret = base.ret, err_msg = %base.err_msg, "Platform rejected request");
                return Err(ArchiveError::Platform {
                    ret: base.ret,
                    message: base.err_msg,
                });
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}
