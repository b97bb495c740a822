//! Data models for the platform's API payloads and archived articles.
//!
//! - [`SearchResponse`] / [`AccountHit`]: account search results
//! - [`ArticleListResponse`] / [`RawArticle`]: one page of an account's articles
//! - [`Article`]: an article projected out of a listing, ready to archive
//! - [`AccountManifest`]: the per-account record written after a batch
//!
//! Wire structs keep the platform's snake_case field names and ignore any
//! fields we do not use.

use crate::error::{ArchiveError, Result};
use crate::utils::{MAX_STEM_BYTES, clean_file_name, fit_file_stem, format_day};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Status block attached to every platform response.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseResp {
    pub ret: i64,
    #[serde(default)]
    pub err_msg: String,
}

/// Response of the `searchbiz` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub list: Vec<AccountHit>,
    #[serde(default)]
    pub total: u64,
}

/// One account returned by a search.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountHit {
    /// Internal identifier ("fakeid") required by listing queries.
    pub fakeid: String,
    /// Display name.
    pub nickname: String,
    #[serde(default)]
    pub alias: String,
}

/// Response of the `appmsg` listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleListResponse {
    /// Total number of articles the account has published.
    pub app_msg_cnt: u64,
    #[serde(default)]
    pub app_msg_list: Vec<RawArticle>,
}

/// An article object as it appears in `app_msg_list`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub aid: String,
    pub copyright_type: i64,
    pub cover: String,
    pub create_time: i64,
    pub digest: String,
    pub link: String,
    pub title: String,
    pub update_time: i64,
}

/// Provenance of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyrightType {
    Original,
    OriginalAlt,
    Reprint,
}

impl CopyrightType {
    /// Map the platform's numeric `copyright_type`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Original),
            1 => Some(Self::OriginalAlt),
            2 => Some(Self::Reprint),
            _ => None,
        }
    }
}

/// An article of one account, as listed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub source_account: String,
    pub aid: String,
    pub copyright: CopyrightType,
    pub cover_url: String,
    /// Epoch seconds.
    pub create_time: i64,
    pub digest: String,
    /// Canonical article URL; the converter renders this page.
    pub link: String,
    pub title: String,
    /// Epoch seconds.
    pub update_time: i64,
}

impl Article {
    /// Project a listing item into an [`Article`] owned by `account`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Transport`] if `copyright_type` is not one of 0, 1, 2.
    pub fn from_listing(account: &str, raw: RawArticle) -> Result<Self> {
        let copyright = CopyrightType::from_code(raw.copyright_type).ok_or_else(|| {
            ArchiveError::Transport(format!(
                "article {} has unrecognised copyright_type {}",
                raw.aid, raw.copyright_type
            ))
        })?;
        Ok(Self {
            source_account: account.to_string(),
            aid: raw.aid,
            copyright,
            cover_url: raw.cover,
            create_time: raw.create_time,
            digest: raw.digest,
            link: raw.link,
            title: raw.title,
            update_time: raw.update_time,
        })
    }

    /// Human-readable description, dates rendered in local time.
    pub fn description(&self) -> String {
        self.description_in(&Local)
    }

    /// Human-readable description with dates rendered in `tz`.
    ///
    /// `{title}：{link}（{account}于{created}发布，最近一次更新时间：{updated}）`
    pub fn description_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}：{}（{}于{}发布，最近一次更新时间：{}）",
            self.title,
            self.link,
            self.source_account,
            format_day(self.create_time, tz),
            format_day(self.update_time, tz),
        )
    }

    /// Filesystem-safe stem derived from [`Article::description`].
    pub fn file_stem(&self) -> String {
        self.file_stem_in(&Local)
    }

    /// File stem with dates rendered in `tz`.
    ///
    /// The whole description is used when it fits. Otherwise the link is
    /// dropped, the title shortened and the `aid` appended, so distinct
    /// articles never share a stem.
    pub fn file_stem_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let full = clean_file_name(&self.description_in(tz));
        if !full.is_empty() && full.len() <= MAX_STEM_BYTES {
            return full;
        }
        let tail = format!(
            "（{}于{}发布，最近一次更新时间：{}）_{}",
            self.source_account,
            format_day(self.create_time, tz),
            format_day(self.update_time, tz),
            self.aid,
        );
        fit_file_stem(&self.title, &tail)
    }
}

/// Record of one account's archived batch, written next to its documents.
#[derive(Debug, Serialize)]
pub struct AccountManifest<'a> {
    pub account: &'a str,
    pub fakeid: &'a str,
    pub total_articles: u64,
    /// RFC 3339 local time of the write.
    pub archived_at: String,
    pub articles: &'a [Article],
}
