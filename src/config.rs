//! Runtime configuration loaded from a YAML file.
//!
//! Every field has a default, so a missing file or a partial file both work:
//!
//! ```yaml
//! accounts:
//!   - 量子位
//!   - DeepTech深科技
//! output_dir: ./collected
//! converter: /usr/local/bin/wkhtmltopdf
//! webdriver_url: http://localhost:4444
//! redirect_settle_ms: 2000
//! platform:
//!   base_url: https://mp.weixin.qq.com/
//! ```

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Top-level configuration for one archiving run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Account names to search for, processed in order.
    pub accounts: Vec<String>,
    /// Root collection directory; one subdirectory per account.
    pub output_dir: PathBuf,
    /// Explicit path to `wkhtmltopdf`. Looked up on `PATH` when absent.
    pub converter: Option<PathBuf>,
    /// WebDriver endpoint (geckodriver, chromedriver).
    pub webdriver_url: String,
    /// Flat delay after navigation so client-side redirects can settle.
    pub redirect_settle_ms: u64,
    pub platform: PlatformSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: vec!["量子位".to_string(), "DeepTech深科技".to_string()],
            output_dir: PathBuf::from("公众号文章爬取合集"),
            converter: None,
            webdriver_url: "http://localhost:4444".to_string(),
            redirect_settle_ms: 2000,
            platform: PlatformSettings::default(),
        }
    }
}

/// Connection settings for the platform's internal API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Home surface; also the base the API paths are joined onto.
    pub base_url: String,
    /// Fixed `Host` header sent with every API request.
    pub host: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: "https://mp.weixin.qq.com/".to_string(),
            host: "mp.weixin.qq.com".to_string(),
            user_agent:
                "Mozilla/5.0 (Windows NT 6.1; OWW64; rv:53.0) Gecko/20100101 Firefox/53.0"
                    .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn redirect_settle(&self) -> Duration {
        Duration::from_millis(self.redirect_settle_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.accounts.iter().any(|name| name.trim().is_empty()) {
            return Err(ArchiveError::Config(
                "account names must not be blank".to_string(),
            ));
        }
        url::Url::parse(&self.platform.base_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_platform() {
        let config = AppConfig::default();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.platform.host, "mp.weixin.qq.com");
        assert_eq!(config.redirect_settle(), Duration::from_secs(2));
        assert!(config.converter.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "accounts: [\"机器之心\"]\nredirect_settle_ms: 500\nplatform:\n  request_timeout_secs: 5\n",
        )
        .unwrap();
        assert_eq!(config.accounts, vec!["机器之心".to_string()]);
        assert_eq!(config.redirect_settle_ms, 500);
        assert_eq!(config.platform.request_timeout_secs, 5);
        assert_eq!(config.platform.base_url, "https://mp.weixin.qq.com/");
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }

    #[test]
    fn test_blank_account_rejected() {
        let err = AppConfig::from_yaml("accounts: [\"  \"]\n").unwrap_err();
        assert!(matches!(err, ArchiveError::Config(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = AppConfig::from_yaml("platform:\n  base_url: not a url\n").unwrap_err();
        assert!(matches!(err, ArchiveError::Url(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output_dir: /tmp/archive\nconverter: /opt/wkhtmltopdf").unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/archive"));
        assert_eq!(config.converter, Some(PathBuf::from("/opt/wkhtmltopdf")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/mp_archive.yaml"))).unwrap_err();
        assert!(matches!(err, ArchiveError::Config(_)));
    }
}
