//! Browser capability used by the login session.
//!
//! The session only ever needs three things from a browser: go somewhere,
//! report where it ended up, and hand over its cookies. [`Browser`] captures
//! exactly that so token and cookie extraction can run against a fake.
//! [`WebDriverBrowser`] is the real implementation, driving Firefox or Chrome
//! through a WebDriver server with `fantoccini`.

use crate::error::{ArchiveError, Result};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, info, instrument};

/// Narrow view of a live browser context.
pub trait Browser {
    /// Load `url` in the current window.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Address of the page currently shown, after any redirects.
    async fn current_address(&self) -> Result<String>;

    /// All cookies held by the context, as `(name, value)` pairs in the
    /// order the driver reports them.
    async fn cookie_snapshot(&self) -> Result<Vec<(String, String)>>;
}

/// [`Browser`] backed by a WebDriver session.
///
/// The window must stay visible: the operator scans the login QR code in it.
pub struct WebDriverBrowser {
    client: Client,
}

fn driver_error(context: &str, e: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Browser(format!("{context}: {e}"))
}

impl WebDriverBrowser {
    /// Open a new browser session on the WebDriver server at `webdriver_url`.
    #[instrument(level = "info")]
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        let client = ClientBuilder::native()
            .connect(webdriver_url)
            .await
            .map_err(|e| driver_error("failed to start WebDriver session", e))?;
        info!("WebDriver session started");
        Ok(Self { client })
    }

    /// End the WebDriver session and close the window.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| driver_error("failed to close WebDriver session", e))
    }
}

impl Browser for WebDriverBrowser {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| driver_error("navigation failed", e))
    }

    async fn current_address(&self) -> Result<String> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| driver_error("cannot read current URL", e))?;
        debug!(host = url.host_str(), path = url.path(), "Current browser address");
        Ok(url.to_string())
    }

    async fn cookie_snapshot(&self) -> Result<Vec<(String, String)>> {
        let cookies = self
            .client
            .get_all_cookies()
            .await
            .map_err(|e| driver_error("cannot read cookies", e))?;
        Ok(cookies
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect())
    }
}
