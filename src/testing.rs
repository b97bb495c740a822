//! In-memory stand-ins for the browser, the operator and the converter.

use crate::api::PlatformClient;
use crate::archive::ArticleArchiver;
use crate::auth::AuthProvider;
use crate::browser::Browser;
use crate::config::PlatformSettings;
use crate::error::{ArchiveError, Result};
use crate::models::Article;
use crate::session::Session;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

pub const HOME_ADDRESS: &str =
    "https://mp.weixin.qq.com/cgi-bin/home?t=home/index&lang=zh_CN&token=51146553";

#[derive(Default)]
struct BrowserState {
    address: String,
    cookies: Vec<(String, String)>,
    navigations: Vec<String>,
    address_reads: usize,
    cookie_reads: usize,
}

/// Browser whose address and cookies are set by the test.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<BrowserState>>,
}

impl FakeBrowser {
    pub fn at(address: &str) -> Self {
        let browser = Self::default();
        browser.set_address(address);
        browser
    }

    pub fn with_cookies(self, cookies: &[(&str, &str)]) -> Self {
        self.state.lock().unwrap().cookies = cookies
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn set_address(&self, address: &str) {
        self.state.lock().unwrap().address = address.to_string();
    }

    pub fn navigations(&self) -> usize {
        self.state.lock().unwrap().navigations.len()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.state.lock().unwrap().navigations.last().cloned()
    }

    pub fn address_reads(&self) -> usize {
        self.state.lock().unwrap().address_reads
    }

    pub fn cookie_reads(&self) -> usize {
        self.state.lock().unwrap().cookie_reads
    }
}

impl Browser for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn current_address(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.address_reads += 1;
        Ok(state.address.clone())
    }

    async fn cookie_snapshot(&self) -> Result<Vec<(String, String)>> {
        let mut state = self.state.lock().unwrap();
        state.cookie_reads += 1;
        Ok(state.cookies.clone())
    }
}

/// Operator who approves immediately.
#[derive(Clone, Default)]
pub struct InstantApproval {
    approvals: Arc<AtomicUsize>,
}

impl InstantApproval {
    pub fn approvals(&self) -> usize {
        self.approvals.load(Ordering::SeqCst)
    }
}

impl AuthProvider for InstantApproval {
    async fn await_approval(&self) -> Result<()> {
        self.approvals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Operator who closes the prompt without confirming.
#[derive(Clone, Copy, Default)]
pub struct RefusingApproval;

impl AuthProvider for RefusingApproval {
    async fn await_approval(&self) -> Result<()> {
        Err(ArchiveError::ApprovalAborted)
    }
}

/// Converter that records what it was given and can fail on the n-th call.
#[derive(Clone, Default)]
pub struct FakeArchiver {
    archived: Arc<Mutex<Vec<String>>>,
    fail_on_call: Option<usize>,
}

impl FakeArchiver {
    /// Fail with [`ArchiveError::ToolUnavailable`] on call number `call` (1-based).
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    /// Article ids passed to `archive`, including a failing one.
    pub fn attempted(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }
}

impl ArticleArchiver for FakeArchiver {
    async fn archive(&self, article: &Article) -> Result<PathBuf> {
        let call = {
            let mut archived = self.archived.lock().unwrap();
            archived.push(article.aid.clone());
            archived.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(ArchiveError::ToolUnavailable {
                reason: "wkhtmltopdf not found".to_string(),
            });
        }
        Ok(PathBuf::from(&article.source_account).join(format!("{}.pdf", article.aid)))
    }
}

pub fn client_at(base_url: &str) -> PlatformClient {
    PlatformClient::new(&PlatformSettings {
        base_url: base_url.to_string(),
        ..PlatformSettings::default()
    })
    .unwrap()
}

/// Session whose API client points at an unused local port.
pub fn offline_session(
    browser: FakeBrowser,
    auth: InstantApproval,
) -> Session<FakeBrowser, InstantApproval> {
    Session::new(browser, auth, client_at("http://127.0.0.1:9/"), Duration::ZERO)
}

/// Logged-in-ready session whose API client talks to `server`.
pub fn mock_session(server: &MockServer) -> Session<FakeBrowser, InstantApproval> {
    mock_session_with(
        server,
        FakeBrowser::at(HOME_ADDRESS).with_cookies(&[("slave_sid", "abc")]),
    )
}

/// Session over `browser` whose API client talks to `server`.
pub fn mock_session_with(
    server: &MockServer,
    browser: FakeBrowser,
) -> Session<FakeBrowser, InstantApproval> {
    Session::new(
        browser,
        InstantApproval::default(),
        client_at(&server.uri()),
        Duration::ZERO,
    )
}
