//! # mp_archive
//!
//! Archives the articles of public accounts on the WeChat official-account
//! platform (`mp.weixin.qq.com`) as local PDF documents, one directory per
//! account.
//!
//! ## Usage
//!
//! ```sh
//! geckodriver --port 4444 &
//! mp_archive --config mp_archive.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Login**: a visible browser opens the platform; the operator scans the
//!    QR code and confirms on the terminal.
//! 2. **Credentials**: the session token is read from the redirected home
//!    URL and the cookies from the browser, both cached for the run.
//! 3. **Per account**: search → identifier → article count → one page of the
//!    most recent articles.
//! 4. **Output**: each article is rendered to PDF by `wkhtmltopdf`, then a
//!    JSON manifest is written for the account.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod archive;
mod auth;
mod browser;
mod cli;
mod config;
mod error;
mod feed;
mod models;
mod outputs;
mod run;
mod session;
#[cfg(test)]
mod testing;
mod utils;

use api::PlatformClient;
use archive::PdfArchiver;
use auth::ConsolePrompt;
use browser::WebDriverBrowser;
use cli::Cli;
use config::AppConfig;
use session::Session;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("mp_archive starting up");

    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref())?;
    info!(
        accounts = config.accounts.len(),
        output_dir = %config.output_dir.display(),
        webdriver_url = %config.webdriver_url,
        "Loaded configuration"
    );

    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let archiver = PdfArchiver::new(&config.output_dir, config.converter.clone());
    match archiver.converter() {
        Ok(path) => info!(converter = %path.display(), "Found document converter"),
        Err(e) => warn!(error = %e, "Document converter missing; archiving will fail"),
    }

    let client = PlatformClient::new(&config.platform)?;
    let browser = WebDriverBrowser::connect(&config.webdriver_url).await?;
    let mut session = Session::new(
        browser,
        ConsolePrompt::default(),
        client,
        config.redirect_settle(),
    );
    let outcome =
        run::login_and_archive(&mut session, &archiver, &config.accounts, archiver.root()).await;

    if let Err(e) = session.into_browser().close().await {
        warn!(error = %e, "Failed to close browser session");
    }
    let summary = outcome?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        accounts_archived = summary.archived.len(),
        accounts_failed = summary.failed.len(),
        documents = summary.documents(),
        halted = summary.halted,
        "Execution complete"
    );

    if summary.is_success() {
        Ok(())
    } else {
        for (account, e) in &summary.failed {
            error!(%account, error = %e, "Not archived");
        }
        Err(format!("{} account(s) failed", summary.failed.len()).into())
    }
}
