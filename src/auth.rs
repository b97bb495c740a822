//! Operator approval of the interactive login.
//!
//! The platform only accepts a QR-code scan from a phone, so the login
//! cannot be automated. [`AuthProvider::await_approval`] blocks until a human
//! says the scan is done.

use crate::error::{ArchiveError, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, instrument};

pub trait AuthProvider {
    /// Block until the operator confirms the out-of-band login step.
    async fn await_approval(&self) -> Result<()>;
}

/// Prompts on the terminal and waits for ENTER.
#[derive(Debug)]
pub struct ConsolePrompt {
    message: String,
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self {
            message: "Scan the QR code in the browser window to log in to any official account, \
                      then press ENTER here to continue."
                .to_string(),
        }
    }
}

impl AuthProvider for ConsolePrompt {
    #[instrument(level = "info", skip_all)]
    async fn await_approval(&self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(self.message.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Err(ArchiveError::ApprovalAborted);
        }
        info!("Operator confirmed login");
        Ok(())
    }
}
