//! Error types for the archiver.
//!
//! Failures fall into three groups:
//! - **Session**: the shared login session is unusable (token extraction,
//!   browser driver, operator never confirmed). Every account would fail the
//!   same way, so the run halts.
//! - **Account**: the account cannot be resolved or one of its documents
//!   cannot be produced. The account's batch is abandoned.
//! - **Transport**: the platform answered with something we cannot use
//!   (HTTP failure, malformed JSON, platform error envelope).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The post-login address carried no `token=<digits>` fragment.
    #[error("no token found in post-login address {address}")]
    AuthExtraction { address: String },

    /// The account search returned an empty result list.
    #[error("account search for {account:?} returned no results")]
    Lookup { account: String },

    /// The document converter cannot be run at all.
    #[error("document converter unavailable: {reason}")]
    ToolUnavailable { reason: String },

    /// The converter ran but did not produce a document.
    #[error("conversion of {url} failed (exit status {status:?}): {stderr}")]
    Conversion {
        url: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The platform answered with a non-zero `base_resp.ret`.
    #[error("platform rejected request (ret={ret}): {message}")]
    Platform { ret: i64, message: String },

    /// Unexpected status or shape in a platform response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// WebDriver command or session failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// Standard input closed before the operator confirmed the login.
    #[error("login was not confirmed: input closed")]
    ApprovalAborted,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Network and API errors: the platform's answer was unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http(_) | Self::Json(_) | Self::Platform { .. }
        )
    }

    /// Errors of the shared session rather than of a single account.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthExtraction { .. } | Self::Browser(_) | Self::ApprovalAborted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_grouping() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(ArchiveError::Json(json_err).is_transport());
        assert!(ArchiveError::Transport("status 502".into()).is_transport());
        assert!(
            ArchiveError::Platform {
                ret: 200013,
                message: "freq control".into()
            }
            .is_transport()
        );
        assert!(
            !ArchiveError::Lookup {
                account: "x".into()
            }
            .is_transport()
        );
    }

    #[test]
    fn test_session_fatal_grouping() {
        assert!(
            ArchiveError::AuthExtraction {
                address: "https://mp.weixin.qq.com/".into()
            }
            .is_session_fatal()
        );
        assert!(ArchiveError::Browser("gone".into()).is_session_fatal());
        assert!(ArchiveError::ApprovalAborted.is_session_fatal());
        assert!(
            !ArchiveError::ToolUnavailable {
                reason: "missing".into()
            }
            .is_session_fatal()
        );
    }

    #[test]
    fn test_display_mentions_account() {
        let err = ArchiveError::Lookup {
            account: "量子位".into(),
        };
        assert!(err.to_string().contains("量子位"));
    }
}
