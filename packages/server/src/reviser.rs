//! The rewrite collaborator.
//!
//! A [`Reviser`] turns the plain-text projection of a chapter into a
//! rewritten plain text. The server never interprets the result beyond
//! lifting it back into a tree, so any text-in/text-out service will do.
//!
//! [`HttpReviser`] calls a remote endpoint:
//!
//! ```text
//! POST {url}
//! { "text": "...", "context": "..." }
//! -> { "text": "..." }
//! ```
//!
//! [`EchoReviser`] returns its input and is installed when no endpoint is
//! configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReviseError
// ---------------------------------------------------------------------------

/// Errors from a single rewrite call.
#[derive(Debug, thiserror::Error)]
pub enum ReviseError {
    /// The HTTP request or response failed (including timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx HTTP status code.
    #[error("rewrite service returned status {0}")]
    BadStatus(u16),
}

/// Text-in/text-out rewrite service.
#[async_trait]
pub trait Reviser: Send + Sync + 'static {
    async fn revise(&self, plain_text: &str, context: &str) -> Result<String, ReviseError>;
}

// ---------------------------------------------------------------------------
// EchoReviser
// ---------------------------------------------------------------------------

/// Returns the input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoReviser;

#[async_trait]
impl Reviser for EchoReviser {
    async fn revise(&self, plain_text: &str, _context: &str) -> Result<String, ReviseError> {
        Ok(plain_text.to_string())
    }
}

// ---------------------------------------------------------------------------
// HttpReviser
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReviseCall<'a> {
    text: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct ReviseReply {
    text: String,
}

/// Calls a remote rewrite endpoint over HTTP.
pub struct HttpReviser {
    client: Client,
    url: String,
}

impl HttpReviser {
    /// Build a reviser for `url`. `timeout` bounds one whole call.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ReviseError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Reviser for HttpReviser {
    async fn revise(&self, plain_text: &str, context: &str) -> Result<String, ReviseError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ReviseCall {
                text: plain_text,
                context,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviseError::BadStatus(status.as_u16()));
        }

        let reply: ReviseReply = response.json().await?;
        Ok(reply.text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
