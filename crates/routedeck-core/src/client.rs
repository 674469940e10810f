//! # Routing Backend Client
//!
//! Thin HTTP client for the routing backend. One endpoint matters to the
//! dashboard, `GET <base_url>/decisions`; there is no retry, timeout or
//! caching policy here. Staleness handling lives in [`crate::store`].

use thiserror::Error;

use crate::decision::DecisionsPayload;

/// Errors crossing the data-source boundary.
///
/// `Status`, `Transport` and `Decode` come from the HTTP source, `Io` and
/// `Parse` from the JSONL file source. The dashboard surfaces these through
/// their `Display` form, so the messages carry everything the operator sees.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response from the backend.
    #[error("failed to fetch decisions: {status}")]
    Status { status: u16 },

    /// Connection, DNS or timeout failure before any response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose body was not a valid decisions payload.
    #[error("malformed decisions payload: {0}")]
    Decode(#[source] reqwest::Error),

    /// Decision log file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Decision log line that is not a valid decision record.
    #[error("{path}:{line}: malformed decision record: {source}")]
    Parse {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// [`reqwest::Client`] bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct DecisionsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DecisionsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Backend base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn decisions_url(&self) -> String {
        format!("{}/decisions", self.base_url.trim_end_matches('/'))
    }

    /// Fetch the full decisions payload.
    ///
    /// A non-2xx status becomes [`FetchError::Status`] carrying the code;
    /// error response bodies are not inspected.
    pub async fn fetch_decisions(&self) -> Result<DecisionsPayload, FetchError> {
        let url = self.decisions_url();
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<DecisionsPayload>()
            .await
            .map_err(FetchError::Decode)
    }
}
