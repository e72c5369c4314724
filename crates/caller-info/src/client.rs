//! HTTP client for the caller-info lookup service
//!
//! One POST per lookup, no retry. The server wraps every answer in a
//! `{status, data, error}` envelope and reports application failures
//! through `status != 1`, sometimes alongside non-2xx HTTP codes; the body
//! is therefore parsed regardless of the HTTP status line.

use std::time::Duration;

use tracing::{debug, error};

use crate::config::LookupConfig;
use crate::error::{LookupError, Result};
use crate::types::{CallerInfo, LookupEnvelope, LookupRequest};

const LOOKUP_ENDPOINT: &str = "/v1/caller-info/lookup";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

/// Client for the remote caller-info lookup API.
///
/// # Examples
///
/// ```rust,no_run
/// use ringside_caller_info::{CallerInfoClient, LookupConfig};
///
/// # tokio_test::block_on(async {
/// let client = CallerInfoClient::new(LookupConfig::default())?;
/// let info = client.lookup("+1 555-0100").await?;
/// if info.has_info() {
///     println!("caller: {:?}", info.name);
/// }
/// # Ok::<(), ringside_caller_info::LookupError>(())
/// # });
/// ```
pub struct CallerInfoClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl CallerInfoClient {
    /// Build a client with the 5 s connect / 7 s request timeouts.
    pub fn new(config: LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &url::Url {
        &self.config.base_url
    }

    /// Look up a phone number.
    ///
    /// Resolves to exactly one terminal outcome: the parsed [`CallerInfo`],
    /// or one of `Api` / `Network` / `Timeout` / `InvalidResponse`.
    pub async fn lookup(&self, phone_number: &str) -> Result<CallerInfo> {
        // Plain concatenation: the base URL may carry a path segment
        // ("/ct") that a relative-URL join would swallow.
        let endpoint = format!(
            "{}{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            LOOKUP_ENDPOINT
        );
        debug!("caller lookup for {} via {}", phone_number, endpoint);

        let response = self
            .http
            .post(&endpoint)
            .json(&LookupRequest { phone_number })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    error!("lookup request failed: {}", e);
                    LookupError::Network(e.to_string())
                }
            })?;

        let http_status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::Network(e.to_string())
            }
        })?;
        debug!("lookup response: http {} body {}", http_status, body);

        let envelope: LookupEnvelope = serde_json::from_str(&body)
            .map_err(|e| LookupError::InvalidResponse(format!("bad envelope: {e}")))?;

        if envelope.status != 1 {
            let message = envelope
                .error
                .unwrap_or_else(|| "Unknown API error".to_string());
            return Err(LookupError::Api(message));
        }

        let data = envelope
            .data
            .ok_or_else(|| LookupError::InvalidResponse("success without data".to_string()))?;

        Ok(CallerInfo {
            name: data.name,
            campus: data.campus,
            status: data.status,
            remark: data.remark,
            phone_number: phone_number.to_string(),
            found: data.found,
        })
    }
}
