// src/core/scanner/probe.rs

use crate::config::Config;
use crate::core::models::ProbeOutcome;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, redirect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; JsHound/0.1)";
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// A single bounded existence check against one URL.
///
/// The orchestrator only depends on this seam, so its scheduling behavior
/// can be exercised without touching the network.
#[allow(async_fn_in_trait)]
pub trait Probe {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// The real probe: HEAD requests over a shared connection pool.
///
/// A process-wide semaphore bounds how many requests are in flight at once;
/// a permit is held for the duration of one attempt only, never across a
/// backoff sleep. Redirects are disabled, so a 3xx answer classifies as
/// `NotFound` rather than being chased.
pub struct HttpProbe {
    client: Client,
    permits: Arc<Semaphore>,
    retry_count: u32,
    content_types: Vec<String>,
}

impl HttpProbe {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.concurrent_requests)),
            retry_count: config.retry_count,
            content_types: config
                .content_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        })
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        for attempt in 0..=self.retry_count {
            let response = {
                // Scoped so the permit is released before any backoff sleep.
                let _permit = match self.permits.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return ProbeOutcome::Permanent,
                };
                self.client.head(url).send().await
            };

            match response {
                Ok(response) => {
                    // Only an exact 200 counts; redirects land here too since
                    // the client never follows them.
                    if response.status() != StatusCode::OK {
                        return ProbeOutcome::NotFound;
                    }
                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("");
                    if is_script_content_type(content_type, &self.content_types) {
                        return ProbeOutcome::Found {
                            content_type: content_type.to_string(),
                        };
                    }
                    return ProbeOutcome::NotFound;
                }
                // TLS failures are terminal for this URL; the plaintext
                // variant is already queued later in the candidate list.
                Err(err) if is_tls_error(&err) => {
                    debug!(url, error = %err, "TLS failure, abandoning candidate.");
                    return ProbeOutcome::Permanent;
                }
                Err(err) if err.is_timeout() || err.is_connect() => {
                    if attempt < self.retry_count {
                        let wait = RETRY_BASE_DELAY * (attempt + 1);
                        debug!(
                            url,
                            error = %err,
                            wait_secs = wait.as_secs(),
                            "Connection failure, backing off before retry."
                        );
                        tokio::time::sleep(wait).await;
                    } else {
                        debug!(url, error = %err, "Connection failed after all retries.");
                        return ProbeOutcome::Transient;
                    }
                }
                Err(err) => {
                    debug!(url, error = %err, "Unexpected request failure.");
                    return ProbeOutcome::Permanent;
                }
            }
        }

        ProbeOutcome::Transient
    }
}

/// True when a Content-Type header names one of the allowed script types.
/// Matching is case-insensitive and by substring, so parameters like
/// `; charset=utf-8` do not interfere.
fn is_script_content_type(content_type: &str, allowed: &[String]) -> bool {
    if content_type.is_empty() {
        return false;
    }
    let content_type = content_type.to_lowercase();
    allowed.iter().any(|t| content_type.contains(t.as_str()))
}

// Walks the error source chain looking for a secure-transport failure.
// reqwest folds TLS errors into its connect variant, so the chain text is
// the only reliable discriminator.
fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        let message = inner.to_string().to_lowercase();
        if message.contains("tls")
            || message.contains("ssl")
            || message.contains("certificate")
            || message.contains("handshake")
        {
            return true;
        }
        source = inner.source();
    }
    false
}
