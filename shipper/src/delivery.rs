//! Delivery of prepared lines to the ingestion endpoint.
//!
//! One POST per batch, retried with exponential backoff on transport errors
//! and 5xx responses. 4xx responses are final.

use crate::config::Config;
use crate::models::{IngestLine, IngestPayload};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Missing LogDNA ingestion key")]
    MissingKey,
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Request failed: {0}")]
    Request(reqwest::Error),
    #[error("Ingestion endpoint rejected the batch with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// HTTP client for the ingestion endpoint, shared across requests
#[derive(Debug, Clone)]
pub struct Shipper {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl Shipper {
    pub fn new(config: Arc<Config>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_idle_timeout(config.free_socket_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self { client, config })
    }

    /// Ship one batch. Returns the endpoint's response body.
    pub async fn send_lines(&self, lines: &[IngestLine]) -> Result<String, DeliveryError> {
        let Some(key) = self.config.key.as_deref() else {
            error!("Skipping delivery: no ingestion key configured");
            return Err(DeliveryError::MissingKey);
        };
        let Some(first) = lines.first() else {
            debug!("Nothing to deliver");
            return Ok(String::new());
        };

        let hostname = self
            .config
            .hostname
            .clone()
            .unwrap_or_else(|| first.meta.metadata.log.group.clone());
        let tags = self
            .config
            .tags
            .iter()
            .chain(first.meta.metadata.event.tags.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let body = serde_json::to_vec(&IngestPayload::new(lines))?;

        let max_attempts = self.config.max_request_retries.max(1);
        let mut attempts = 0;

        loop {
            let time = Instant::now();
            attempts += 1;

            let resp = self
                .client
                .post(&self.config.ingest_url)
                .query(&[("tags", tags.as_str()), ("hostname", hostname.as_str())])
                .basic_auth(key, None::<&str>)
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(body.clone())
                .send()
                .await;
            let elapsed = time.elapsed();

            let last = match resp {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        info!(
                            "Delivered {} lines for '{}' in {} ms ({} attempts)",
                            lines.len(),
                            hostname,
                            elapsed.as_millis(),
                            attempts
                        );
                        return Ok(resp.text().await.unwrap_or_default());
                    }
                    if !status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        error!("Ingestion endpoint rejected batch: {} {}", status, body);
                        return Err(DeliveryError::Rejected { status, body });
                    }
                    format!("server error {}", status)
                }
                Err(e) if is_retryable(&e) => e.to_string(),
                Err(e) => {
                    error!("Request failed and will not be retried: {}", e);
                    return Err(DeliveryError::Request(e));
                }
            };

            if attempts >= max_attempts {
                error!(
                    "Failed to deliver {} lines after {} attempts: {}",
                    lines.len(),
                    attempts,
                    last
                );
                return Err(DeliveryError::RetriesExhausted { attempts, last });
            }

            let wait = backoff(self.config.retry_interval, attempts);
            warn!(
                "Delivery attempt {} failed after {} ms ({}), retrying in {} ms",
                attempts,
                elapsed.as_millis(),
                last,
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

fn is_retryable(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

/// `interval * 2^attempt`
fn backoff(interval: Duration, attempt: u32) -> Duration {
    interval.saturating_mul(1u32 << attempt.min(16))
}
