use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use thiserror::Error;
use url::Url;

use crate::post::{NewPost, PostId, RawPost};

/// Failure of one API call. Callers need to tell a dead network apart from
/// a server that answered with an error, so the two are separate variants
/// and the server's own detail rides along when the body provides one.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server returned {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context as _;

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build reqwest client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET the whole collection, in server order. Retries on 429/503 with
    /// Retry-After-aware backoff; reads are idempotent, mutations below
    /// never retry.
    pub async fn list(&self) -> Result<Vec<RawPost>, ApiError> {
        let mut backoff = Duration::from_millis(250);
        let max_attempts = 5usize;
        let mut last_status = StatusCode::SERVICE_UNAVAILABLE;

        for attempt in 1..=max_attempts {
            let resp = self
                .client
                .get(self.base_url.clone())
                .send()
                .await
                .map_err(ApiError::Transport)?;

            let status = resp.status();
            if status.is_success() {
                return resp.json().await.map_err(ApiError::Transport);
            }

            if status.as_u16() == 429 || status.as_u16() == 503 {
                last_status = status;
                if attempt == max_attempts {
                    break;
                }
                let wait = retry_after_duration(resp.headers()).unwrap_or(backoff);
                tracing::warn!(
                    %status,
                    attempt,
                    wait_ms = wait.as_millis(),
                    "throttled; backing off"
                );
                tokio::time::sleep(wait).await;
                backoff = (backoff * 2).min(Duration::from_secs(10));
                continue;
            }

            return Err(status_error(resp).await);
        }

        Err(ApiError::Status {
            status: last_status,
            detail: Some(format!("gave up after {max_attempts} attempts")),
        })
    }

    pub async fn create(&self, draft: &NewPost) -> Result<RawPost, ApiError> {
        let resp = self
            .client
            .post(self.base_url.clone())
            .json(draft)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        resp.json().await.map_err(ApiError::Transport)
    }

    pub async fn update(&self, id: &PostId, payload: &RawPost) -> Result<RawPost, ApiError> {
        let resp = self
            .client
            .put(self.item_url(id))
            .json(payload)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        resp.json().await.map_err(ApiError::Transport)
    }

    pub async fn delete(&self, id: &PostId) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(ApiError::Transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(())
    }

    fn item_url(&self, id: &PostId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }
}

async fn status_error(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    ApiError::Status {
        status,
        detail: error_detail(&body),
    }
}

/// Pulls a human-readable message out of an error body: well-known JSON
/// keys first, then the whole JSON value, then the raw text.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(s) = value.get(key).and_then(|v| v.as_str()) {
                return Some(s.to_string());
            }
        }
        if !value.is_null() {
            return Some(value.to_string());
        }
        return None;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn retry_after_duration(headers: &HeaderMap) -> Option<Duration> {
    let v = headers.get(RETRY_AFTER)?;
    let s = v.to_str().ok()?.trim();
    let seconds: u64 = s.parse().ok()?;
    Some(Duration::from_secs(seconds))
}
