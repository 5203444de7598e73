//! HTTP retry helper for oracle requests.
//!
//! Oracle calls go through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so transient failures
//! (timeouts, connection resets, HTTP 429 and 5xx) are retried with
//! exponential backoff.

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retries after the first attempt.
///
/// Backoff doubles from 500ms, so the total wait before giving up is 3.5s.
const MAX_RETRIES: u32 = 3;

/// Sends an HTTP request and parses the response body as JSON.
///
/// `build_request` is called once per attempt since builders are consumed
/// by `.send()`.
///
/// HTTP 4xx other than 429 is permanent and returns `Ok(None)`: the
/// service answered, but has nothing for this query.
///
/// # Errors
///
/// Returns [`SourceError`] if the request still fails after all retries,
/// or if a successful response body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<Option<serde_json::Value>, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_failure = String::from("no attempt made");

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(250 << attempt);
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) if is_transient(&e) && attempt < MAX_RETRIES => {
                log::warn!("  transient error: {e}");
                last_failure = e.to_string();
            }
            Err(e) => return Err(SourceError::Http(e)),
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    log::warn!("  HTTP {status}");
                    last_failure = format!("HTTP {status}");
                    continue;
                }

                if status.is_client_error() {
                    log::debug!("HTTP {status} from {}", response.url());
                    return Ok(None);
                }

                let text = response.text().await?;
                return Ok(Some(serde_json::from_str(&text)?));
            }
        }
    }

    Err(SourceError::Unavailable {
        message: format!("{last_failure} after {MAX_RETRIES} retries"),
    })
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
