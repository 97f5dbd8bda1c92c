//! Outbound HTTP clients for the trial registry and the reasoning service.

use std::sync::OnceLock;

use crate::error::TrialMatchError;

pub mod clinicaltrials;
pub mod openai;

const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
const EXCERPT_CHARS: usize = 200;

/// Process-wide HTTP client. Built on first use and cloned afterwards.
pub(crate) fn shared_client() -> Result<reqwest::Client, TrialMatchError> {
    static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("trialmatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(TrialMatchError::HttpClientInit)?;

    Ok(HTTP_CLIENT.get_or_init(|| client).clone())
}

pub(crate) fn join_endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(crate) async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, TrialMatchError> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(TrialMatchError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub(crate) fn body_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return "<empty body>".into();
    }
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out.replace(['\n', '\r'], " ")
}
