//! Shared plumbing for the blocking OpenAI-compatible HTTP clients.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use newsroom_core::{ProviderError, ProviderErrorCode};

/// Reads an API key from the environment variable `var`.
pub fn api_key_from_env(var: &str) -> Result<String, ProviderError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ProviderError::new(ProviderErrorCode::Config, format!("environment variable {} is not set", var))),
    }
}

/// Client with bearer auth, JSON content type and a whole-request timeout.
pub fn build_client(api_key: &str, timeout: Duration) -> Result<Client, ProviderError> {
    if api_key.trim().is_empty() {
        return Err(ProviderError::new(ProviderErrorCode::Config, "missing API key"));
    }
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
        .map_err(|_| ProviderError::new(ProviderErrorCode::Config, "API key is not a valid header value"))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| ProviderError::new(ProviderErrorCode::Config, format!("failed to build HTTP client: {}", e)))
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Maps a non-success HTTP status to a provider error code.
pub fn status_code(status: StatusCode) -> ProviderErrorCode {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorCode::Auth,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorCode::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderErrorCode::Timeout,
        s if s.is_server_error() => ProviderErrorCode::Server,
        _ => ProviderErrorCode::InvalidResponse,
    }
}

pub fn status_error(status: StatusCode, body: &str) -> ProviderError {
    ProviderError::new(status_code(status), format!("HTTP {}: {}", status, truncate(body, 300)))
}

pub fn transport_error(err: &reqwest::Error) -> ProviderError {
    let code = if err.is_timeout() {
        ProviderErrorCode::Timeout
    } else if err.is_decode() {
        ProviderErrorCode::InvalidResponse
    } else {
        ProviderErrorCode::Transport
    };
    ProviderError::new(code, err.to_string())
}

/// Codes worth another attempt: the request may succeed unchanged.
pub fn is_retryable(code: ProviderErrorCode) -> bool {
    matches!(
        code,
        ProviderErrorCode::Transport | ProviderErrorCode::Timeout | ProviderErrorCode::RateLimited | ProviderErrorCode::Server
    )
}

/// Exponential backoff: `base * 2^attempt`, exponent capped at 5.
pub fn backoff(base: Duration, attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    base * (1u32 << capped)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_to_codes() {
        assert_eq!(status_code(StatusCode::UNAUTHORIZED), ProviderErrorCode::Auth);
        assert_eq!(status_code(StatusCode::TOO_MANY_REQUESTS), ProviderErrorCode::RateLimited);
        assert_eq!(status_code(StatusCode::BAD_GATEWAY), ProviderErrorCode::Server);
        assert_eq!(status_code(StatusCode::BAD_REQUEST), ProviderErrorCode::InvalidResponse);
        assert!(is_retryable(ProviderErrorCode::Server));
        assert!(!is_retryable(ProviderErrorCode::Auth));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff(base, 0), Duration::from_millis(100));
        assert_eq!(backoff(base, 2), Duration::from_millis(400));
        assert_eq!(backoff(base, 9), Duration::from_millis(3200));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("https://api.example.com/v1/", "/embeddings"), "https://api.example.com/v1/embeddings");
    }
}
