//! Remote validity check against a keyward instance.
//!
//! Fails closed: any transport error, non-200 status, or unparseable body
//! counts as "not valid".

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// JSON response from `GET /api/keys/check/{key}`.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    valid: bool,
}

/// Ask the keyward instance at `base_url` whether `key` is registered.
pub async fn is_key_found(base_url: &str, key: &str, admin_key: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "could not build HTTP client");
            return false;
        }
    };

    let url = format!("{}/api/keys/check/{}", base_url.trim_end_matches('/'), key);
    let resp = match client
        .get(&url)
        .header("Authorization", admin_key)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "check request failed");
            return false;
        }
    };

    if resp.status() != reqwest::StatusCode::OK {
        warn!(status = %resp.status(), "check returned non-200");
        return false;
    }

    match resp.json::<CheckResponse>().await {
        Ok(body) => body.valid,
        Err(e) => {
            warn!(error = %e, "could not parse check response");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn valid_key_is_true() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/keys/check/ABC-123"))
            .and(header("Authorization", "admin-secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"valid": true})),
            )
            .mount(&mock)
            .await;

        assert!(is_key_found(&mock.uri(), "ABC-123", "admin-secret").await);
    }

    #[tokio::test]
    async fn invalid_key_is_false() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/keys/check/NOPE"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"valid": false})),
            )
            .mount(&mock)
            .await;

        assert!(!is_key_found(&mock.uri(), "NOPE", "admin-secret").await);
    }

    #[tokio::test]
    async fn non_200_is_false() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/keys/check/ABC-123"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"valid": true})),
            )
            .mount(&mock)
            .await;

        assert!(!is_key_found(&mock.uri(), "ABC-123", "wrong-secret").await);
    }

    #[tokio::test]
    async fn unparseable_body_is_false() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/keys/check/ABC-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock)
            .await;

        assert!(!is_key_found(&mock.uri(), "ABC-123", "admin-secret").await);
    }

    #[tokio::test]
    async fn unreachable_server_is_false() {
        assert!(!is_key_found("http://127.0.0.1:1", "ABC-123", "admin-secret").await);
    }
}
