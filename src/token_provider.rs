use crate::config::Config;
use crate::errors::{transport_message, AppError};
use crate::models::TokenResponse;
use crate::retry::BackoffPolicy;
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

/// Short-lived CRM bearer credential.
///
/// `Debug` is redacted so the token never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header expected by the CRM.
    pub fn authorization_header(&self) -> String {
        format!("Zoho-oauthtoken {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Why a single token request failed.
#[derive(Debug)]
enum TokenFailure {
    /// HTTP 429.
    RateLimited,
    /// DNS resolution or connection failure.
    Unreachable(String),
    /// Any other non-success status, with the server payload.
    Rejected { status: StatusCode, body: String },
    /// 2xx without an `access_token`.
    Malformed(String),
    Transport(String),
}

impl TokenFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, TokenFailure::RateLimited | TokenFailure::Unreachable(_))
    }
}

impl fmt::Display for TokenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenFailure::RateLimited => write!(f, "token endpoint returned 429"),
            TokenFailure::Unreachable(msg) => write!(f, "token endpoint unreachable: {}", msg),
            TokenFailure::Rejected { status, body } => {
                write!(f, "token endpoint returned {}: {}", status, body)
            }
            TokenFailure::Malformed(msg) => write!(f, "unexpected token response: {}", msg),
            TokenFailure::Transport(msg) => write!(f, "token request failed: {}", msg),
        }
    }
}

/// Exchanges the long-lived refresh token for an access token.
#[derive(Clone)]
pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    policy: BackoffPolicy,
}

impl TokenProvider {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create token client: {}", e)))?;

        Ok(Self {
            client,
            token_url: format!("{}/oauth/v2/token", config.accounts_url),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            policy: config.token_retry,
        })
    }

    /// Obtains a fresh access token.
    ///
    /// 429 responses and connection failures are retried with exponential
    /// backoff up to `policy.max_retries` times. Anything else, or running out
    /// of retries, returns [`AppError::Auth`].
    pub async fn acquire_access_token(&self) -> Result<AccessToken, AppError> {
        let mut attempt = 0;

        loop {
            match self.request_token().await {
                Ok(token) => {
                    tracing::info!("Access token refreshed successfully");
                    return Ok(token);
                }
                Err(failure) if failure.is_retryable() && self.policy.can_retry(attempt) => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        "Retrying token refresh (attempt {}/{}) in {}ms: {}",
                        attempt + 1,
                        self.policy.max_retries,
                        delay.as_millis(),
                        failure
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    tracing::error!("Error refreshing access token: {}", failure);
                    return Err(AppError::Auth(failure.to_string()));
                }
            }
        }
    }

    async fn request_token(&self) -> Result<AccessToken, TokenFailure> {
        tracing::debug!(
            "Requesting access token: {}?client_id={}&client_secret=[REDACTED]&refresh_token=[REDACTED]",
            self.token_url,
            self.client_id
        );

        let response = self
            .client
            .post(&self.token_url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TokenFailure::Unreachable(transport_message(e))
                } else {
                    TokenFailure::Transport(transport_message(e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TokenFailure::RateLimited);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TokenFailure::Rejected { status, body });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenFailure::Malformed(transport_message(e)))?;

        match body.access_token {
            Some(token) if !token.is_empty() => {
                if let Some(expires_in) = body.expires_in {
                    tracing::debug!("Access token expires in {}s", expires_in);
                }
                Ok(AccessToken::new(token))
            }
            _ => Err(TokenFailure::Malformed(
                body.error
                    .unwrap_or_else(|| "missing 'access_token' field".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("1000.secret.value");
        assert_eq!(format!("{:?}", token), "AccessToken([REDACTED])");
        assert_eq!(token.as_str(), "1000.secret.value");
    }

    #[test]
    fn test_authorization_header() {
        let token = AccessToken::new("abc");
        assert_eq!(token.authorization_header(), "Zoho-oauthtoken abc");
    }

    #[test]
    fn test_retryable_failures() {
        assert!(TokenFailure::RateLimited.is_retryable());
        assert!(TokenFailure::Unreachable("dns".to_string()).is_retryable());
        assert!(!TokenFailure::Rejected {
            status: StatusCode::UNAUTHORIZED,
            body: String::new()
        }
        .is_retryable());
        assert!(!TokenFailure::Malformed("invalid_code".to_string()).is_retryable());
        assert!(!TokenFailure::Transport("timeout".to_string()).is_retryable());
    }
}
