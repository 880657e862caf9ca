use crate::retry::{BackoffPolicy, FixedDelayPolicy};
use std::str::FromStr;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
pub const DEFAULT_CLIQ_BOT_API_URL: &str =
    "https://cliq.zoho.com/company/872481709/api/v2/bots/alertbot/message";

/// Runtime configuration, built once and passed into each component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the CRM API, e.g. `https://www.zohoapis.com/crm/v2`.
    pub crm_api_url: String,
    /// Base URL of the identity provider serving `/oauth/v2/token`.
    pub accounts_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Chat bot message endpoint.
    pub webhook_url: String,
    /// Sent as the `zapikey` query parameter.
    pub webhook_key: String,
    pub page_size: u32,
    /// Leads scoring strictly above this are posted to the chat.
    pub score_threshold: i64,
    pub token_retry: BackoffPolicy,
    pub fetch_retry: FixedDelayPolicy,
    pub request_timeout_secs: u64,
    /// Score and render without writing to the CRM or posting to the chat.
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let token_retry = BackoffPolicy {
            max_retries: parse_var("TOKEN_MAX_RETRIES", 5)?,
            base_delay_ms: parse_var("TOKEN_BACKOFF_BASE_MS", 1_000)?,
            max_delay_ms: parse_var("TOKEN_BACKOFF_MAX_MS", 30_000)?,
        };
        let fetch_retry = FixedDelayPolicy {
            delay_ms: parse_var("FETCH_RATE_LIMIT_DELAY_MS", 1_000)?,
            max_retries: parse_var("FETCH_MAX_RATE_LIMIT_RETRIES", 10)?,
        };

        let config = Self {
            crm_api_url: url_var("CRM_API_URL")?,
            accounts_url: optional_url_var("ZOHO_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL)?,
            client_id: required_var("CLIENT_ID")?,
            client_secret: required_var("CLIENT_SECRET")?,
            refresh_token: required_var("REFRESH_TOKEN")?,
            webhook_url: optional_url_var("CLIQ_BOT_API_URL", DEFAULT_CLIQ_BOT_API_URL)?,
            webhook_key: required_var("CLIQ_WEBHOOK")?,
            page_size: parse_var("LEADS_PAGE_SIZE", 200)?,
            score_threshold: parse_var("SCORE_THRESHOLD", 80)?,
            token_retry,
            fetch_retry,
            request_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 30)?,
            dry_run: std::env::var("DRY_RUN")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("CRM API URL: {}", config.crm_api_url);
        tracing::debug!("Accounts URL: {}", config.accounts_url);
        tracing::debug!("Webhook URL: {}", config.webhook_url);
        tracing::debug!(
            "Page size: {}, threshold: {}, timeout: {}s",
            config.page_size,
            config.score_threshold,
            config.request_timeout_secs
        );
        if config.dry_run {
            tracing::info!("DRY_RUN enabled: no CRM updates or chat messages will be sent");
        }

        Ok(config)
    }

    /// Checks the values that cannot be expressed by the field types.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 || self.page_size > 200 {
            anyhow::bail!("LEADS_PAGE_SIZE must be between 1 and 200");
        }
        if self.token_retry.base_delay_ms == 0 {
            anyhow::bail!("TOKEN_BACKOFF_BASE_MS must be > 0");
        }
        if self.token_retry.max_delay_ms < self.token_retry.base_delay_ms {
            anyhow::bail!("TOKEN_BACKOFF_MAX_MS must be >= TOKEN_BACKOFF_BASE_MS");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn url_var(name: &str) -> anyhow::Result<String> {
    let value = required_var(name)?;
    check_url(name, &value)?;
    Ok(value.trim_end_matches('/').to_string())
}

fn optional_url_var(name: &str, default: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            check_url(name, &value)?;
            Ok(value.trim_end_matches('/').to_string())
        }
        _ => Ok(default.to_string()),
    }
}

fn check_url(name: &str, value: &str) -> anyhow::Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    url::Url::parse(value).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    Ok(())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}
