use crate::config::Config;
use crate::errors::{transport_message, AppError, ResultExt};
use crate::models::{Lead, LeadPage, ScoreUpdate, WriteResponse};
use crate::retry::FixedDelayPolicy;
use crate::token_provider::AccessToken;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Client for the CRM `Leads` module.
#[derive(Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    rate_limit: FixedDelayPolicy,
}

impl CrmClient {
    /// Creates a new `CrmClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the CRM base URL, page size, 429 policy and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create CRM client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.crm_api_url.clone(),
            page_size: config.page_size,
            rate_limit: config.fetch_retry,
        })
    }

    /// Reads every lead, page by page, in server order.
    ///
    /// Never fails: a 429 pauses and retries the same page until the
    /// rate-limit budget runs out, and any other failure stops pagination.
    /// In both cases the leads gathered so far are returned.
    pub async fn fetch_all_leads(&self, token: &AccessToken) -> Vec<Lead> {
        let mut page = 1;
        let mut rate_limited = 0;
        let mut leads = Vec::new();

        loop {
            match self.fetch_page(token, page).await {
                Ok(batch) => {
                    tracing::info!(
                        "Fetched page {} ({} leads, more_records={})",
                        page,
                        batch.data.len(),
                        batch.info.more_records
                    );
                    leads.extend(decode_leads(batch.data, page));
                    rate_limited = 0;

                    if !batch.info.more_records {
                        break;
                    }
                    page += 1;
                }
                Err(AppError::RateLimited) if self.rate_limit.can_retry(rate_limited) => {
                    rate_limited += 1;
                    tracing::warn!(
                        "Rate limit exceeded on page {}. Retrying in {}ms ({}/{})",
                        page,
                        self.rate_limit.delay_ms,
                        rate_limited,
                        self.rate_limit.max_retries
                    );
                    tokio::time::sleep(self.rate_limit.delay()).await;
                }
                Err(AppError::RateLimited) => {
                    let err = AppError::Fetch(format!(
                        "page {} still rate limited after {} retries",
                        page, rate_limited
                    ));
                    tracing::error!("Error fetching leads: {}", err);
                    break;
                }
                Err(e) => {
                    tracing::error!("Error fetching leads: {}", e);
                    break;
                }
            }
        }

        tracing::info!("Fetched {} leads.", leads.len());
        leads
    }

    /// Fetches one page of leads.
    ///
    /// Returns [`AppError::RateLimited`] on 429 and [`AppError::Fetch`] for
    /// anything else that is not a usable page.
    pub async fn fetch_page(&self, token: &AccessToken, page: u32) -> Result<LeadPage, AppError> {
        let url = format!("{}/Leads", self.base_url);
        tracing::debug!("GET {}?per_page={}&page={}", url, self.page_size, page);

        let response = self
            .client
            .get(&url)
            .query(&[("per_page", self.page_size), ("page", page)])
            .header("Authorization", token.authorization_header())
            .send()
            .await
            .map_err(|e| {
                AppError::Fetch(format!("CRM request failed: {}", transport_message(e)))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited);
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(LeadPage {
                data: Vec::new(),
                info: Default::default(),
            });
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Fetch(format!(
                "CRM returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<LeadPage>()
            .await
            .map_err(|e| {
                AppError::Fetch(format!(
                    "Failed to parse leads page: {}",
                    transport_message(e)
                ))
            })
            .with_context(|| format!("Leads page {}", page))
    }

    /// Writes a lead's score back to the CRM.
    ///
    /// Best-effort: no retry. Failures are logged here and handed back so the
    /// caller can record them and carry on with the next lead.
    pub async fn write_score(
        &self,
        token: &AccessToken,
        lead_id: &str,
        score: i64,
    ) -> Result<(), AppError> {
        let result = self.update_lead(token, lead_id, score).await;
        match &result {
            Ok(()) => tracing::info!("Updated lead {} with new score: {}", lead_id, score),
            Err(e) => tracing::error!("Error updating lead {}: {}", lead_id, e),
        }
        result
    }

    async fn update_lead(
        &self,
        token: &AccessToken,
        lead_id: &str,
        score: i64,
    ) -> Result<(), AppError> {
        let url = format!("{}/Leads/{}", self.base_url, lead_id);
        let write_error = |detail: String| AppError::Write {
            lead_id: lead_id.to_string(),
            detail,
        };

        let response = self
            .client
            .put(&url)
            .header("Authorization", token.authorization_header())
            .json(&ScoreUpdate::new(score))
            .send()
            .await
            .map_err(|e| write_error(transport_message(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if !status.is_success() {
            return Err(write_error(format!("{}: {}", status, body)));
        }

        // The CRM reports per-record failures inside a 2xx body.
        if let Ok(parsed) = serde_json::from_str::<WriteResponse>(&body) {
            if let Some(record) = parsed
                .data
                .iter()
                .find(|r| r.status.as_deref() == Some("error"))
            {
                return Err(write_error(format!(
                    "{} {} {}",
                    record.code.as_deref().unwrap_or("ERROR"),
                    record.message.as_deref().unwrap_or("record rejected"),
                    record.details
                )));
            }
        }

        Ok(())
    }
}

/// Decodes each record on its own; a malformed lead is skipped, not the page.
fn decode_leads(records: Vec<Value>, page: u32) -> Vec<Lead> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Lead>(record) {
                Ok(lead) => Some(lead),
                Err(e) => {
                    tracing::warn!("Skipping malformed lead {} on page {}: {}", id, page, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_ACCOUNTS_URL, DEFAULT_CLIQ_BOT_API_URL};
    use crate::retry::BackoffPolicy;
    use serde_json::json;

    #[tokio::test]
    async fn test_client_creation() {
        let config = Config {
            crm_api_url: "https://example.com/crm/v2".to_string(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            webhook_url: DEFAULT_CLIQ_BOT_API_URL.to_string(),
            webhook_key: "key".to_string(),
            page_size: 200,
            score_threshold: 80,
            token_retry: BackoffPolicy::default(),
            fetch_retry: FixedDelayPolicy::default(),
            request_timeout_secs: 30,
            dry_run: false,
        };
        assert!(CrmClient::new(&config).is_ok());
    }

    #[test]
    fn test_decode_leads_skips_only_malformed_records() {
        let records = vec![
            json!({ "id": "1", "Priority_level": "High" }),
            json!({ "id": "2", "User_score": 42.5, "Full_Name": 7 }),
            json!({ "id": ["not", "an", "id"] }),
            json!({ "Full_Name": "No id" }),
        ];

        let leads = decode_leads(records, 1);
        let ids: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();

        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(leads[1].user_score, Some(43));
        assert_eq!(leads[1].full_name.as_deref(), Some("7"));
    }
}
