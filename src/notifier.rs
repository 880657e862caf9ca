//! High-priority digest for the chat webhook.
//!
//! Filters scored leads by threshold, renders them as one markdown message
//! and posts it. Posting is best-effort: failures become a [`NotifyOutcome`].

use crate::config::Config;
use crate::errors::{transport_message, AppError};
use crate::models::{ChatMessage, Lead};
use std::time::Duration;

pub const ALERT_HEADER: &str = "**High Priority Leads Alert**";

/// What happened to the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No lead scored above the threshold; nothing was posted.
    NothingToSend,
    Sent { count: usize },
    /// The digest was rendered but not posted (dry run).
    Skipped { count: usize },
    Failed { count: usize, error: String },
}

/// Leads scoring strictly above `threshold`, in their original order.
pub fn high_priority(leads: &[Lead], threshold: i64) -> Vec<&Lead> {
    leads
        .iter()
        .filter(|lead| lead.user_score.is_some_and(|score| score > threshold))
        .collect()
}

/// Treats empty strings like missing values.
fn or_na(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

fn render_lead(lead: &Lead) -> String {
    format!(
        "**Lead Name**: {}\n**Priority**: High\n**User Score**: {}\n**Industry**: {}\n**Contact**: {}",
        or_na(lead.full_name.clone()),
        lead.user_score.unwrap_or(0),
        or_na(lead.industry.as_ref().map(|i| i.to_string())),
        or_na(lead.email.clone()),
    )
}

/// Renders the full message: header line, blank line, one block per lead.
pub fn render_message(leads: &[&Lead]) -> String {
    let blocks = leads
        .iter()
        .map(|lead| render_lead(lead))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n{}", ALERT_HEADER, blocks)
}

/// Client for the chat bot webhook.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
    api_key: String,
    threshold: i64,
}

impl Notifier {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create webhook client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            api_key: config.webhook_key.clone(),
            threshold: config.score_threshold,
        })
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Posts the high-priority digest for `leads`, if any qualify.
    pub async fn notify_high_priority(&self, leads: &[Lead]) -> NotifyOutcome {
        let selected = high_priority(leads, self.threshold);
        if selected.is_empty() {
            tracing::info!("No high-priority leads to send.");
            return NotifyOutcome::NothingToSend;
        }

        let count = selected.len();
        let message = render_message(&selected);

        match self.post(message).await {
            Ok(()) => {
                tracing::info!("Message sent to Cliq bot successfully ({} leads)", count);
                NotifyOutcome::Sent { count }
            }
            Err(e) => {
                tracing::error!("Error sending leads to Cliq bot: {}", e);
                NotifyOutcome::Failed {
                    count,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn post(&self, text: String) -> Result<(), AppError> {
        tracing::debug!("POST {}?zapikey=[REDACTED]", self.webhook_url);

        let response = self
            .client
            .post(&self.webhook_url)
            .query(&[("zapikey", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&ChatMessage { text })
            .send()
            .await
            .map_err(|e| {
                AppError::Notify(format!("Webhook request failed: {}", transport_message(e)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Notify(format!(
                "Webhook returned {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Industry;

    fn scored(id: &str, score: Option<i64>) -> Lead {
        let mut lead = Lead::new(id);
        lead.user_score = score;
        lead
    }

    #[test]
    fn test_high_priority_keeps_order_and_is_strict() {
        let leads = vec![
            scored("a", Some(90)),
            scored("b", Some(70)),
            scored("c", Some(85)),
            scored("d", Some(80)),
            scored("e", None),
        ];

        let ids: Vec<&str> = high_priority(&leads, 80)
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_render_lead_with_fallbacks() {
        let mut lead = scored("a", Some(90));
        lead.full_name = Some(String::new());

        assert_eq!(
            render_message(&[&lead]),
            "**High Priority Leads Alert**\n\n\
             **Lead Name**: N/A\n\
             **Priority**: High\n\
             **User Score**: 90\n\
             **Industry**: N/A\n\
             **Contact**: N/A"
        );
    }

    #[test]
    fn test_render_joins_blocks_with_blank_line() {
        let mut first = scored("a", Some(110));
        first.full_name = Some("Ada Lovelace".to_string());
        first.industry = Some(Industry::LargeEnterprise);
        first.email = Some("ada@example.com".to_string());
        let second = scored("b", Some(85));

        let message = render_message(&[&first, &second]);
        let blocks: Vec<&str> = message.split("\n\n").collect();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ALERT_HEADER);
        assert!(blocks[1].contains("**Lead Name**: Ada Lovelace"));
        assert!(blocks[1].contains("**Industry**: Large Enterprise"));
        assert!(blocks[1].contains("**Contact**: ada@example.com"));
        assert!(blocks[2].contains("**User Score**: 85"));
    }
}
