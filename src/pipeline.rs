//! Lead score sync run.
//!
//! One run, strictly sequential:
//! 1. Refresh the CRM access token (the only fatal step)
//! 2. Read every lead
//! 3. Score each lead and write the score back
//! 4. Post the high-priority digest
//!
//! Re-running after a partial failure recomputes and re-sends every score.
//! Scoring is deterministic, so replay is the recovery strategy.

use crate::config::Config;
use crate::crm_client::CrmClient;
use crate::errors::{AppError, ResultExt};
use crate::models::Lead;
use crate::notifier::{high_priority, render_message, NotifyOutcome, Notifier};
use crate::scoring;
use crate::token_provider::TokenProvider;
use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

/// A lead whose score could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub lead_id: String,
    pub error: String,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetched: usize,
    pub written: usize,
    pub write_failures: Vec<WriteFailure>,
    pub notification: NotifyOutcome,
    pub dry_run: bool,
}

pub struct LeadSync {
    tokens: TokenProvider,
    crm: CrmClient,
    notifier: Notifier,
    dry_run: bool,
}

impl LeadSync {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            tokens: TokenProvider::new(config)?,
            crm: CrmClient::new(config)?,
            notifier: Notifier::new(config)?,
            dry_run: config.dry_run,
        })
    }

    /// Runs the sync once.
    ///
    /// Only a token failure is returned as an error; read, write and notify
    /// failures are logged and reflected in the [`RunSummary`].
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("lead_sync", %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<RunSummary, AppError> {
        let started_at = Utc::now();
        tracing::info!("=== Lead score sync started ===");

        let token = self
            .tokens
            .acquire_access_token()
            .await
            .context("Acquiring CRM access token")?;

        let mut leads = self.crm.fetch_all_leads(&token).await;

        let mut written = 0;
        let mut write_failures = Vec::new();

        for lead in leads.iter_mut() {
            let new_score = scoring::score(lead);
            lead.user_score = Some(new_score);

            if self.dry_run {
                tracing::info!("[dry run] Lead {} would get score {}", lead.id, new_score);
                continue;
            }

            match self.crm.write_score(&token, &lead.id, new_score).await {
                Ok(()) => written += 1,
                Err(e) => write_failures.push(WriteFailure {
                    lead_id: lead.id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        let notification = if self.dry_run {
            self.preview_notification(&leads)
        } else {
            self.notifier.notify_high_priority(&leads).await
        };

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            fetched: leads.len(),
            written,
            write_failures,
            notification,
            dry_run: self.dry_run,
        };

        tracing::info!(
            "=== Lead score sync finished: fetched={}, written={}, failed={}, notification={:?} ({}ms) ===",
            summary.fetched,
            summary.written,
            summary.write_failures.len(),
            summary.notification,
            (summary.finished_at - summary.started_at).num_milliseconds()
        );

        Ok(summary)
    }

    fn preview_notification(&self, leads: &[Lead]) -> NotifyOutcome {
        let selected = high_priority(leads, self.notifier.threshold());
        if selected.is_empty() {
            tracing::info!("[dry run] No high-priority leads to send.");
            return NotifyOutcome::NothingToSend;
        }
        tracing::info!(
            "[dry run] Would send to Cliq bot:\n{}",
            render_message(&selected)
        );
        NotifyOutcome::Skipped {
            count: selected.len(),
        }
    }
}
