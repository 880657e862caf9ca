use rust_lead_score::config::Config;
use rust_lead_score::pipeline::LeadSync;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the lead score sync job.
///
/// Initializes tracing, loads configuration from the environment, then runs
/// one sync to completion. Meant to be triggered by an external scheduler.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Err when configuration is invalid or the run
///   could not obtain an access token; the process then exits non-zero.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_lead_score=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let sync = LeadSync::new(&config)?;

    if let Err(e) = sync.run().await {
        tracing::error!("Error processing leads: {}", e);
        return Err(e.into());
    }

    Ok(())
}
