//! Lead Score Sync Library
//!
//! This library refreshes a CRM access token, reads every lead, scores each
//! one from its priority and industry, writes the score back to the CRM and
//! posts the high-priority leads to a chat webhook.
//!
//! # Modules
//!
//! - `core`: Domain logic (scoring, models, errors).
//! - `integrations`: Outbound HTTP clients (identity, CRM, chat).
//! - `config`: Configuration management.
//! - `crm_client`: Lead reader and writer for the CRM `Leads` module.
//! - `errors`: Error handling types.
//! - `models`: Lead and wire data models.
//! - `notifier`: High-priority digest rendering and webhook post.
//! - `pipeline`: The sequential sync run.
//! - `retry`: Backoff and fixed-delay retry policies.
//! - `scoring`: Lead score computation.
//! - `token_provider`: OAuth refresh-token exchange.

pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod config;
pub mod crm_client;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod retry;
pub mod scoring;
pub mod token_provider;
