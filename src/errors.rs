use std::fmt;

/// Error kinds raised while syncing lead scores.
///
/// Only [`AppError::Auth`] is allowed to unwind out of a run. Every other
/// variant is caught by the layer that produced it and turned into a log line
/// plus a degraded result.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Token refresh was rejected or exhausted its retries.
    Auth(String),
    /// A non rate-limit failure while paginating leads.
    Fetch(String),
    /// The remote answered 429. Used as a retry signal inside a layer.
    RateLimited,
    /// The score update for a single lead failed.
    Write {
        /// Identifier of the lead that could not be updated.
        lead_id: String,
        /// Server payload when present, otherwise the transport message.
        detail: String,
    },
    /// Posting the digest to the chat webhook failed.
    Notify(String),
    /// A client could not be built from the supplied configuration.
    Config(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            AppError::RateLimited => write!(f, "Rate limited"),
            AppError::Write { lead_id, detail } => {
                write!(f, "Write error for lead {}: {}", lead_id, detail)
            }
            AppError::Notify(msg) => write!(f, "Notify error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Renders a transport error without its request URL.
///
/// Token and webhook URLs carry credentials in the query string.
pub fn transport_message(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
