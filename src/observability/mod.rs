//! Observability
//!
//! Structured logging through `tracing`. Every request runs inside a span
//! carrying its request id and source, so storage failures and truncation
//! events logged deeper down are attributable to one request.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing::Span;
use tracing_subscriber::{fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Levels come from `RUST_LOG`, defaulting to `info`. Logs go to stderr
/// so stdout stays free for query output.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(env_filter);
        // another subscriber may already be installed (tests, embedding)
        let _ = match format {
            LogFormat::Json => registry
                .with(layer_fmt::layer().json().with_writer(io::stderr))
                .try_init(),
            LogFormat::Pretty => registry
                .with(layer_fmt::layer().pretty().with_writer(io::stderr))
                .try_init(),
        };
    });
}

/// Span for one API request.
#[must_use]
pub fn request_span(request_id: &Uuid, source: &str) -> Span {
    tracing::info_span!("request", request_id = %request_id, source = source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Json);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
        let parsed: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(parsed, LogFormat::Pretty);
    }

    #[test]
    fn test_request_span() {
        let id = Uuid::new_v4();
        let span = request_span(&id, "fluview");
        let _guard = span.enter();
        tracing::info!("inside request");
    }
}
