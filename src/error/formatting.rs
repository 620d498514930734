//! Error formatting utilities
//!
//! Renders errors with their source chain for log lines.

use crate::Error;
use std::error::Error as StdError;

/// Format error for display, appending each nested cause once
pub fn format_error(error: &Error) -> String {
    let formatted = match error {
        Error::UpstreamAuth {
            reason,
            status: Some(status),
        } => format!("Upstream auth failed (HTTP {}): {}", status, reason),

        Error::UpstreamQuery {
            channel,
            reason,
            status: Some(status),
        } => format!(
            "Upstream query for '{}' failed (HTTP {}): {}",
            channel, status, reason
        ),

        Error::Internal {
            message,
            context: Some(context),
        } => format!("Internal error in {}: {}", context, message),

        // For everything else the Display implementation is already complete
        _ => error.to_string(),
    };

    let mut result = formatted;
    let mut source = error.source();

    while let Some(cause) = source {
        if !result.contains(&cause.to_string()) {
            result = format!("{} (caused by {})", result, cause);
        }
        source = cause.source();
    }

    result
}

/// Format error for logging with structured data
pub fn format_error_for_logging(error: &Error) -> serde_json::Value {
    let mut log_data = serde_json::json!({
        "message": format_error(error),
        "category": error.category(),
        "retryable": error.is_retryable(),
    });

    if let Some(status) = error.upstream_status() {
        log_data["upstream_status"] = serde_json::Value::Number(status.into());
    }

    match error {
        Error::UpstreamQuery { channel, .. } => {
            log_data["channel"] = serde_json::Value::String(channel.clone());
        }
        Error::Timeout { duration_secs, .. } => {
            log_data["timeout_duration"] = serde_json::Value::Number((*duration_secs).into());
        }
        _ => {}
    }

    log_data
}
