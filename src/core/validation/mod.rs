//! Request validation
//!
//! Request bodies are deserialized into typed payloads and checked with
//! `validator` by the [`ValidatedJson`] extractor before they reach handlers.
//! Date parsing is separate: it belongs to the service so that it runs
//! before any transaction is opened and reports a date-specific error.

pub mod extractor;
pub mod payload;

pub use extractor::ValidatedJson;
pub use payload::{CreateItemRequest, CreateOrderRequest, UpdateItemRequest, UpdateOrderRequest};

use crate::core::error::ValidationError;
use chrono::{DateTime, Utc};

/// Parse an `ordered_at` value: RFC 3339 with an explicit offset (`Z` or `±hh:mm`).
pub fn parse_ordered_at(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidDate {
            value: value.to_string(),
            message: e.to_string(),
        })
}
