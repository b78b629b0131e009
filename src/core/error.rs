//! Typed error handling for the order service
//!
//! Every failure the service can report belongs to one of three families,
//! each mapped to a JSON error body and an HTTP status code.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed request bodies, missing fields, bad dates
//! - [`EntityError`]: missing orders and item ownership conflicts
//! - [`StorageError`]: anything the database reports (connectivity, queries,
//!   constraints, commits)
//!
//! # Status codes per operation
//!
//! The REST surface does not map errors to status codes uniformly: the same
//! storage failure is a 400 on `GET /orders` but a 500 on `PUT /orders/{id}`.
//! [`OrderError::status_code_for`] encodes that table, keyed by [`Operation`].
//! [`OrderError::status_code`] is the operation-independent default used when
//! no operation is known (e.g. a request body rejected before dispatch).
//!
//! # Example
//!
//! ```rust,ignore
//! use orders::prelude::*;
//!
//! match service.get("42").await {
//!     Ok(order) => println!("{} items", order.items.len()),
//!     Err(OrderError::Entity(EntityError::NotFound { id, .. })) => {
//!         println!("order {} not found", id);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use crate::core::order::{Order, OrderId};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for order operations
#[derive(Debug)]
pub enum OrderError {
    /// Entity-related errors (missing rows, ownership conflicts)
    Entity(EntityError),

    /// Validation errors
    Validation(ValidationError),

    /// Storage backend errors
    Storage(StorageError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::Entity(e) => write!(f, "{}", e),
            OrderError::Validation(e) => write!(f, "{}", e),
            OrderError::Storage(e) => write!(f, "{}", e),
            OrderError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for OrderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrderError::Entity(e) => Some(e),
            OrderError::Validation(e) => Some(e),
            OrderError::Storage(e) => Some(e),
            OrderError::Internal(_) => None,
        }
    }
}

/// The five operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl OrderError {
    /// Get the default HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Entity(e) => e.status_code(),
            OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrderError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the HTTP status code this error produces on a given route
    pub fn status_code_for(&self, operation: Operation) -> StatusCode {
        use Operation::*;

        match (operation, self) {
            (_, OrderError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            (_, OrderError::Entity(EntityError::ForeignItem { .. })) => StatusCode::CONFLICT,

            // Date parsing on update is reported as a server error, body binding stays 400
            (Update, OrderError::Validation(ValidationError::InvalidDate { .. })) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            (_, OrderError::Validation(_)) => StatusCode::BAD_REQUEST,

            (Create | List | Get, OrderError::Entity(_) | OrderError::Storage(_)) => {
                StatusCode::BAD_REQUEST
            }

            (Update, OrderError::Entity(_)) => StatusCode::NOT_FOUND,
            (Update, OrderError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,

            (Delete, OrderError::Entity(_)) => StatusCode::NOT_FOUND,
            (Delete, OrderError::Storage(StorageError::TransactionError { .. })) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            (Delete, OrderError::Storage(_)) => StatusCode::NOT_FOUND,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::Entity(e) => e.error_code(),
            OrderError::Validation(e) => e.error_code(),
            OrderError::Storage(e) => e.error_code(),
            OrderError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details: self.details(),
        }
    }

    /// Attach the operation that produced this error, for status code mapping
    pub fn during(self, operation: Operation) -> OperationError {
        OperationError {
            operation,
            error: self,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderError::Entity(EntityError::NotFound { .. }))
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            OrderError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            OrderError::Entity(EntityError::ForeignItem { item_id, order_id }) => {
                Some(serde_json::json!({
                    "item_id": item_id,
                    "order_id": order_id
                }))
            }
            OrderError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

/// An [`OrderError`] tagged with the operation that produced it
#[derive(Debug)]
pub struct OperationError {
    pub operation: Operation,
    pub error: OrderError,
}

impl OperationError {
    pub fn status_code(&self) -> StatusCode {
        self.error.status_code_for(self.operation)
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.error)
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                status = status.as_u16(),
                code = self.error.error_code(),
                error = %self.error,
                "request failed"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                status = status.as_u16(),
                code = self.error.error_code(),
                error = %self.error,
                "request rejected"
            );
        }
        let body = Json(self.error.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to order and item rows
#[derive(Debug)]
pub enum EntityError {
    /// No row matches the identifier (including identifiers that are not integers)
    NotFound { entity_type: String, id: String },

    /// An item identifier supplied on update belongs to a different order
    ForeignItem { item_id: OrderId, order_id: OrderId },
}

impl EntityError {
    pub fn order_not_found(id: impl ToString) -> Self {
        EntityError::NotFound {
            entity_type: Order::ENTITY_TYPE.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::ForeignItem { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::ForeignItem { .. } => "ITEM_OWNED_BY_OTHER_ORDER",
        }
    }
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            EntityError::ForeignItem { item_id, order_id } => {
                write!(
                    f,
                    "item '{}' belongs to order '{}' and cannot be reassigned",
                    item_id, order_id
                )
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl From<EntityError> for OrderError {
    fn from(err: EntityError) -> Self {
        OrderError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// The body is not valid JSON or does not match the expected shape
    InvalidBody { message: String },

    /// Field-level rule violations (required, non-empty, non-negative)
    FieldErrors(Vec<FieldValidationError>),

    /// `ordered_at` does not parse as an RFC 3339 date-time with offset
    InvalidDate { value: String, message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidBody { .. } => "INVALID_BODY",
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::InvalidDate { .. } => "INVALID_DATE",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidDate { value, message } => {
                write!(
                    f,
                    "Invalid date format for ordered_at '{}': {}",
                    value, message
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for OrderError {
    fn from(err: ValidationError) -> Self {
        OrderError::Validation(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection or pool error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { backend: String, message: String },

    /// Begin / commit / rollback failure
    TransactionError { message: String },

    /// Constraint violation (foreign key, check, unique)
    IntegrityError { message: String },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::ConnectionError { .. } => "STORAGE_CONNECTION_ERROR",
            StorageError::QueryError { .. } => "STORAGE_ERROR",
            StorageError::TransactionError { .. } => "TRANSACTION_ERROR",
            StorageError::IntegrityError { .. } => "INTEGRITY_ERROR",
        }
    }

    pub fn query(backend: &str, message: impl ToString) -> Self {
        StorageError::QueryError {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn transaction(message: impl ToString) -> Self {
        StorageError::TransactionError {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::TransactionError { message } => {
                write!(f, "Transaction error: {}", message)
            }
            StorageError::IntegrityError { message } => {
                write!(f, "Data integrity error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        OrderError::Storage(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Validation(ValidationError::InvalidBody {
            message: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        OrderError::Validation(ValidationError::FieldErrors(fields))
    }
}

/// Flatten nested validator errors into `items[0].quantity` style paths
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldValidationError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    out.push(FieldValidationError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Storage(StorageError::from(err))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        const BACKEND: &str = "PostgreSQL";

        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                message: err.to_string(),
            },
            sqlx::Error::Database(db)
                if db.is_foreign_key_violation()
                    || db.is_check_violation()
                    || db.is_unique_violation() =>
            {
                StorageError::IntegrityError {
                    message: db.message().to_string(),
                }
            }
            _ => StorageError::query(BACKEND, err.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Tests
// =============================================================================
