//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`FilterError`]: raised by a single filter when its key cannot be mapped onto
//!   the entity (unknown column, malformed key, missing relation configuration).
//!   The [`QueryHandler`](crate::QueryHandler) logs these and skips the filter.
//! - [`QueryError`]: raised by the handler itself. It maps to an HTTP status,
//!   sends a sanitised message to the client and logs internal details with
//!   `tracing`.
//!
//! ```rust,ignore
//! async fn list_posts(State(db): State<DatabaseConnection>) -> Result<Json<Payload>, QueryError> {
//!     let handler = QueryHandler::<post::Entity>::new().set_limit(10);
//!     Ok(Json(handler.payload(&db).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

use crate::search::SearchError;

/// Reasons a filter could not be added to a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The key has the wrong number of `__` segments for this filter shape.
    #[error("malformed filter key '{key}'")]
    MalformedKey { key: String },

    /// The key names a column the target table does not have.
    #[error("unknown column '{column}' on '{table}'")]
    UnknownColumn { table: String, column: String },

    /// The key ends with an operator token that is not supported.
    #[error("unknown operator '{operator}' in filter key '{key}'")]
    UnknownOperator { key: String, operator: String },

    /// A join filter was built without part of its relation topology.
    #[error("filter '{key}' is missing its {missing}")]
    Incomplete { key: String, missing: &'static str },
}

/// Handler error with status mapping and sanitised responses.
#[derive(Debug)]
pub enum QueryError {
    /// 404 Not Found - an id lookup matched nothing
    NotFound {
        /// Resource type (e.g., "post")
        resource: String,
        /// The id that was requested
        id: Option<String>,
    },

    /// 400 Bad Request - projection, ordering or filter refers to something invalid
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 502 Bad Gateway - the search backend failed or answered with garbage
    SearchBackend {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: SearchError,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl QueryError {
    /// Create a 404 Not Found error
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 500 error from a database error. Details are logged, never sent.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 502 error from a search backend failure.
    pub fn search_backend(err: SearchError) -> Self {
        Self::SearchBackend {
            message: "The search backend is unavailable".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SearchBackend { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// User-facing error message (sanitised)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message }
            | Self::Database { message, .. }
            | Self::SearchBackend { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::SearchBackend { internal, .. } => {
                tracing::error!(error = %internal, "Search backend error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Query error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        self.log_internal();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for QueryError {}

/// `DbErr::RecordNotFound` becomes 404, every other database error becomes 500.
impl From<DbErr> for QueryError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}

impl From<SearchError> for QueryError {
    fn from(err: SearchError) -> Self {
        Self::search_backend(err)
    }
}

/// Only reached for handler-level lookups (ordering, projection, soft-delete
/// column); per-filter errors are skipped before they get here.
impl From<FilterError> for QueryError {
    fn from(err: FilterError) -> Self {
        Self::bad_request(err.to_string())
    }
}
