use crate::db::errors::DbError;
use crate::types::{Operation, Resource};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Body could not be parsed as JSON
    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    /// Well-formed request that fails validation
    #[error("{message}")]
    InvalidInput { message: String },

    /// Payment callback carried a status outside the known vocabularies
    #[error("Unrecognized payment status: {raw_status}")]
    UnrecognizedStatus { raw_status: String },

    /// Email address failed validation
    #[error("Invalid email address")]
    InvalidEmail,

    /// Authentication required but not provided, or the credential was wrong
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller is authenticated but lacks the role for the operation
    #[error("Insufficient permissions to {action} {resource}")]
    PermissionDenied { action: Operation, resource: Resource },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Repeated submission, or a state transition the database refused
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A setting the handler depends on is absent
    #[error("Server misconfigured: {setting} is not set")]
    ServerMisconfigured { setting: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure body shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,
    /// Machine readable error class
    pub error_code: &'static str,
    /// Human readable, user-safe message
    pub error: String,
    /// Correlates with the `x-request-id` response header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Echo of an unrecognized payment status, for gateway-side diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson { .. } | Error::InvalidInput { .. } | Error::UnrecognizedStatus { .. } | Error::InvalidEmail => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::ServerMisconfigured { .. } | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// The closed error taxonomy exposed to clients as `error_code`
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson { .. } => "invalid_json",
            Error::InvalidInput { .. } | Error::UnrecognizedStatus { .. } => "invalid_input",
            Error::InvalidEmail => "invalid_email",
            Error::Unauthenticated { .. } => "unauthorized",
            Error::PermissionDenied { .. } => "permission_denied",
            Error::NotFound { .. } => "not_found",
            Error::Conflict { .. } => "duplicate_request",
            Error::ServerMisconfigured { .. } => "server_misconfigured",
            Error::Internal { .. } | Error::Other(_) => "internal_error",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "not_found",
                DbError::UniqueViolation { .. } => "duplicate_request",
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => "invalid_input",
                DbError::Other(_) => "db_error",
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidJson { .. } => "Request body is not valid JSON".to_string(),
            Error::InvalidInput { message } => message.clone(),
            Error::UnrecognizedStatus { .. } => "Unrecognized payment status".to_string(),
            Error::InvalidEmail => "Invalid email address".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::PermissionDenied { action, resource } => format!("Insufficient permissions to {action} {resource}"),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::ServerMisconfigured { .. } => "Server is not configured to handle this request".to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => match db_err.table() {
                    Some("contact_inquiries") => "This inquiry has already been submitted".to_string(),
                    Some("member_invitations") => "An invitation for this email is already pending".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }

    fn log(&self) {
        // Log full error details for debugging - different log levels based on severity
        match self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) | Error::ServerMisconfigured { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Conflict or constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::PermissionDenied { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::InvalidJson { .. }
            | Error::InvalidInput { .. }
            | Error::UnrecognizedStatus { .. }
            | Error::InvalidEmail
            | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }

    /// Build the JSON failure envelope for this error
    pub fn envelope(&self, request_id: Option<String>) -> ErrorEnvelope {
        let raw_status = match self {
            Error::UnrecognizedStatus { raw_status } => Some(raw_status.clone()),
            _ => None,
        };

        ErrorEnvelope {
            success: false,
            error_code: self.error_code(),
            error: self.user_message(),
            request_id,
            raw_status,
        }
    }

    /// Convert into a response carrying the given request id
    pub fn into_response_with(self, request_id: Option<String>) -> Response {
        self.log();
        let status = self.status_code();
        (status, Json(self.envelope(request_id))).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
