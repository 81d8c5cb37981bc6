use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Typed invariant violations raised by the validation engine and the
/// document services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ViolationKind {
    LotOverDispatch,
    GlobalOverDispatch,
    EmptySourceDocument,
    DuplicateDCNumber,
    DuplicateDCInvoice,
    DuplicateInvoiceNumber,
    DuplicateSRVNumber,
    ImmutableDocument,
}

impl ViolationKind {
    /// Conflicts are uniqueness or lifecycle clashes with existing rows;
    /// everything else is a quantity rule.
    pub fn is_conflict(self) -> bool {
        matches!(
            self,
            Self::DuplicateDCNumber
                | Self::DuplicateDCInvoice
                | Self::DuplicateInvoiceNumber
                | Self::DuplicateSRVNumber
                | Self::ImmutableDocument
        )
    }
}

/// Error body returned by the HTTP surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ViolationKind>,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Business rule violation ({kind}): {message}")]
    BusinessRuleViolation { kind: ViolationKind, message: String },

    #[error("Conflict ({kind}): {message}")]
    Conflict { kind: ViolationKind, message: String },

    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Builds the error class matching the violation kind.
    pub fn violation(kind: ViolationKind, message: impl Into<String>) -> Self {
        let message = message.into();
        if kind.is_conflict() {
            ServiceError::Conflict { kind, message }
        } else {
            ServiceError::BusinessRuleViolation { kind, message }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// The violation kind, if this error is an invariant violation.
    pub fn kind(&self) -> Option<ViolationKind> {
        match self {
            Self::BusinessRuleViolation { kind, .. } | Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::InternalError(_))
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BusinessRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal errors return generic messages to avoid leaking storage details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!(error = %self, "request failed with internal error");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            kind: self.kind(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(err) => err.into_response(),
            ApiError::ValidationError(msg) => ServiceError::ValidationError(msg).into_response(),
            ApiError::NotFound(msg) => ServiceError::NotFound(msg).into_response(),
        }
    }
}

pub type AppError = ServiceError;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::str::FromStr;

    #[test]
    fn violation_picks_error_class_from_kind() {
        let err = ServiceError::violation(ViolationKind::GlobalOverDispatch, "too much");
        assert!(matches!(err, ServiceError::BusinessRuleViolation { .. }));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ServiceError::violation(ViolationKind::ImmutableDocument, "frozen");
        assert!(matches!(err, ServiceError::Conflict { .. }));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.kind(), Some(ViolationKind::ImmutableDocument));
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("sqlite disk image malformed".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("secret".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::NotFound("DC X".into()).response_message(),
            "Not found: DC X"
        );
    }

    #[test]
    fn violation_kind_round_trips_through_display() {
        for kind in [
            ViolationKind::LotOverDispatch,
            ViolationKind::DuplicateDCInvoice,
            ViolationKind::DuplicateSRVNumber,
        ] {
            assert_eq!(ViolationKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn error_response_carries_violation_kind() {
        let response =
            ServiceError::violation(ViolationKind::DuplicateDCInvoice, "already billed")
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.kind, Some(ViolationKind::DuplicateDCInvoice));
        assert!(payload.message.contains("already billed"));
    }
}
