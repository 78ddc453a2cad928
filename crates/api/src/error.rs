//! API error types with HTTP response mapping.

use analytics::AnalyticsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use orchestrator::OrchestratorError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Request conflicts with existing data (duplicate email).
    BadRequest(String),
    /// Request fields failed validation.
    Unprocessable(String),
    /// Merchant is not allowed to transact.
    Forbidden(String),
    /// API key not recognised.
    Unauthorized(String),
    /// Request conflicts with the current state of a resource.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string()).increment(1);
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_api(err: DomainError) -> ApiError {
    if err.is_validation() {
        return ApiError::Unprocessable(err.to_string());
    }
    match err {
        DomainError::InvalidStatusTransition { .. } | DomainError::NotReconcilable { .. } => {
            ApiError::Conflict(err.to_string())
        }
        other => ApiError::Internal(other.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        domain_error_to_api(err)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::MerchantNotFound(_) => {
                ApiError::NotFound("Merchant not found".to_string())
            }
            OrchestratorError::TransactionNotFound(_) => {
                ApiError::NotFound("Transaction not found".to_string())
            }
            OrchestratorError::MerchantInactive(_) => {
                ApiError::Forbidden("Merchant account is inactive".to_string())
            }
            OrchestratorError::DuplicateEmail(_) => {
                ApiError::BadRequest("Merchant with this email already exists".to_string())
            }
            OrchestratorError::InvalidApiKey => ApiError::Unauthorized(err.to_string()),
            OrchestratorError::IdempotencyConflict { .. }
            | OrchestratorError::RequestInProgress { .. } => ApiError::Conflict(err.to_string()),
            OrchestratorError::Domain(e) => domain_error_to_api(e),
            OrchestratorError::IdentityExhausted { .. }
            | OrchestratorError::GatewayUnavailable(_)
            | OrchestratorError::SettlementAborted(_)
            | OrchestratorError::Ledger(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use common::{MerchantId, TransactionId};
    use domain::TransactionStatus;
    use rust_decimal::Decimal;

    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn not_found_variants() {
        assert_eq!(
            status_of(OrchestratorError::MerchantNotFound(MerchantId::new("MERCH_X"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(OrchestratorError::TransactionNotFound(TransactionId::new(
                "TXN_X"
            ))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn merchant_state_errors() {
        assert_eq!(
            status_of(OrchestratorError::MerchantInactive(MerchantId::new("MERCH_X"))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(OrchestratorError::DuplicateEmail("a@example.com".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrchestratorError::InvalidApiKey),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn validation_is_unprocessable() {
        assert_eq!(
            status_of(DomainError::InvalidAmount {
                amount: Decimal::ZERO
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(OrchestratorError::Domain(DomainError::UnknownGateway {
                name: "venmo".into()
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn state_conflicts() {
        assert_eq!(
            status_of(DomainError::NotReconcilable {
                status: TransactionStatus::Pending
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OrchestratorError::IdempotencyConflict {
                merchant_id: MerchantId::new("MERCH_X"),
                key: "k".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OrchestratorError::RequestInProgress {
                merchant_id: MerchantId::new("MERCH_X"),
                key: "k".into()
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        assert_eq!(
            status_of(OrchestratorError::IdentityExhausted { attempts: 3 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(OrchestratorError::SettlementAborted("task cancelled".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
