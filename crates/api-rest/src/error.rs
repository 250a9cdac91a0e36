use api_shared::ErrorRes;
use axum::{http::StatusCode, Json};
use scanreg_core::{FieldErrors, IntakeError};
use std::collections::BTreeMap;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorRes>);
pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
            field_errors: BTreeMap::new(),
        }),
    )
}

pub(crate) fn session_not_found() -> ApiError {
    error_response(StatusCode::NOT_FOUND, "Registration session not found")
}

pub(crate) fn field_error_map(errors: &FieldErrors) -> BTreeMap<String, String> {
    errors
        .iter()
        .map(|(field, message)| (field.to_string(), message.to_string()))
        .collect()
}

/// Maps a core error onto a status code.
///
/// Input problems are `422` and carry the per-field map when there is one. Collaborator
/// failures are `502`: the draft is untouched and the call can be repeated.
pub(crate) fn from_intake(context: &str, err: IntakeError) -> ApiError {
    match err {
        IntakeError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorRes {
                error: "Required fields missing or invalid".into(),
                field_errors: field_error_map(&errors),
            }),
        ),
        e if e.is_validation() => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        e if e.is_collaborator() => {
            tracing::error!("{}: {}", context, e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
        e => {
            tracing::error!("{}: {:?}", context, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanreg_core::Field;

    #[test]
    fn validation_errors_carry_the_field_map() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Age, "required");

        let (status, Json(body)) = from_intake("test", IntakeError::Validation(errors));

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.field_errors.get("age").map(String::as_str), Some("required"));
    }

    #[test]
    fn collaborator_errors_are_bad_gateway() {
        let (status, Json(body)) = from_intake(
            "test",
            IntakeError::BackendRejected {
                status: 503,
                message: "maintenance".into(),
            },
        );
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("maintenance"));

        let (status, _) = from_intake("test", IntakeError::NoScanSelected);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
