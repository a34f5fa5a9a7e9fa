//! Translation of controller errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ActionResponse;

use crate::domain::ActionError;

pub fn status_for(error: &ActionError) -> StatusCode {
    match error {
        ActionError::Validation(_) => StatusCode::BAD_REQUEST,
        ActionError::NoActiveChild | ActionError::Rule(_) => StatusCode::CONFLICT,
        ActionError::ChildNotFound(_) | ActionError::TaskNotFound(_) | ActionError::RewardNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ActionError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ActionError::WriteFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let body = ActionResponse {
            success: false,
            message: self.user_message(),
            severity: self.severity(),
        };
        (status_for(&self), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RuleViolation, ValidationError};

    #[test]
    fn test_status_codes() {
        assert_eq!(status_for(&ActionError::Validation(ValidationError::EmptyName)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ActionError::Rule(RuleViolation::EggAlreadyHatched { slot: 1 })),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&ActionError::TaskNotFound("t".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ActionError::PermissionDenied("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&ActionError::WriteFailed("x".into())), StatusCode::BAD_GATEWAY);
    }
}
