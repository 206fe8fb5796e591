use super::*;
use crate::services::auth::HashError;
use crate::services::session::PermissionDenied;
use domain::permissions::{Action, Module};

#[test]
fn user_errors_map_to_statuses() {
    let cases = [
        (UserError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
        (UserError::Conflict("username taken".into()), StatusCode::CONFLICT),
        (UserError::Invalid("password too short".into()), StatusCode::BAD_REQUEST),
        (UserError::Denied(PermissionDenied { module: Module::Users, action: Action::Edit }), StatusCode::FORBIDDEN),
        (UserError::Hash(HashError::Password), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
        assert_eq!(user_error_to_status(&err), status, "{err}");
    }
}

#[test]
fn api_error_keeps_client_facing_message() {
    let err: ApiError = UserError::Conflict("username taken".into()).into();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(err.message, "username taken");
}

#[test]
fn role_body_accepts_legacy_manager_name() {
    let body: RoleBody = serde_json::from_str(r#"{"role":"sales_manager"}"#).unwrap();
    assert_eq!(body.role, Role::SalesLeader);
}
