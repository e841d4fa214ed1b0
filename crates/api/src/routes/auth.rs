//! Authentication routes.

use axum::{Json, Router, extract::State, routing::post};
use tracing::{error, info};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};
use clientdesk_core::auth::verify_password;
use clientdesk_db::UserRepository;
use clientdesk_shared::{
    AppError,
    auth::{LoginRequest, LoginResponse, UserInfo},
};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Invalid email or password".to_string()))
}

/// POST /auth/login - Authenticate user and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user_repo = UserRepository::new((*state.db).clone());

    let Some(user) = user_repo.find_active_by_email(&payload.email).await? else {
        info!(email = %payload.email, "Login attempt for unknown or disabled user");
        return Err(invalid_credentials());
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = user.id, "Failed login attempt - invalid password");
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "Password verification error");
            return Err(ApiError(AppError::Internal(e.to_string())));
        }
    }

    let access_token = state
        .jwt_service
        .generate_access_token(user.id, user.tenant_id, &user.display_name, &user.role)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    info!(user_id = user.id, tenant_id = user.tenant_id, "User logged in");

    Ok(Json(LoginResponse {
        user: UserInfo {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}
