use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_macros::debug_handler;

use std::sync::Arc;

use crate::{
    auth::{AuthService, AuthUser, SignUpOutcome},
    dto::{CredentialsRequest, RefreshRequest, SessionResponse, UserResponse},
    state::AppState,
    supabase::SupabaseError,
};

/// Rejections from the auth service carry a message meant for the login form.
fn auth_failure(e: &SupabaseError, action: &str) -> Response {
    if let Some(status) = e.client_status() {
        return (status, e.message()).into_response();
    }
    tracing::error!("failed to {}: {}", action, e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to {action}")).into_response()
}

fn missing_credentials(payload: &CredentialsRequest) -> Option<Response> {
    (payload.email.trim().is_empty() || payload.password.is_empty()).then(|| {
        (StatusCode::BAD_REQUEST, "Email and password are required").into_response()
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 202, description = "Account created, email confirmation pending", body = UserResponse),
        (status = 400, description = "Missing or rejected credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn sign_up(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<CredentialsRequest>,
) -> Response {
    if let Some(rejection) = missing_credentials(&payload) {
        return rejection;
    }

    match auth.sign_up(payload.email.trim(), &payload.password).await {
        Ok(SignUpOutcome::Session(session)) => {
            (StatusCode::CREATED, Json(SessionResponse::from(session))).into_response()
        }
        Ok(SignUpOutcome::PendingConfirmation(user)) => {
            (StatusCode::ACCEPTED, Json(UserResponse::from(user))).into_response()
        }
        Err(e) => auth_failure(&e, "sign up"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Missing or rejected credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn sign_in(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<CredentialsRequest>,
) -> Response {
    if let Some(rejection) = missing_credentials(&payload) {
        return rejection;
    }

    match auth.sign_in(payload.email.trim(), &payload.password).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(session))).into_response(),
        Err(e) => auth_failure(&e, "sign in"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session refreshed", body = SessionResponse),
        (status = 400, description = "Refresh token rejected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn refresh(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<RefreshRequest>,
) -> Response {
    match auth.refresh(&payload.refresh_token).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(session))).into_response(),
        Err(e) => auth_failure(&e, "refresh session"),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    responses(
        (status = 303, description = "Redirect to the Google sign-in page"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn sign_in_with_google(State(auth): State<Arc<AuthService>>) -> Response {
    match auth.google_authorize_url() {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => auth_failure(&e, "start Google sign in"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn sign_out(State(auth): State<Arc<AuthService>>, caller: AuthUser) -> Response {
    if let Err(e) = auth.sign_out(&caller.access_token).await {
        tracing::warn!("auth service did not confirm sign out: {}", e);
    }
    StatusCode::NO_CONTENT.into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Currently signed in user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[debug_handler(state = AppState)]
pub async fn session(caller: AuthUser) -> Response {
    (StatusCode::OK, Json(UserResponse::from(caller.user))).into_response()
}
