use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use std::sync::Arc;

use super::AuthService;
use crate::models::User;

/// The signed-in caller of a request, resolved from its bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub access_token: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthenticated() -> Response {
    (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(unauthenticated());
        };

        let auth = Arc::<AuthService>::from_ref(state);
        match auth.current_user(token).await {
            Ok(user) => Ok(Self {
                user,
                access_token: token.to_string(),
            }),
            Err(e) if e.client_status().is_some() => {
                tracing::debug!("Rejected bearer token: {e}");
                Err(unauthenticated())
            }
            Err(e) => {
                tracing::error!("failed to resolve session: {e}");
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify session").into_response())
            }
        }
    }
}
