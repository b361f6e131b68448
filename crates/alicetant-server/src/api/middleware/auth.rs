use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::domain::{AuthToken, User};
use crate::error::AppError;
use crate::AppState;

/// The authenticated actor, injected into request extensions for handlers.
#[derive(Clone)]
pub struct AuthContext {
    pub user: User,
    pub token: AuthToken,
}

pub async fn middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidToken)?;

    if token.len() < 12 {
        return Err(AppError::InvalidToken);
    }
    let prefix = &token[..12];

    let auth_token: AuthToken = sqlx::query_as(
        "SELECT * FROM auth_tokens WHERE token_prefix = $1 AND revoked_at IS NULL",
    )
    .bind(prefix)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::InvalidToken)?;

    if !auth_token.is_valid() || !auth_token.verify(token) {
        return Err(AppError::InvalidToken);
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth_token.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

    sqlx::query("UPDATE auth_tokens SET last_used_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(auth_token.id)
        .execute(&state.db)
        .await?;

    req.extensions_mut().insert(AuthContext {
        user,
        token: auth_token,
    });

    Ok(next.run(req).await)
}
