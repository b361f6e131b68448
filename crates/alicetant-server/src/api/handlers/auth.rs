use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::auth::AuthContext;
use crate::domain::{
    hash_password, AuthToken, IssuedToken, LoginRequest, SignupRequest, UpdateProfileRequest,
    User, UserResponse,
};
use crate::error::{is_constraint_violation, AppError, Result};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: IssuedToken,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.full_name.trim().is_empty() {
        return Err(AppError::Validation("full_name cannot be empty".into()));
    }

    let now = Utc::now();
    let password_hash = hash_password(&req.password);

    let user: User = match sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role, full_name, phone, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(req.role)
    .bind(req.full_name.trim())
    .bind(&req.phone)
    .bind(now)
    .fetch_one(&state.db)
    .await
    {
        Ok(user) => user,
        Err(err) if is_constraint_violation(&err, "unique_user_email") => {
            return Err(AppError::DuplicateEmail(email));
        }
        Err(err) => return Err(err.into()),
    };

    let issued = issue_token(&state, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token: issued,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::UserNotFound(email.clone()))?;

    if !user.verify_password(&req.password) {
        return Err(AppError::InvalidCredentials);
    }

    let issued = issue_token(&state, user.id).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token: issued,
    }))
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<UserResponse> {
    Json(auth.user.into())
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    if let Some(name) = &req.full_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("full_name cannot be empty".into()));
        }
    }

    let user: User = sqlx::query_as(
        r#"
        UPDATE users
        SET full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            updated_at = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.user.id)
    .bind(req.full_name.as_deref().map(str::trim))
    .bind(&req.phone)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(user.into()))
}

async fn issue_token(state: &AppState, user_id: Uuid) -> Result<IssuedToken> {
    let (auth_token, issued) = AuthToken::generate(user_id);

    sqlx::query(
        r#"
        INSERT INTO auth_tokens (id, user_id, token_hash, token_prefix, rate_limit_per_minute, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(auth_token.id)
    .bind(auth_token.user_id)
    .bind(&auth_token.token_hash)
    .bind(&auth_token.token_prefix)
    .bind(state.config.rate_limit_per_minute)
    .bind(auth_token.created_at)
    .execute(&state.db)
    .await?;

    Ok(issued)
}
