use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::auth::AuthContext;
use crate::domain::{
    Business, CreateBusinessRequest, UpdateBusinessRequest, UserRole, MAX_SUMMARY_LEN,
};
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    offset: Option<i64>,
    q: Option<String>,
}

fn default_limit() -> i64 {
    50
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Business>>> {
    let businesses: Vec<Business> = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => {
            sqlx::query_as(
                r#"
                SELECT * FROM businesses
                WHERE name ILIKE $1 OR summary ILIKE $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(format!("%{}%", q))
            .bind(query.limit)
            .bind(query.offset.unwrap_or(0))
            .fetch_all(&state.db)
            .await?
        }
        _ => {
            sqlx::query_as("SELECT * FROM businesses ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(query.limit)
                .bind(query.offset.unwrap_or(0))
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(businesses))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse> {
    if auth.user.role != UserRole::Provider {
        return Err(AppError::Unauthorized(
            "only providers can create businesses".into(),
        ));
    }

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("business name cannot be empty".into()));
    }
    if req.summary.len() > MAX_SUMMARY_LEN {
        return Err(AppError::Validation(format!(
            "summary exceeds maximum length of {} characters (got {})",
            MAX_SUMMARY_LEN,
            req.summary.len()
        )));
    }

    let now = Utc::now();

    let business: Business = sqlx::query_as(
        r#"
        INSERT INTO businesses (id, provider_id, name, summary, logo_url, description, phone, email, address, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.user.id)
    .bind(name)
    .bind(&req.summary)
    .bind(&req.logo_url)
    .bind(&req.description)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(business)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Business>> {
    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(id))?;

    Ok(Json(business))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBusinessRequest>,
) -> Result<Json<Business>> {
    let business = owned_business(&state, id, &auth).await?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("business name cannot be empty".into()));
        }
    }
    if let Some(summary) = &req.summary {
        if summary.len() > MAX_SUMMARY_LEN {
            return Err(AppError::Validation(format!(
                "summary exceeds maximum length of {} characters (got {})",
                MAX_SUMMARY_LEN,
                summary.len()
            )));
        }
    }

    let business: Business = sqlx::query_as(
        r#"
        UPDATE businesses
        SET name = COALESCE($2, name),
            summary = COALESCE($3, summary),
            logo_url = COALESCE($4, logo_url),
            description = COALESCE($5, description),
            phone = COALESCE($6, phone),
            email = COALESCE($7, email),
            address = COALESCE($8, address),
            updated_at = $9
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(business.id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.summary)
    .bind(&req.logo_url)
    .bind(&req.description)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(business))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let business = owned_business(&state, id, &auth).await?;

    // FK cascades remove the business's availability windows, appointments
    // and their customer links in the same statement.
    sqlx::query("DELETE FROM businesses WHERE id = $1")
        .bind(business.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch a business and require the actor to be its owning provider.
pub async fn owned_business(
    state: &AppState,
    business_id: Uuid,
    auth: &AuthContext,
) -> Result<Business> {
    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))?;

    if business.provider_id != auth.user.id {
        return Err(AppError::Unauthorized(format!(
            "business {} is owned by a different provider",
            business_id
        )));
    }

    Ok(business)
}
