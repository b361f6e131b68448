use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use crate::api::handlers::businesses::owned_business;
use crate::api::middleware::auth::AuthContext;
use crate::domain::{Availability, CreateAvailabilityRequest, UpdateAvailabilityRequest};
use crate::error::{is_constraint_violation, AppError, Result};
use crate::AppState;

pub async fn list_for_business(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<Vec<Availability>>> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM businesses WHERE id = $1)")
        .bind(business_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::BusinessNotFound(business_id));
    }

    let windows: Vec<Availability> = sqlx::query_as(
        "SELECT * FROM availability WHERE business_id = $1 ORDER BY day_of_week, start_time",
    )
    .bind(business_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(windows))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAvailabilityRequest>,
) -> Result<impl IntoResponse> {
    owned_business(&state, req.business_id, &auth).await?;
    validate_window(req.day_of_week, req.start_time, req.end_time)?;

    let now = Utc::now();

    let window: Availability = match sqlx::query_as(
        r#"
        INSERT INTO availability (id, business_id, day_of_week, start_time, end_time, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.business_id)
    .bind(req.day_of_week)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(now)
    .fetch_one(&state.db)
    .await
    {
        Ok(window) => window,
        Err(err) if is_constraint_violation(&err, "unique_availability_window") => {
            return Err(AppError::DuplicateAvailability);
        }
        Err(err) => return Err(err.into()),
    };

    Ok((StatusCode::CREATED, Json(window)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Availability>> {
    let window = owned_window(&state, id, &auth).await?;

    let day_of_week = req.day_of_week.unwrap_or(window.day_of_week);
    let start_time = req.start_time.unwrap_or(window.start_time);
    let end_time = req.end_time.unwrap_or(window.end_time);
    validate_window(day_of_week, start_time, end_time)?;

    let window: Availability = match sqlx::query_as(
        r#"
        UPDATE availability
        SET day_of_week = $2, start_time = $3, end_time = $4, updated_at = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(window.id)
    .bind(day_of_week)
    .bind(start_time)
    .bind(end_time)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await
    {
        Ok(window) => window,
        Err(err) if is_constraint_violation(&err, "unique_availability_window") => {
            return Err(AppError::DuplicateAvailability);
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(window))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let window = owned_window(&state, id, &auth).await?;

    sqlx::query("DELETE FROM availability WHERE id = $1")
        .bind(window.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn validate_window(day_of_week: i32, start_time: NaiveTime, end_time: NaiveTime) -> Result<()> {
    if !(0..=6).contains(&day_of_week) {
        return Err(AppError::Validation(
            "day_of_week must be between 0 (Sunday) and 6 (Saturday)".into(),
        ));
    }
    if end_time <= start_time {
        return Err(AppError::Validation(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}

async fn owned_window(state: &AppState, id: Uuid, auth: &AuthContext) -> Result<Availability> {
    let window: Availability = sqlx::query_as("SELECT * FROM availability WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::AvailabilityNotFound(id))?;

    owned_business(state, window.business_id, auth).await?;

    Ok(window)
}
