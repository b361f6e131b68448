use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::auth::AuthContext;
use crate::domain::{
    sort_for_display, Appointment, AppointmentResponse, AppointmentStatus,
    BookAppointmentRequest, Business, UserRole,
};
use crate::error::{is_constraint_violation, AppError, Result};
use crate::AppState;

/// Partial unique index on (business_id, appointment_date, appointment_time)
/// restricted to active rows. The sole arbiter when bookings race.
const ACTIVE_SLOT_CONSTRAINT: &str = "unique_active_appointment_slot";

#[derive(Deserialize)]
pub struct ListQuery {
    business_id: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentResponse>>> {
    let mut appointments: Vec<Appointment> = match auth.user.role {
        UserRole::Provider => match query.business_id {
            Some(business_id) => {
                let business: Business =
                    sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
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

                sqlx::query_as(
                    r#"
                    SELECT * FROM appointments
                    WHERE business_id = $1
                      AND ($2::date IS NULL OR appointment_date >= $2)
                      AND ($3::date IS NULL OR appointment_date <= $3)
                    "#,
                )
                .bind(business_id)
                .bind(query.from)
                .bind(query.to)
                .fetch_all(&state.db)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT a.* FROM appointments a
                    JOIN businesses b ON b.id = a.business_id
                    WHERE b.provider_id = $1
                      AND ($2::date IS NULL OR a.appointment_date >= $2)
                      AND ($3::date IS NULL OR a.appointment_date <= $3)
                    "#,
                )
                .bind(auth.user.id)
                .bind(query.from)
                .bind(query.to)
                .fetch_all(&state.db)
                .await?
            }
        },
        UserRole::Customer => {
            sqlx::query_as(
                r#"
                SELECT a.* FROM appointments a
                JOIN appointment_customers ac ON ac.appointment_id = a.id
                WHERE ac.customer_id = $1
                "#,
            )
            .bind(auth.user.id)
            .fetch_all(&state.db)
            .await?
        }
    };

    sort_for_display(&mut appointments, Utc::now().naive_utc());

    let mut customers = load_customer_links(&state, &appointments).await?;

    Ok(Json(
        appointments
            .into_iter()
            .map(|a| {
                let ids = customers.remove(&a.id).unwrap_or_default();
                AppointmentResponse::new(a, ids)
            })
            .collect(),
    ))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BookAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let mut customer_ids = req.customer_ids.clone();
    if customer_ids.is_empty() && auth.user.role == UserRole::Customer {
        customer_ids.push(auth.user.id);
    }
    customer_ids.sort_unstable();
    customer_ids.dedup();

    if customer_ids.is_empty() {
        return Err(AppError::InvalidAppointment(
            "at least one customer is required".into(),
        ));
    }

    // Validated in UTC before the transaction opens, so a doomed request
    // never costs a database round trip.
    let slot = req.date.and_time(req.time);
    if slot <= Utc::now().naive_utc() {
        return Err(AppError::InvalidAppointment(format!(
            "appointment must be in the future (got {} {})",
            req.date, req.time
        )));
    }

    let mut tx = state.db.begin().await?;
    let now = Utc::now();

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(req.business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::BusinessNotFound(req.business_id))?;

    // A provider can only book slots in a business they own.
    if auth.user.role == UserRole::Provider && business.provider_id != auth.user.id {
        return Err(AppError::Unauthorized(format!(
            "business {} is owned by a different provider",
            business.id
        )));
    }

    for &customer_id in &customer_ids {
        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if role != Some(UserRole::Customer) {
            return Err(AppError::InvalidAppointment(format!(
                "customer {} not found",
                customer_id
            )));
        }
    }

    // Fail-fast re-check. The unique index below still decides the winner
    // when two transactions pass this check concurrently.
    if slot_taken(&mut *tx, business.id, req.date, req.time).await? {
        return Err(AppError::TimeSlotConflict {
            business_id: business.id,
            date: req.date,
            time: req.time,
        });
    }

    let appointment: Appointment = match sqlx::query_as(
        r#"
        INSERT INTO appointments (id, business_id, appointment_date, appointment_time, status, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(business.id)
    .bind(req.date)
    .bind(req.time)
    .bind(AppointmentStatus::Active)
    .bind(&req.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    {
        Ok(appointment) => appointment,
        Err(err) if is_constraint_violation(&err, ACTIVE_SLOT_CONSTRAINT) => {
            return Err(AppError::TimeSlotConflict {
                business_id: business.id,
                date: req.date,
                time: req.time,
            });
        }
        Err(err) => return Err(err.into()),
    };

    for &customer_id in &customer_ids {
        sqlx::query(
            "INSERT INTO appointment_customers (appointment_id, customer_id, joined_at) VALUES ($1, $2, $3)",
        )
        .bind(appointment.id)
        .bind(customer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse::new(appointment, customer_ids)),
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>> {
    let appointment: Appointment = sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::AppointmentNotFound(id))?;

    let customer_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT customer_id FROM appointment_customers WHERE appointment_id = $1",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    authorize(&state, &auth, &appointment, &customer_ids).await?;

    Ok(Json(AppointmentResponse::new(appointment, customer_ids)))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>> {
    let mut tx = state.db.begin().await?;

    // Locked so concurrent cancels of the same row serialize.
    let appointment: Appointment =
        sqlx::query_as("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::AppointmentNotFound(id))?;

    let customer_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT customer_id FROM appointment_customers WHERE appointment_id = $1",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let authorized = match auth.user.role {
        UserRole::Provider => {
            let owner: Option<Uuid> =
                sqlx::query_scalar("SELECT provider_id FROM businesses WHERE id = $1")
                    .bind(appointment.business_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            owner == Some(auth.user.id)
        }
        UserRole::Customer => customer_ids.contains(&auth.user.id),
    };
    if !authorized {
        return Err(AppError::Unauthorized(format!(
            "not allowed to cancel appointment {}",
            id
        )));
    }

    // Cancelled is terminal.
    if appointment.status == AppointmentStatus::Cancelled {
        return Err(AppError::InvalidAppointment(format!(
            "appointment {} is already cancelled",
            id
        )));
    }

    let appointment: Appointment = sqlx::query_as(
        "UPDATE appointments SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(AppointmentStatus::Cancelled)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(AppointmentResponse::new(appointment, customer_ids)))
}

#[derive(Deserialize)]
pub struct SlotQuery {
    date: NaiveDate,
    time: NaiveTime,
}

#[derive(Serialize)]
pub struct SlotResponse {
    pub available: bool,
}

pub async fn check_slot(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotResponse>> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM businesses WHERE id = $1)")
        .bind(business_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::BusinessNotFound(business_id));
    }

    let taken = slot_taken(&state.db, business_id, query.date, query.time).await?;

    Ok(Json(SlotResponse { available: !taken }))
}

/// Shared predicate for "is this slot occupied by an active appointment".
/// Used both by `check_slot` and by the booking transaction's re-check so
/// the two can only disagree during a genuine race, which the unique index
/// then settles.
async fn slot_taken<'e, E>(
    executor: E,
    business_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<bool>
where
    E: sqlx::PgExecutor<'e>,
{
    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM appointments
            WHERE business_id = $1
              AND appointment_date = $2
              AND appointment_time = $3
              AND status = 'active'
        )
        "#,
    )
    .bind(business_id)
    .bind(date)
    .bind(time)
    .fetch_one(executor)
    .await?;

    Ok(taken)
}

async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    appointment: &Appointment,
    customer_ids: &[Uuid],
) -> Result<()> {
    let authorized = match auth.user.role {
        UserRole::Provider => {
            let owner: Option<Uuid> =
                sqlx::query_scalar("SELECT provider_id FROM businesses WHERE id = $1")
                    .bind(appointment.business_id)
                    .fetch_optional(&state.db)
                    .await?;
            owner == Some(auth.user.id)
        }
        UserRole::Customer => customer_ids.contains(&auth.user.id),
    };

    if !authorized {
        return Err(AppError::Unauthorized(format!(
            "not allowed to access appointment {}",
            appointment.id
        )));
    }
    Ok(())
}

async fn load_customer_links(
    state: &AppState,
    appointments: &[Appointment],
) -> Result<HashMap<Uuid, Vec<Uuid>>> {
    if appointments.is_empty() {
        return Ok(HashMap::new());
    }

    let ids: Vec<Uuid> = appointments.iter().map(|a| a.id).collect();
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT appointment_id, customer_id FROM appointment_customers WHERE appointment_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&state.db)
    .await?;

    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (appointment_id, customer_id) in rows {
        map.entry(appointment_id).or_default().push(customer_id);
    }
    Ok(map)
}
