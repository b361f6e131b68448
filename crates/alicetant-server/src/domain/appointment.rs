use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The booked slot as a single comparable instant (no zone; slots are
    /// compared against UTC wall-clock time).
    pub fn slot(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }

    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.slot() > now && self.status == AppointmentStatus::Active
    }
}

/// Display order used by every listing: upcoming active appointments first,
/// soonest first; then past or cancelled appointments, most recent first.
pub fn sort_for_display(appointments: &mut [Appointment], now: NaiveDateTime) {
    appointments.sort_by(|a, b| match (a.is_upcoming(now), b.is_upcoming(now)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.slot().cmp(&b.slot()),
        (false, false) => b.slot().cmp(&a.slot()),
    });
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub business_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Customers attached to the booking. A customer booking for themselves
    /// may leave this empty; it then defaults to the actor.
    #[serde(default)]
    pub customer_ids: Vec<Uuid>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: String,
    pub customer_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentResponse {
    pub fn new(appointment: Appointment, customer_ids: Vec<Uuid>) -> Self {
        Self {
            id: appointment.id,
            business_id: appointment.business_id,
            date: appointment.appointment_date,
            time: appointment.appointment_time,
            status: appointment.status,
            notes: appointment.notes,
            customer_ids,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(date: &str, time: &str, status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            appointment_date: date.parse().unwrap(),
            appointment_time: time.parse().unwrap(),
            status,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn now() -> NaiveDateTime {
        "2026-06-15T12:00:00".parse().unwrap()
    }

    #[test]
    fn upcoming_requires_future_and_active() {
        let future = appointment("2026-06-16", "09:00:00", AppointmentStatus::Active);
        let past = appointment("2026-06-14", "09:00:00", AppointmentStatus::Active);
        let cancelled = appointment("2026-06-16", "09:00:00", AppointmentStatus::Cancelled);

        assert!(future.is_upcoming(now()));
        assert!(!past.is_upcoming(now()));
        assert!(!cancelled.is_upcoming(now()));
    }

    #[test]
    fn same_day_later_time_is_upcoming() {
        let later_today = appointment("2026-06-15", "12:00:01", AppointmentStatus::Active);
        let earlier_today = appointment("2026-06-15", "11:59:59", AppointmentStatus::Active);

        assert!(later_today.is_upcoming(now()));
        assert!(!earlier_today.is_upcoming(now()));
    }

    #[test]
    fn display_order_puts_upcoming_ascending_before_past_descending() {
        let mut appointments = vec![
            appointment("2026-06-10", "10:00:00", AppointmentStatus::Active),
            appointment("2026-07-01", "09:00:00", AppointmentStatus::Active),
            appointment("2026-06-12", "15:00:00", AppointmentStatus::Active),
            appointment("2026-06-20", "14:00:00", AppointmentStatus::Active),
            appointment("2026-08-01", "08:00:00", AppointmentStatus::Cancelled),
        ];

        sort_for_display(&mut appointments, now());

        let slots: Vec<String> = appointments
            .iter()
            .map(|a| format!("{} {} {:?}", a.appointment_date, a.appointment_time, a.status))
            .collect();

        // Upcoming ascending: 06-20 then 07-01. Past/terminal descending:
        // the cancelled 08-01 slot sorts by its date like any non-upcoming
        // entry, then 06-12, then 06-10.
        assert_eq!(
            slots,
            vec![
                "2026-06-20 14:00:00 Active",
                "2026-07-01 09:00:00 Active",
                "2026-08-01 08:00:00 Cancelled",
                "2026-06-12 15:00:00 Active",
                "2026-06-10 10:00:00 Active",
            ]
        );
    }

    #[test]
    fn display_order_breaks_date_ties_on_time() {
        let mut appointments = vec![
            appointment("2026-06-20", "16:00:00", AppointmentStatus::Active),
            appointment("2026-06-20", "09:00:00", AppointmentStatus::Active),
            appointment("2026-06-01", "09:00:00", AppointmentStatus::Active),
            appointment("2026-06-01", "16:00:00", AppointmentStatus::Active),
        ];

        sort_for_display(&mut appointments, now());

        assert_eq!(
            appointments[0].appointment_time,
            "09:00:00".parse::<NaiveTime>().unwrap()
        );
        assert_eq!(
            appointments[1].appointment_time,
            "16:00:00".parse::<NaiveTime>().unwrap()
        );
        // Past block descends: later time first.
        assert_eq!(
            appointments[2].appointment_time,
            "16:00:00".parse::<NaiveTime>().unwrap()
        );
        assert_eq!(
            appointments[3].appointment_time,
            "09:00:00".parse::<NaiveTime>().unwrap()
        );
    }
}
