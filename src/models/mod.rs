pub mod enums;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use self::enums::{AppointmentStatus, UserRole};

/// Portal account. One per customer or back-office admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
}

/// Patient record. Owned exclusively by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub medical_history: Option<String>,
    pub owner_id: i64,
}

/// Booked consultation slot on the single-practitioner schedule.
///
/// Invariant (enforced by `booking` + the unique slot index): at most one
/// appointment exists per (visit_date, visit_time) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub pet_id: i64,
    pub visit_date: NaiveDate,
    pub visit_time: String,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}
