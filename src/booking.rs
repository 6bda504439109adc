//! Booking conflict resolver.
//!
//! Serializes concurrent booking attempts against the single-practitioner
//! schedule: at most one appointment may occupy a (date, time) slot. The
//! exclusivity check runs inside one `BEGIN IMMEDIATE` transaction, so the
//! check and the insert observe the same database state; the unique index on
//! `appointments(visit_date, visit_time)` backs the check as a second line
//! of defense and is reported as the same `SlotConflict` outcome.
//!
//! Transient store failures (busy/locked) are the only retryable class.
//! Conflicts and validation failures are deterministic outcomes and are
//! returned on the first occurrence.

use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use thiserror::Error;

use crate::db::repository::{self, NewAppointment};
use crate::db::DatabaseError;
use crate::identity::Identity;
use crate::models::enums::AppointmentStatus;

/// Strict 24-hour time of day. `"14:5"` and `"25:00"` do not match.
static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

/// Accepted calendar date inputs, all normalized to ISO `YYYY-MM-DD`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// A validated, normalized bookable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: String,
}

impl Slot {
    /// Parse and normalize raw date/time input.
    pub fn parse(date: &str, time: &str) -> Result<Self, BookingError> {
        let date = date.trim();
        let time = time.trim();

        let parsed_date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
            .ok_or_else(|| {
                BookingError::InvalidInput(format!(
                    "Unrecognized date {date:?} (expected YYYY-MM-DD)"
                ))
            })?;

        if !TIME_OF_DAY.is_match(time) {
            return Err(BookingError::InvalidInput(format!(
                "Unrecognized time {time:?} (expected 24-hour HH:MM)"
            )));
        }

        Ok(Self {
            date: parsed_date,
            time: time.to_string(),
        })
    }

    /// Stored ISO representation of the date.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Failure taxonomy for booking operations.
///
/// `SlotConflict` and `InvalidInput` are expected, user-facing outcomes.
/// `TransientStore` is the only class eligible for retry.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Not authorized for this operation")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slot {date} {time} is already booked")]
    SlotConflict { date: String, time: String },

    #[error("Storage temporarily unavailable: {0}")]
    TransientStore(String),

    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

/// Fixed-delay retry policy for transient store failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Persistence collaborator
// ═══════════════════════════════════════════════════════════

/// Narrow transactional interface the resolver needs from the store.
pub trait SlotStore {
    /// Owner id of the pet, or `None` if the pet does not exist.
    fn pet_owner(&mut self, pet_id: i64) -> Result<Option<i64>, BookingError>;

    /// Atomically verify the slot is free and insert a pending appointment.
    /// Returns the new appointment id, or `SlotConflict` without writing.
    fn reserve(&mut self, slot: &Slot, pet_id: i64, user_id: i64) -> Result<i64, BookingError>;
}

impl SlotStore for Connection {
    fn pet_owner(&mut self, pet_id: i64) -> Result<Option<i64>, BookingError> {
        let pet = repository::get_pet(self, pet_id).map_err(classify_store_error)?;
        Ok(pet.map(|p| p.owner_id))
    }

    fn reserve(&mut self, slot: &Slot, pet_id: i64, user_id: i64) -> Result<i64, BookingError> {
        // IMMEDIATE takes the write lock up front, so no second writer can
        // interleave between the slot check and the insert.
        let tx = self
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| classify_store_error(DatabaseError::Sqlite(e)))?;

        if repository::slot_taken(&tx, slot.date, &slot.time).map_err(classify_store_error)? {
            // Dropping the transaction rolls back; nothing was written anyway.
            return Err(BookingError::SlotConflict {
                date: slot.date_string(),
                time: slot.time.clone(),
            });
        }

        let id = repository::insert_appointment(
            &tx,
            &NewAppointment {
                user_id,
                pet_id,
                visit_date: slot.date,
                visit_time: slot.time.clone(),
            },
        )
        .map_err(|e| match e {
            // Unique slot index tripped by a writer that won the race.
            DatabaseError::Sqlite(ref s) if is_slot_unique_violation(s) => {
                BookingError::SlotConflict {
                    date: slot.date_string(),
                    time: slot.time.clone(),
                }
            }
            other => classify_store_error(other),
        })?;

        tx.commit()
            .map_err(|e| classify_store_error(DatabaseError::Sqlite(e)))?;

        tracing::info!(
            appointment_id = id,
            date = %slot.date,
            time = %slot.time,
            "Booked appointment slot"
        );
        Ok(id)
    }
}

// ═══════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════

/// Book the given (date, time) slot for a pet, single attempt.
///
/// The requester must be signed in and must own the pet; admins may book on
/// a customer's behalf. The appointment is always recorded against the pet's
/// owner with status `pending`. Exactly one row is written on success, zero
/// on any failure.
pub fn request_booking<S: SlotStore>(
    store: &mut S,
    requester: Option<&Identity>,
    pet_id: i64,
    date: &str,
    time: &str,
) -> Result<i64, BookingError> {
    let requester = requester.ok_or(BookingError::Unauthenticated)?;
    let slot = Slot::parse(date, time)?;

    let owner_id = store
        .pet_owner(pet_id)?
        .ok_or_else(|| BookingError::InvalidInput(format!("Unknown pet id {pet_id}")))?;

    if owner_id != requester.id && !requester.is_admin() {
        return Err(BookingError::Forbidden);
    }

    store.reserve(&slot, pet_id, owner_id)
}

/// `request_booking` with retries on `TransientStore` failures only.
///
/// Deterministic outcomes (conflict, validation, authorization) pass through
/// on the first occurrence. Exhausting the budget surfaces one aggregated
/// `TransientStore`.
pub fn request_booking_with_retry<S: SlotStore>(
    store: &mut S,
    requester: Option<&Identity>,
    pet_id: i64,
    date: &str,
    time: &str,
    policy: &RetryPolicy,
) -> Result<i64, BookingError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_reason = String::new();

    for attempt in 1..=max_attempts {
        match request_booking(store, requester, pet_id, date, time) {
            Ok(id) => return Ok(id),
            Err(BookingError::TransientStore(reason)) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %reason,
                    "Transient store failure during booking"
                );
                last_reason = reason;
                if attempt < max_attempts {
                    std::thread::sleep(policy.delay);
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(BookingError::TransientStore(format!(
        "Giving up after {max_attempts} attempts: {last_reason}"
    )))
}

/// Overwrite an appointment's status. Admin only.
///
/// Accepts any of the four values with no transition graph: the schedule has
/// no enforced lifecycle and cancelled/done appointments may be reassigned.
pub fn set_appointment_status(
    conn: &Connection,
    actor: Option<&Identity>,
    appointment_id: i64,
    status: AppointmentStatus,
) -> Result<(), BookingError> {
    let actor = actor.ok_or(BookingError::Unauthenticated)?;
    if !actor.is_admin() {
        return Err(BookingError::Forbidden);
    }

    let changed = repository::update_appointment_status(conn, appointment_id, status)
        .map_err(classify_store_error)?;
    if changed == 0 {
        return Err(BookingError::InvalidInput(format!(
            "Unknown appointment id {appointment_id}"
        )));
    }

    tracing::info!(
        appointment_id,
        status = status.as_str(),
        "Appointment status updated"
    );
    Ok(())
}

/// Parse and apply a status supplied as a raw string (admin table input).
pub fn set_appointment_status_str(
    conn: &Connection,
    actor: Option<&Identity>,
    appointment_id: i64,
    status: &str,
) -> Result<(), BookingError> {
    let status = AppointmentStatus::from_str(status)
        .map_err(|_| BookingError::InvalidInput(format!("Unknown status {status:?}")))?;
    set_appointment_status(conn, actor, appointment_id, status)
}

// ═══════════════════════════════════════════════════════════
// Error classification
// ═══════════════════════════════════════════════════════════

/// Map a store error onto the booking taxonomy: busy/locked is transient,
/// everything else unclassifiable is `Unknown`.
fn classify_store_error(e: DatabaseError) -> BookingError {
    match &e {
        DatabaseError::Sqlite(sqlite_err) if is_transient(sqlite_err) => {
            BookingError::TransientStore(e.to_string())
        }
        _ => BookingError::Unknown(e.to_string()),
    }
}

fn is_transient(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn is_slot_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && msg
                    .as_deref()
                    .is_some_and(|m| m.contains("appointments.visit_date"))
        }
        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
