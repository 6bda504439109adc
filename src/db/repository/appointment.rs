use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

/// Insert payload for a new appointment. Status always starts as `pending`.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: i64,
    pub pet_id: i64,
    pub visit_date: NaiveDate,
    pub visit_time: String,
}

pub fn insert_appointment(conn: &Connection, appt: &NewAppointment) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (user_id, pet_id, visit_date, visit_time, status)
         VALUES (?1, ?2, ?3, ?4, 'pending')",
        params![
            appt.user_id,
            appt.pet_id,
            appt.visit_date.to_string(),
            appt.visit_time,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether any appointment occupies the exact (date, time) slot,
/// regardless of owner or pet.
pub fn slot_taken(conn: &Connection, date: NaiveDate, time: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE visit_date = ?1 AND visit_time = ?2",
        params![date.to_string(), time],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, pet_id, visit_date, visit_time, status, created_at
             FROM appointments WHERE id = ?1",
            params![id],
            appointment_row_from_rusqlite,
        )
        .optional()?;

    row.map(appointment_from_row).transpose()
}

pub fn list_appointments_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, pet_id, visit_date, visit_time, status, created_at
         FROM appointments WHERE user_id = ?1
         ORDER BY visit_date ASC, visit_time ASC",
    )?;

    let rows = stmt.query_map(params![user_id], appointment_row_from_rusqlite)?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row?)?);
    }
    Ok(appts)
}

pub fn list_all_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, pet_id, visit_date, visit_time, status, created_at
         FROM appointments ORDER BY visit_date ASC, visit_time ASC",
    )?;

    let rows = stmt.query_map([], appointment_row_from_rusqlite)?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row?)?);
    }
    Ok(appts)
}

/// Overwrite the status field. Returns the number of rows changed
/// (0 when the appointment does not exist).
pub fn update_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(changed)
}

pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: i64,
    user_id: i64,
    pet_id: i64,
    visit_date: String,
    visit_time: String,
    status: String,
    created_at: chrono::NaiveDateTime,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        pet_id: row.get(2)?,
        visit_date: row.get(3)?,
        visit_time: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        user_id: row.user_id,
        pet_id: row.pet_id,
        visit_date: NaiveDate::parse_from_str(&row.visit_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        visit_time: row.visit_time,
        status: AppointmentStatus::from_str(&row.status)?,
        created_at: row.created_at,
    })
}
