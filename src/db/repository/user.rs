use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::User;

/// Insert payload for a new account. The id and created_at are store-generated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: UserRole,
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, email, phone, password_hash, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.name,
            user.email,
            user.phone,
            user.password_hash,
            user.role.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, phone, password_hash, role, created_at
             FROM users WHERE id = ?1",
            params![id],
            user_row_from_rusqlite,
        )
        .optional()?;

    row.map(user_from_row).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, phone, password_hash, role, created_at
             FROM users WHERE email = ?1",
            params![email],
            user_row_from_rusqlite,
        )
        .optional()?;

    row.map(user_from_row).transpose()
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, password_hash, role, created_at
         FROM users ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map([], user_row_from_rusqlite)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for User mapping
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    password_hash: String,
    role: String,
    created_at: chrono::NaiveDateTime,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        password_hash: row.password_hash,
        role: UserRole::from_str(&row.role)?,
        created_at: row.created_at,
    })
}
