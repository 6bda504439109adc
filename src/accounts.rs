//! Account lifecycle.
//!
//! Accounts are created at sign-up or first OAuth login by the out-of-scope
//! session layer, which hands this module an already-hashed password. The
//! role is fixed at creation; there is deliberately no promotion API.

use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{self, NewUser};
use crate::db::DatabaseError;
use crate::models::User;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email {0} is already registered")]
    EmailTaken(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Create an account, enforcing email uniqueness.
pub fn create_account(conn: &Connection, account: &NewUser) -> Result<i64, AccountError> {
    if repository::get_user_by_email(conn, &account.email)?.is_some() {
        return Err(AccountError::EmailTaken(account.email.clone()));
    }

    let id = match repository::insert_user(conn, account) {
        Ok(id) => id,
        // Unique index hit by a sign-up racing past the pre-check
        Err(DatabaseError::Sqlite(e)) if is_email_unique_violation(&e) => {
            return Err(AccountError::EmailTaken(account.email.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = id, role = account.role.as_str(), "Account created");
    Ok(id)
}

/// Account by id, for the session layer to build an `Identity` from.
pub fn get_account(conn: &Connection, id: i64) -> Result<Option<User>, AccountError> {
    Ok(repository::get_user(conn, id)?)
}

/// Account by email, for the credentials login path.
pub fn find_account_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AccountError> {
    Ok(repository::get_user_by_email(conn, email)?)
}

fn is_email_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && msg.as_deref().is_some_and(|m| m.contains("users.email"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::UserRole;

    fn new_account(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Ana".into(),
            email: email.into(),
            phone: "555-0100".into(),
            password_hash: "$argon2id$stub".into(),
            role,
        }
    }

    #[test]
    fn account_created_and_found_by_email() {
        let conn = open_memory_database().unwrap();
        let id = create_account(&conn, &new_account("ana@example.com", UserRole::User)).unwrap();

        let user = find_account_by_email(&conn, "ana@example.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.password_hash, "$argon2id$stub");
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &new_account("ana@example.com", UserRole::User)).unwrap();

        let err =
            create_account(&conn, &new_account("ana@example.com", UserRole::Admin)).unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken(_)));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn role_is_fixed_at_creation() {
        let conn = open_memory_database().unwrap();
        let id = create_account(&conn, &new_account("admin@example.com", UserRole::Admin)).unwrap();

        let user = get_account(&conn, id).unwrap().unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn missing_account_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_account(&conn, 42).unwrap().is_none());
        assert!(find_account_by_email(&conn, "nobody@example.com").unwrap().is_none());
    }
}
