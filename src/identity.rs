//! Minimal authenticated-caller information.
//!
//! The session layer (credentials/OAuth, cookie parsing) lives outside this
//! crate; whatever it looks like, it hands the core an `Identity` and nothing
//! more. The core never touches transport-level session representations.

use serde::{Deserialize, Serialize};

use crate::models::enums::UserRole;

/// Identity/role pair for an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub role: UserRole,
}

impl Identity {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
