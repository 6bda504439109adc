//! Repository layer — entity-scoped database operations.
//!
//! Free functions over a `rusqlite::Connection`, one sub-module per entity.
//! Authorization lives above this layer (`accounts`, `pets`, `booking`);
//! repository functions trust their callers.

mod appointment;
mod pet;
mod user;

pub use appointment::*;
pub use pet::*;
pub use user::*;
