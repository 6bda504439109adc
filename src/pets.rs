//! Pet lifecycle with ownership enforcement.
//!
//! A pet belongs to exactly one user. Updates and deletes require the owner
//! or an admin; listing is scoped to the caller's pets unless the caller is
//! an admin (back-office view).

use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{self, NewPet};
use crate::db::DatabaseError;
use crate::identity::Identity;
use crate::models::Pet;

#[derive(Debug, Error)]
pub enum PetError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Not authorized for this pet")]
    Forbidden,

    #[error("Pet {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Register a pet for the signed-in owner. The owner on the record is always
/// the requester; admins registering on a customer's behalf set `owner_id`
/// in the payload and keep it.
pub fn register_pet(
    conn: &Connection,
    requester: Option<&Identity>,
    pet: &NewPet,
) -> Result<i64, PetError> {
    let requester = requester.ok_or(PetError::Unauthenticated)?;
    if pet.owner_id != requester.id && !requester.is_admin() {
        return Err(PetError::Forbidden);
    }

    let id = repository::insert_pet(conn, pet)?;
    tracing::info!(pet_id = id, owner_id = pet.owner_id, "Pet registered");
    Ok(id)
}

pub fn get_pet(conn: &Connection, id: i64) -> Result<Option<Pet>, PetError> {
    Ok(repository::get_pet(conn, id)?)
}

/// The caller's pets; all pets for an admin.
pub fn list_pets(conn: &Connection, requester: Option<&Identity>) -> Result<Vec<Pet>, PetError> {
    let requester = requester.ok_or(PetError::Unauthenticated)?;
    let pets = if requester.is_admin() {
        repository::list_all_pets(conn)?
    } else {
        repository::list_pets_by_owner(conn, requester.id)?
    };
    Ok(pets)
}

pub fn update_pet(
    conn: &Connection,
    requester: Option<&Identity>,
    pet: &Pet,
) -> Result<(), PetError> {
    authorize(conn, requester, pet.id)?;
    repository::update_pet(conn, pet)?;
    Ok(())
}

pub fn remove_pet(
    conn: &Connection,
    requester: Option<&Identity>,
    pet_id: i64,
) -> Result<(), PetError> {
    authorize(conn, requester, pet_id)?;
    repository::delete_pet(conn, pet_id)?;
    tracing::info!(pet_id, "Pet removed");
    Ok(())
}

/// Ownership-or-admin gate shared by update and delete.
fn authorize(
    conn: &Connection,
    requester: Option<&Identity>,
    pet_id: i64,
) -> Result<(), PetError> {
    let requester = requester.ok_or(PetError::Unauthenticated)?;
    let pet = repository::get_pet(conn, pet_id)?.ok_or(PetError::NotFound(pet_id))?;
    if pet.owner_id != requester.id && !requester.is_admin() {
        return Err(PetError::Forbidden);
    }
    Ok(())
}
