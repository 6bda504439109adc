use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Pet;

/// Insert payload for a new pet record.
#[derive(Debug, Clone)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub medical_history: Option<String>,
    pub owner_id: i64,
}

pub fn insert_pet(conn: &Connection, pet: &NewPet) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO pets (name, species, breed, age, weight_kg, medical_history, owner_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            pet.name,
            pet.species,
            pet.breed,
            pet.age,
            pet.weight_kg,
            pet.medical_history,
            pet.owner_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_pet(conn: &Connection, id: i64) -> Result<Option<Pet>, DatabaseError> {
    let pet = conn
        .query_row(
            "SELECT id, name, species, breed, age, weight_kg, medical_history, owner_id
             FROM pets WHERE id = ?1",
            params![id],
            pet_from_row,
        )
        .optional()?;
    Ok(pet)
}

pub fn list_pets_by_owner(conn: &Connection, owner_id: i64) -> Result<Vec<Pet>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, species, breed, age, weight_kg, medical_history, owner_id
         FROM pets WHERE owner_id = ?1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map(params![owner_id], pet_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_all_pets(conn: &Connection) -> Result<Vec<Pet>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, species, breed, age, weight_kg, medical_history, owner_id
         FROM pets ORDER BY owner_id ASC, name ASC",
    )?;

    let rows = stmt.query_map([], pet_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_pet(conn: &Connection, pet: &Pet) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE pets SET name = ?1, species = ?2, breed = ?3, age = ?4,
         weight_kg = ?5, medical_history = ?6 WHERE id = ?7",
        params![
            pet.name,
            pet.species,
            pet.breed,
            pet.age,
            pet.weight_kg,
            pet.medical_history,
            pet.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Pet".into(),
            id: pet.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_pet(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM pets WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Pet".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn pet_from_row(row: &rusqlite::Row<'_>) -> Result<Pet, rusqlite::Error> {
    Ok(Pet {
        id: row.get(0)?,
        name: row.get(1)?,
        species: row.get(2)?,
        breed: row.get(3)?,
        age: row.get(4)?,
        weight_kg: row.get(5)?,
        medical_history: row.get(6)?,
        owner_id: row.get(7)?,
    })
}
