//! A user's garden: plants they grow and dated care logs

use crate::error::{is_foreign_key_violation, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// A plant in a user's garden
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GardenPlant {
    /// Row id
    pub id: i64,
    /// Owner
    pub user_id: i64,
    /// Display name (e.g. "My Tomato #1")
    pub plant_name: String,
    /// Species (e.g. "Tomato")
    pub species: String,
    /// Free-form date
    pub date_planted: String,
    /// Photo URL
    pub image_url: Option<String>,
}

/// Request body for a new garden plant
#[derive(Debug, Clone, Deserialize)]
pub struct NewGardenPlant {
    /// Owner
    pub user_id: i64,
    /// Display name
    pub plant_name: String,
    /// Species
    pub species: String,
    /// Free-form date
    pub date_planted: String,
    /// Photo URL
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A dated care note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GardenLog {
    /// Row id
    pub id: i64,
    /// Garden plant the log belongs to
    pub user_plant_id: i64,
    /// Free-form date
    pub date: String,
    /// Note text
    pub note: String,
    /// Health status ("Healthy", "Diseased", ...)
    pub status: String,
    /// Photo URL
    pub image_url: Option<String>,
}

/// Request body for a new log
#[derive(Debug, Clone, Deserialize)]
pub struct NewGardenLog {
    /// Garden plant the log belongs to
    pub user_plant_id: i64,
    /// Free-form date
    pub date: String,
    /// Note text
    pub note: String,
    /// Health status
    pub status: String,
    /// Photo URL
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Garden plants and logs
#[derive(Clone)]
pub struct GardenStore {
    pool: SqlitePool,
}

impl GardenStore {
    /// Create a store over an initialized pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a plant to a user's garden
    pub async fn add_plant(&self, plant: NewGardenPlant) -> Result<GardenPlant> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_plants (user_id, plant_name, species, date_planted, image_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(plant.user_id)
        .bind(&plant.plant_name)
        .bind(&plant.species)
        .bind(&plant.date_planted)
        .bind(&plant.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Error::NotFound(format!("User {}", plant.user_id))
            } else {
                e.into()
            }
        })?;

        Ok(GardenPlant {
            id: result.last_insert_rowid(),
            user_id: plant.user_id,
            plant_name: plant.plant_name,
            species: plant.species,
            date_planted: plant.date_planted,
            image_url: plant.image_url,
        })
    }

    /// All plants of a user, oldest first
    pub async fn list_plants(&self, user_id: i64) -> Result<Vec<GardenPlant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, plant_name, species, date_planted, image_url
            FROM user_plants
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(plant_from_row).collect())
    }

    /// Delete a plant and its logs
    pub async fn delete_plant(&self, plant_id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM user_plants WHERE id = ?")
            .bind(plant_id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Plant".to_string()));
        }
        Ok(())
    }

    /// Add a care log to a garden plant
    pub async fn add_log(&self, log: NewGardenLog) -> Result<GardenLog> {
        let result = sqlx::query(
            r#"
            INSERT INTO garden_logs (user_plant_id, date, note, status, image_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.user_plant_id)
        .bind(&log.date)
        .bind(&log.note)
        .bind(&log.status)
        .bind(&log.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Error::NotFound("Plant".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(GardenLog {
            id: result.last_insert_rowid(),
            user_plant_id: log.user_plant_id,
            date: log.date,
            note: log.note,
            status: log.status,
            image_url: log.image_url,
        })
    }

    /// All logs of a garden plant, oldest first
    pub async fn list_logs(&self, plant_id: i64) -> Result<Vec<GardenLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_plant_id, date, note, status, image_url
            FROM garden_logs
            WHERE user_plant_id = ?
            ORDER BY id
            "#,
        )
        .bind(plant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| GardenLog {
                id: row.get("id"),
                user_plant_id: row.get("user_plant_id"),
                date: row.get("date"),
                note: row.get("note"),
                status: row.get("status"),
                image_url: row.get("image_url"),
            })
            .collect())
    }
}

fn plant_from_row(row: &SqliteRow) -> GardenPlant {
    GardenPlant {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plant_name: row.get("plant_name"),
        species: row.get("species"),
        date_planted: row.get("date_planted"),
        image_url: row.get("image_url"),
    }
}
