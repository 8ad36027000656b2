//! Connection pool and schema

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS plants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS diseases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    plant_id INTEGER REFERENCES plants(id),
    severity TEXT NOT NULL DEFAULT '',
    symptoms TEXT NOT NULL DEFAULT '',
    prevention TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_diseases_name ON diseases(name);

CREATE TABLE IF NOT EXISTS treatments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    disease_id INTEGER NOT NULL REFERENCES diseases(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    cost_approx TEXT
);
CREATE INDEX IF NOT EXISTS idx_treatments_disease ON treatments(disease_id);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_plants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    plant_name TEXT NOT NULL,
    species TEXT NOT NULL,
    date_planted TEXT NOT NULL,
    image_url TEXT
);
CREATE INDEX IF NOT EXISTS idx_user_plants_user ON user_plants(user_id);

CREATE TABLE IF NOT EXISTS garden_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_plant_id INTEGER NOT NULL REFERENCES user_plants(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    note TEXT NOT NULL,
    status TEXT NOT NULL,
    image_url TEXT
);
CREATE INDEX IF NOT EXISTS idx_garden_logs_plant ON garden_logs(user_plant_id);
"#;

/// Shared SQLite pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `url` (e.g. `sqlite://data/verdant.db`), creating the file
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!(url = %url, "Database connected");
        Ok(Self { pool })
    }

    /// Private in-memory database (tests, `diagnose` without a store)
    pub async fn in_memory() -> Result<Self> {
        // every connection to :memory: is a separate database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Create tables if they don't exist
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Underlying pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.init().await.unwrap();
        db.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdant.db");
        let db = Database::connect(&format!("sqlite://{}", path.display()))
            .await
            .unwrap();
        db.init().await.unwrap();
        assert!(path.exists());
    }
}
