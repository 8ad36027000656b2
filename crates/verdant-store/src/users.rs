//! User accounts
//!
//! Passwords are stored as `salt$sha256(salt || password)` in hex.

use crate::error::{is_unique_violation, Error, Result};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqlitePool, Row};
use tracing::info;

const SALT_LEN: usize = 16;

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Row id
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Unique email
    pub email: String,
}

/// Registration and login
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Create a store over an initialized pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let taken = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO users (username, email, hashed_password) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(hash_password(password))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                info!(user_id = id, "User registered");
                Ok(User {
                    id,
                    username: username.to_string(),
                    email: email.to_string(),
                })
            }
            // a concurrent insert won the race, or the username is taken
            Err(e) if is_unique_violation(&e) => {
                Err(Error::Conflict("Username or email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, username, email, hashed_password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::InvalidCredentials)?;

        let stored: String = row.get("hashed_password");
        if !verify_password(password, &stored) {
            return Err(Error::InvalidCredentials);
        }

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
        })
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Hash a password with a fresh random salt
pub(crate) fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt: String = salt.iter().map(|b| format!("{b:02x}")).collect();
    let hash = digest(&salt, password);
    format!("{salt}${hash}")
}

/// Compare a password with a stored `salt$hash`
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = digest(salt, password);
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
