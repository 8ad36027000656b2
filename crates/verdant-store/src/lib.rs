//! Verdant Store - SQLite persistence
//!
//! - `database`: pool setup and schema
//! - `reference`: curated plants, diseases and treatments, plus seed data
//! - `users`: registration and login
//! - `garden`: a user's plants and their care logs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod garden;
pub mod reference;
pub mod users;

pub use database::Database;
pub use error::{Error, Result};
pub use garden::{GardenLog, GardenPlant, GardenStore, NewGardenLog, NewGardenPlant};
pub use reference::{seed_reference_data, ReferenceStore};
pub use users::{User, UserStore};
