//! Server module for Verdant
//!
//! - `config`: configuration structures
//! - `loader`: configuration loading from files and environment
//! - `providers`: remote tier resolution from API keys
//! - `init`: service construction and the HTTP run loop

pub mod config;
mod init;
mod loader;
mod providers;

pub use init::{build_diagnosis_stack, init_database, run, DiagnosisStack};
pub use loader::load_config;
