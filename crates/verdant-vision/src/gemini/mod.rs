//! Gemini - Google Gemini vision provider
//!
//! This module implements the primary remote tier using reqwest. The same
//! client doubles as the text generator behind translation and `/ask-google`.

mod config;
mod provider;
mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use config::{GeminiConfig, DEFAULT_MODEL, DEFAULT_TIMEOUT, LITE_MODEL};
pub use provider::GeminiProvider;
