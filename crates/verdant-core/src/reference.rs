//! Curated reference data contract
//!
//! The pipeline only needs one question answered: "what do we know about the
//! disease called X?". The SQLite store in `verdant-store` answers it in
//! production; [`NoReferenceData`] answers "nothing" when no store is wired.

use crate::diagnosis::Treatment;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Curated facts about one disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDisease {
    /// Disease name as curated (e.g. "Early Blight")
    pub name: String,
    /// Plant the record belongs to
    pub plant: Option<String>,
    /// Severity label
    pub severity: String,
    /// Visible symptoms
    pub symptoms: String,
    /// Prevention advice
    pub prevention: String,
    /// Treatments in curated order
    pub treatments: Vec<Treatment>,
}

/// Disease lookup by name
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Find the first record whose name contains `disease_name`
    /// (case-insensitive).
    async fn lookup(&self, disease_name: &str) -> Result<Option<ReferenceDisease>>;
}

/// Lookup that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceData;

#[async_trait]
impl ReferenceLookup for NoReferenceData {
    async fn lookup(&self, _disease_name: &str) -> Result<Option<ReferenceDisease>> {
        Ok(None)
    }
}
