//! Curated reference data
//!
//! Plants, diseases and treatments. The diagnosis pipeline only reads this
//! data (through [`ReferenceLookup`]); `verdant seed` writes the initial set.

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use tracing::{debug, info};
use verdant_core::{ReferenceDisease, ReferenceLookup, Treatment, TreatmentKind};

/// SQLite-backed disease lookup
#[derive(Clone)]
pub struct ReferenceStore {
    pool: SqlitePool,
}

impl ReferenceStore {
    /// Create a store over an initialized pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// First disease whose name contains `name`, case-insensitively
    pub async fn find_disease(&self, name: &str) -> Result<Option<ReferenceDisease>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.name, d.severity, d.symptoms, d.prevention, p.name AS plant_name
            FROM diseases d
            LEFT JOIN plants p ON p.id = d.plant_id
            WHERE d.name LIKE '%' || ? || '%' ESCAPE '\'
            ORDER BY d.id
            LIMIT 1
            "#,
        )
        .bind(escape_like(name.trim()))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(disease = %name, "No reference data");
            return Ok(None);
        };

        let disease_id: i64 = row.get("id");
        let treatments = sqlx::query(
            r#"
            SELECT type, description, cost_approx
            FROM treatments
            WHERE disease_id = ?
            ORDER BY id
            "#,
        )
        .bind(disease_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|t| {
            let kind: String = t.get("type");
            Treatment {
                kind: TreatmentKind::parse_lossy(&kind),
                description: t.get("description"),
                cost_approx: t.get("cost_approx"),
            }
        })
        .collect();

        Ok(Some(ReferenceDisease {
            name: row.get("name"),
            plant: row.get("plant_name"),
            severity: row.get("severity"),
            symptoms: row.get("symptoms"),
            prevention: row.get("prevention"),
            treatments,
        }))
    }
}

#[async_trait]
impl ReferenceLookup for ReferenceStore {
    async fn lookup(&self, disease_name: &str) -> verdant_core::Result<Option<ReferenceDisease>> {
        Ok(self.find_disease(disease_name).await?)
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

struct SeedTreatment {
    kind: &'static str,
    name: &'static str,
    description: &'static str,
    cost: &'static str,
}

struct SeedDisease {
    plant: &'static str,
    name: &'static str,
    severity: &'static str,
    symptoms: &'static str,
    prevention: &'static str,
    treatments: &'static [SeedTreatment],
}

const SEED_PLANTS: &[&str] = &["Tomato", "Potato", "Corn"];

const SEED_DISEASES: &[SeedDisease] = &[
    SeedDisease {
        plant: "Tomato",
        name: "Early Blight",
        severity: "Moderate",
        symptoms: "Dark spots on leaves, yellowing.",
        prevention: "Crop rotation, proper spacing.",
        treatments: &[
            SeedTreatment {
                kind: "Organic",
                name: "Neem Oil",
                description: "Spray Neem oil every 7 days.",
                cost: "$5 - $10",
            },
            SeedTreatment {
                kind: "Chemical",
                name: "Copper Fungicide",
                description: "Apply copper-based fungicide.",
                cost: "$15 - $20",
            },
        ],
    },
    SeedDisease {
        plant: "Tomato",
        name: "Late Blight",
        severity: "High",
        symptoms: "Large dark patches on leaves, white fungal growth.",
        prevention: "Avoid overhead watering, use resistant varieties.",
        treatments: &[SeedTreatment {
            kind: "Chemical",
            name: "Chlorothalonil",
            description: "Apply fungicides containing chlorothalonil.",
            cost: "$20 - $30",
        }],
    },
];

/// Insert the initial reference data.
///
/// Does nothing when plants already exist. Returns whether data was written.
pub async fn seed_reference_data(pool: &SqlitePool) -> Result<bool> {
    let existing: i64 = sqlx::query("SELECT COUNT(*) AS n FROM plants")
        .fetch_one(pool)
        .await?
        .get("n");
    if existing > 0 {
        info!(plants = existing, "Reference data already seeded");
        return Ok(false);
    }

    let mut tx = pool.begin().await?;

    for plant in SEED_PLANTS {
        sqlx::query("INSERT INTO plants (name) VALUES (?)")
            .bind(*plant)
            .execute(&mut *tx)
            .await?;
    }

    for disease in SEED_DISEASES {
        let disease_id = sqlx::query(
            r#"
            INSERT INTO diseases (name, plant_id, severity, symptoms, prevention)
            VALUES (?, (SELECT id FROM plants WHERE name = ?), ?, ?, ?)
            "#,
        )
        .bind(disease.name)
        .bind(disease.plant)
        .bind(disease.severity)
        .bind(disease.symptoms)
        .bind(disease.prevention)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for treatment in disease.treatments {
            sqlx::query(
                r#"
                INSERT INTO treatments (disease_id, type, name, description, cost_approx)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(disease_id)
            .bind(treatment.kind)
            .bind(treatment.name)
            .bind(treatment.description)
            .bind(treatment.cost)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(
        plants = SEED_PLANTS.len(),
        diseases = SEED_DISEASES.len(),
        "Reference data seeded"
    );
    Ok(true)
}
