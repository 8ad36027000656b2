//! `verdant seed`

use crate::server::{init_database, load_config};
use anyhow::{Context, Result};
use verdant_store::seed_reference_data;

pub async fn run() -> Result<()> {
    let mut config = load_config().context("Failed to load configuration")?;
    // seed below so the outcome can be reported
    config.database.seed = false;
    let database = init_database(&config).await?;

    let written = seed_reference_data(database.pool())
        .await
        .context("Failed to seed reference data")?;
    if written {
        println!("Reference data written to {}", config.database.url);
    } else {
        println!("Reference data already present in {}", config.database.url);
    }
    Ok(())
}
