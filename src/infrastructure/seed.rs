use crate::entities::{prelude::*, schemes};
use crate::models::SchemeSeed;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;

const SCHEME_CATALOGUE: &str = include_str!("../../data/schemes.json");

/// Loads the bundled scheme catalogue into an empty `schemes` table
pub async fn seed_schemes(db: &DatabaseConnection) -> anyhow::Result<()> {
    let existing = Schemes::find().count(db).await?;
    if existing > 0 {
        info!("🌱 Scheme catalogue already present ({} schemes)", existing);
        return Ok(());
    }

    info!("🌱 Seeding scheme catalogue...");

    let seeds: Vec<SchemeSeed> = serde_json::from_str(SCHEME_CATALOGUE)?;
    let total = seeds.len();

    for seed in seeds {
        schemes::ActiveModel {
            title: Set(seed.title),
            category: Set(seed.category),
            eligibility: Set(seed.eligibility),
            required_documents: Set(serde_json::to_value(seed.required_documents)?),
            description: Set(seed.description),
            benefits: Set(seed.benefits),
            application_link: Set(seed.application_link),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("✅ Seeded {} schemes", total);
    Ok(())
}
