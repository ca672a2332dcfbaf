use crate::entities::{schemes, user_documents};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;
    crate::infrastructure::seed::seed_schemes(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Running SeaORM auto-migrations...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parent tables first so foreign keys resolve
    let stmts = vec![
        schema
            .create_table_from_entity(schemes::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(user_documents::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_user_documents_user ON user_documents (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_user_documents_scheme ON user_documents (user_id, scheme_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_documents_slot ON user_documents (user_id, scheme_id, document_type)",
        "CREATE INDEX IF NOT EXISTS idx_schemes_category ON schemes (category)",
    ];

    for sql in indexes {
        db.execute_unprepared(sql).await?;
    }

    info!("✅ Migrations complete");
    Ok(())
}
