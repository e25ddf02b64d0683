use sea_orm::{Database, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use satoyama_db::config::{Config, Deployment};
use satoyama_db::entity::{nodes, readings, sensor_types, sensors};
use satoyama_db::error::AppResult;
use satoyama_db::services::Gateway;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration (fail-fast)
    let config = Config::from_env()?;

    // Initialize tracing; production logs are JSON lines
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,satoyama_db=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.deployment == Deployment::Prod {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        deployment = ?config.deployment,
        formats = ?config.datetime_formats,
        "Starting satoyama-db..."
    );

    // Connect to database (fail-fast)
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations completed");

    let gateway = Gateway::from_config(db, &config);
    let db = gateway.db();

    let node_count = nodes::Entity::find().count(db).await?;
    let sensor_type_count = sensor_types::Entity::find().count(db).await?;
    let sensor_count = sensors::Entity::find().count(db).await?;
    let reading_count = readings::Entity::find().count(db).await?;
    tracing::info!(
        nodes = node_count,
        sensor_types = sensor_type_count,
        sensors = sensor_count,
        readings = reading_count,
        "Inventory ready"
    );

    Ok(())
}
