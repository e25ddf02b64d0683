//! Schema CLI for the inventory tables, e.g. `cargo run -p migration -- up`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // DATABASE_URL may come from .env
    dotenvy::dotenv().ok();
    cli::run_cli(migration::Migrator).await;
}
