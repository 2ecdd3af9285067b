use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(embyhub_bot_migration::Migrator).await;
}
