use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use embyhub_bot::config::BotConfig;
use embyhub_bot::domain::types::AdminList;
use embyhub_bot::infra::emby::EmbyClient;
use embyhub_bot::infra::router_api::RouterClient;
use embyhub_bot::router::build_router;
use embyhub_bot::state::AppState;
use embyhub_bot_migration::Migrator;
use embyhub_core::config::Config;
use embyhub_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    let config = BotConfig::from_env().expect("failed to load configuration");
    init_tracing(&config.tracing_directive(), config.log_json);

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    if config.run_migrations {
        Migrator::up(&db, None)
            .await
            .expect("failed to apply migrations");
    }

    let emby = EmbyClient::new(&config.emby_url, &config.emby_api_key, config.http_timeout())
        .expect("failed to build media server client");
    let router_client = RouterClient::new(&config.api_url, &config.api_key, config.http_timeout())
        .expect("failed to build router client");

    match emby.check_site().await {
        Ok(()) => info!(url = %config.emby_url, "media server reachable"),
        Err(e) => warn!(url = %config.emby_url, error = %e, "media server unreachable at startup"),
    }

    let admins = config.admins();
    info!(count = admins.len(), "admin list loaded");

    let state = AppState {
        db,
        emby,
        router: router_client,
        admins: AdminList::new(admins),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.bot_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("bot service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
