use std::time::Duration;

use serde::Deserialize;

use embyhub_core::config::Config;
use embyhub_domain::id::TelegramId;

/// Bot service configuration loaded from environment variables (and `.env`).
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// sea-orm connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the command surface (default 3120). Env var: `BOT_PORT`.
    #[serde(default = "default_port")]
    pub bot_port: u16,
    /// Comma-separated Telegram ids with admin rights. Env var: `ADMIN_LIST`.
    pub admin_list: Vec<i64>,
    /// Media server base URL (e.g. "https://emby.example.com"). Env var: `EMBY_URL`.
    pub emby_url: String,
    /// Media server API key. Env var: `EMBY_API_KEY`.
    pub emby_api_key: String,
    /// Router service base URL. Env var: `API_URL`.
    pub api_url: String,
    /// Bearer token for the router service; empty disables auth. Env var: `API_KEY`.
    #[serde(default)]
    pub api_key: String,
    /// Timeout applied to every outbound HTTP request (default 10). Env var: `HTTP_TIMEOUT_SECS`.
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
    /// Fallback tracing directive when `RUST_LOG` is unset. Env var: `LOG_LEVEL`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines. Env var: `LOG_JSON`.
    #[serde(default)]
    pub log_json: bool,
    /// Apply pending migrations before serving. Env var: `RUN_MIGRATIONS`.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Config for BotConfig {}

impl BotConfig {
    pub fn admins(&self) -> Vec<TelegramId> {
        self.admin_list.iter().copied().map(TelegramId).collect()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// `LOG_LEVEL` accepts python-style names (`INFO`, `WARNING`); normalise for `EnvFilter`.
    pub fn tracing_directive(&self) -> String {
        match self.log_level.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_owned(),
            "critical" | "fatal" => "error".to_owned(),
            other => other.to_owned(),
        }
    }
}

fn default_port() -> u16 {
    3120
}

fn default_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_true() -> bool {
    true
}
