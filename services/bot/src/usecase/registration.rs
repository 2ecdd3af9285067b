use chrono::Utc;
use tracing::info;

use embyhub_domain::id::TelegramId;

use crate::domain::capability::check_admin;
use crate::domain::repository::{RegistrationConfigRepository, UserRepository};
use crate::domain::types::{AdminList, RegistrationConfig, RegistrationConfigPatch};
use crate::error::BotServiceError;
use crate::usecase::load_user;

// ── GetRegistrationConfig ────────────────────────────────────────────────────

pub struct GetRegistrationConfigUseCase<U: UserRepository, C: RegistrationConfigRepository> {
    pub users: U,
    pub config: C,
    pub admins: AdminList,
}

impl<U: UserRepository, C: RegistrationConfigRepository> GetRegistrationConfigUseCase<U, C> {
    pub async fn execute(&self, caller: TelegramId) -> Result<RegistrationConfig, BotServiceError> {
        let user = load_user(&self.users, &self.admins, caller).await?;
        check_admin(&user)?;
        self.config
            .first_or_create()
            .await?
            .ok_or(BotServiceError::ConfigMissing)
    }
}

// ── SetRegistrationConfig ────────────────────────────────────────────────────

pub struct SetRegistrationConfigUseCase<U: UserRepository, C: RegistrationConfigRepository> {
    pub users: U,
    pub config: C,
    pub admins: AdminList,
}

impl<U: UserRepository, C: RegistrationConfigRepository> SetRegistrationConfigUseCase<U, C> {
    /// A deadline of `0` closes the window; any other deadline must lie in the future.
    pub async fn execute(
        &self,
        caller: TelegramId,
        patch: RegistrationConfigPatch,
    ) -> Result<RegistrationConfig, BotServiceError> {
        let user = load_user(&self.users, &self.admins, caller).await?;
        check_admin(&user)?;

        if matches!(patch.register_public_user, Some(n) if n < 0) {
            return Err(BotServiceError::InvalidInput(
                "public registration count must not be negative",
            ));
        }
        let now = Utc::now().timestamp();
        if matches!(patch.register_public_time, Some(t) if t != 0 && t <= now) {
            return Err(BotServiceError::InvalidInput(
                "public registration deadline must be in the future",
            ));
        }

        let current = self
            .config
            .first_or_create()
            .await?
            .ok_or(BotServiceError::ConfigMissing)?;
        if patch.is_empty() {
            return Ok(current);
        }
        let updated = self
            .config
            .update(&patch)
            .await?
            .ok_or(BotServiceError::ConfigMissing)?;
        info!(
            %caller,
            register_public_user = updated.register_public_user,
            register_public_time = updated.register_public_time,
            "registration config updated"
        );
        Ok(updated)
    }
}
