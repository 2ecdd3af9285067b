#![allow(async_fn_in_trait)]

use uuid::Uuid;

use embyhub_domain::id::{EmbyId, TelegramId};

use crate::domain::types::{
    EmbyAccountInfo, Grant, InviteCode, MediaCounts, RegistrationConfig, RegistrationConfigPatch,
    Route, User,
};
use crate::error::BotServiceError;

/// Repository for bot users.
pub trait UserRepository: Send + Sync {
    /// Look up by identity, inserting a default record when absent.
    ///
    /// `is_admin` only seeds a new row. Concurrent callers converge on one row.
    async fn get_or_create(
        &self,
        telegram_id: TelegramId,
        is_admin: bool,
    ) -> Result<User, BotServiceError>;

    async fn find(&self, telegram_id: TelegramId) -> Result<Option<User>, BotServiceError>;

    /// Record a ban. Returns `false` if the user was already banned or has no account.
    async fn set_ban(
        &self,
        telegram_id: TelegramId,
        ban_time: i64,
        reason: &str,
    ) -> Result<bool, BotServiceError>;

    /// Lift a ban (`ban_time = 0`, `reason = NULL`). Returns `false` if not banned.
    async fn clear_ban(&self, telegram_id: TelegramId) -> Result<bool, BotServiceError>;
}

/// Repository for invite codes.
pub trait InviteCodeRepository: Send + Sync {
    /// Insert a code. Returns `false` if the code string already exists.
    async fn create(&self, code: &InviteCode) -> Result<bool, BotServiceError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<InviteCode>, BotServiceError>;

    /// Codes issued by `issuer`, newest first.
    async fn list_by_issuer(&self, issuer: TelegramId)
    -> Result<Vec<InviteCode>, BotServiceError>;
}

/// Repository for the registration config singleton.
pub trait RegistrationConfigRepository: Send + Sync {
    /// Read the singleton, creating it zeroed on first access.
    ///
    /// `None` means the row is still absent after the create attempt.
    async fn first_or_create(&self) -> Result<Option<RegistrationConfig>, BotServiceError>;

    /// Reset an expired deadline to 0. Idempotent; returns `true` only for the
    /// call that actually cleared it.
    async fn clear_expired_deadline(&self, now: i64) -> Result<bool, BotServiceError>;

    /// Apply an admin patch and return the stored result.
    async fn update(
        &self,
        patch: &RegistrationConfigPatch,
    ) -> Result<Option<RegistrationConfig>, BotServiceError>;
}

/// Hands out store transactions.
pub trait UnitOfWork: Send + Sync {
    type Tx: StoreTransaction;

    async fn begin(&self) -> Result<Self::Tx, BotServiceError>;
}

/// One open store transaction. Dropping it without `commit` rolls it back.
///
/// Every mutation is a conditional update so that concurrent transactions
/// cannot both pass the same precondition.
pub trait StoreTransaction: Send {
    /// Count one more registration and, if `consume_quota`, spend one unit of
    /// public quota when some is left. Returns whether quota was spent.
    async fn record_registration(&mut self, consume_quota: bool) -> Result<bool, BotServiceError>;

    /// Link the media-server account and clear `enable_register`.
    ///
    /// Fails with `AlreadyBound` if the user already has an account.
    async fn bind_account(
        &mut self,
        telegram_id: TelegramId,
        emby_id: &EmbyId,
        emby_name: &str,
    ) -> Result<(), BotServiceError>;

    /// Mark a code used. Returns `false` if it was already used.
    async fn mark_code_used(
        &mut self,
        code_id: Uuid,
        used_by: TelegramId,
        used_time: i64,
    ) -> Result<bool, BotServiceError>;

    /// Flip the flag a code grants. Returns `false` if the user no longer
    /// qualifies (flag already set, or account state changed).
    async fn grant(&mut self, telegram_id: TelegramId, grant: Grant)
    -> Result<bool, BotServiceError>;

    async fn clear_ban(&mut self, telegram_id: TelegramId) -> Result<bool, BotServiceError>;

    async fn commit(self) -> Result<(), BotServiceError>;

    async fn rollback(self) -> Result<(), BotServiceError>;
}

/// Port for the media server.
pub trait MediaServerPort: Send + Sync {
    /// Create an account and return its id.
    async fn create_account(&self, name: &str) -> Result<EmbyId, BotServiceError>;

    async fn set_password(&self, id: &EmbyId, password: &str) -> Result<(), BotServiceError>;

    async fn reset_password(&self, id: &EmbyId) -> Result<(), BotServiceError>;

    /// Apply the default access policy (also used to unban).
    async fn set_default_policy(&self, id: &EmbyId) -> Result<(), BotServiceError>;

    async fn ban_account(&self, id: &EmbyId) -> Result<(), BotServiceError>;

    async fn get_account(&self, id: &EmbyId) -> Result<EmbyAccountInfo, BotServiceError>;

    async fn count_assets(&self) -> Result<MediaCounts, BotServiceError>;
}

/// Port for the line-routing service.
pub trait RouterPort: Send + Sync {
    async fn list_routes(&self) -> Result<Vec<Route>, BotServiceError>;

    /// Index of the route currently selected for an account.
    async fn user_route(&self, id: &EmbyId) -> Result<String, BotServiceError>;

    /// Returns `false` if the router refused the change.
    async fn update_user_route(&self, id: &EmbyId, index: &str) -> Result<bool, BotServiceError>;
}
