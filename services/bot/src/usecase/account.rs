use anyhow::anyhow;
use chrono::Utc;
use rand::RngExt;
use tracing::{info, warn};

use embyhub_domain::id::TelegramId;

use crate::domain::capability::{check_admin, check_ban, check_operator, check_unban};
use crate::domain::policy;
use crate::domain::repository::{
    MediaServerPort, RegistrationConfigRepository, StoreTransaction, UnitOfWork, UserRepository,
};
use crate::domain::types::{AdminList, EmbyAccountInfo, User, validate_account_name};
use crate::error::BotServiceError;
use crate::usecase::{abort, load_user};

/// Charset for default passwords (ASCII letters and digits).
const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default password length in characters.
pub const DEFAULT_PASSWORD_LEN: usize = 6;

/// Ban reason recorded when a member leaves the group.
pub const MEMBER_LEFT_REASON: &str = "left the group";

pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..DEFAULT_PASSWORD_LEN)
        .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

fn password_or_default(password: Option<String>) -> String {
    password
        .filter(|p| !p.is_empty())
        .unwrap_or_else(generate_password)
}

async fn reload<U: UserRepository>(users: &U, id: TelegramId) -> Result<User, BotServiceError> {
    users
        .find(id)
        .await?
        .ok_or_else(|| anyhow!("user {id} disappeared after update").into())
}

// ── CreateAccount ────────────────────────────────────────────────────────────

pub struct CreateAccountInput {
    pub telegram_id: TelegramId,
    pub name: String,
    /// Generated when absent or empty.
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct CreatedAccount {
    pub user: User,
    /// Returned to the caller once; never stored.
    pub password: String,
}

pub struct CreateAccountUseCase<U, C, W, M>
where
    U: UserRepository,
    C: RegistrationConfigRepository,
    W: UnitOfWork,
    M: MediaServerPort,
{
    pub users: U,
    pub config: C,
    pub uow: W,
    pub media: M,
    pub admins: AdminList,
}

impl<U, C, W, M> CreateAccountUseCase<U, C, W, M>
where
    U: UserRepository,
    C: RegistrationConfigRepository,
    W: UnitOfWork,
    M: MediaServerPort,
{
    pub async fn execute(
        &self,
        input: CreateAccountInput,
    ) -> Result<CreatedAccount, BotServiceError> {
        validate_account_name(&input.name)?;
        let telegram_id = input.telegram_id;

        // 1. One account per user, ever
        let user = load_user(&self.users, &self.admins, telegram_id).await?;
        if user.has_account() {
            return Err(BotServiceError::AlreadyBound);
        }

        // 2. Fresh policy evaluation; the deadline cleanup runs whatever the outcome
        let config = self
            .config
            .first_or_create()
            .await?
            .ok_or(BotServiceError::ConfigMissing)?;
        let now = Utc::now().timestamp();
        let decision = policy::evaluate(&user, &config, now);
        if decision.clear_deadline && self.config.clear_expired_deadline(now).await? {
            info!(deadline = config.register_public_time, "cleared expired registration deadline");
        }
        if !decision.allowed() {
            return Err(BotServiceError::RegistrationClosed);
        }

        // 3. Quota bookkeeping, remote creation and binding commit together
        let mut tx = self.uow.begin().await?;
        let result: Result<_, BotServiceError> = async {
            let spent = tx.record_registration(decision.consume_quota).await?;
            if decision.consume_quota && !spent && !decision.window_open {
                // Another creation took the last unit first.
                return Err(BotServiceError::RegistrationClosed);
            }
            let emby_id = self.media.create_account(&input.name).await?;
            if let Err(e) = tx.bind_account(telegram_id, &emby_id, &input.name).await {
                warn!(%telegram_id, %emby_id, "remote account created but binding failed");
                return Err(e);
            }
            Ok((emby_id, spent))
        }
        .await;
        let (emby_id, spent) = match result {
            Ok(created) => created,
            Err(e) => return Err(abort(tx, e).await),
        };
        if let Err(e) = tx.commit().await {
            warn!(%telegram_id, %emby_id, "remote account created but commit failed");
            return Err(e);
        }
        info!(%telegram_id, %emby_id, quota_spent = spent, "media server account created");

        // 4. Best effort: the binding is already committed
        let password = password_or_default(input.password);
        if let Err(e) = self.media.set_password(&emby_id, &password).await {
            warn!(%telegram_id, %emby_id, "failed to set initial password");
            return Err(e);
        }
        if let Err(e) = self.media.set_default_policy(&emby_id).await {
            warn!(%telegram_id, %emby_id, "failed to apply default policy");
            return Err(e);
        }

        let user = reload(&self.users, telegram_id).await?;
        Ok(CreatedAccount { user, password })
    }
}

// ── GetInfo ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AccountInfo {
    pub user: User,
    pub emby: EmbyAccountInfo,
}

pub struct GetInfoUseCase<U: UserRepository, M: MediaServerPort> {
    pub users: U,
    pub media: M,
    pub admins: AdminList,
}

impl<U: UserRepository, M: MediaServerPort> GetInfoUseCase<U, M> {
    /// Users may look themselves up; admins may look up anyone.
    pub async fn execute(
        &self,
        caller: TelegramId,
        target: TelegramId,
    ) -> Result<AccountInfo, BotServiceError> {
        if caller != target {
            let caller = load_user(&self.users, &self.admins, caller).await?;
            check_admin(&caller)?;
        }
        let user = load_user(&self.users, &self.admins, target).await?;
        let emby_id = user.emby_id.as_ref().ok_or(BotServiceError::NotBound)?;
        let emby = self.media.get_account(emby_id).await?;
        Ok(AccountInfo { user, emby })
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordUseCase<U: UserRepository, M: MediaServerPort> {
    pub users: U,
    pub media: M,
    pub admins: AdminList,
}

impl<U: UserRepository, M: MediaServerPort> ResetPasswordUseCase<U, M> {
    /// Returns the new password. Nothing is persisted locally.
    pub async fn execute(
        &self,
        telegram_id: TelegramId,
        password: Option<String>,
    ) -> Result<String, BotServiceError> {
        let user = load_user(&self.users, &self.admins, telegram_id).await?;
        let emby_id = user.active_emby_id()?;
        let password = password_or_default(password);
        self.media.reset_password(emby_id).await?;
        self.media.set_password(emby_id, &password).await?;
        info!(%telegram_id, "password reset");
        Ok(password)
    }
}

// ── Ban / Unban ──────────────────────────────────────────────────────────────

/// Remote ban first, then persist. A remote failure leaves local state as is.
async fn ban_user<U: UserRepository, M: MediaServerPort>(
    users: &U,
    media: &M,
    user: &User,
    reason: &str,
) -> Result<User, BotServiceError> {
    check_ban(user)?;
    let emby_id = user.emby_id.as_ref().ok_or(BotServiceError::NotBound)?;
    media.ban_account(emby_id).await?;
    let now = Utc::now().timestamp();
    if !users.set_ban(user.telegram_id, now, reason).await? {
        return Err(BotServiceError::AlreadyBanned);
    }
    info!(telegram_id = %user.telegram_id, %emby_id, reason, "account banned");
    reload(users, user.telegram_id).await
}

pub struct BanInput {
    pub target: TelegramId,
    pub reason: String,
    /// `None` for system-initiated bans.
    pub operator: Option<TelegramId>,
}

pub struct BanUseCase<U: UserRepository, M: MediaServerPort> {
    pub users: U,
    pub media: M,
    pub admins: AdminList,
}

impl<U: UserRepository, M: MediaServerPort> BanUseCase<U, M> {
    pub async fn execute(&self, input: BanInput) -> Result<User, BotServiceError> {
        let operator = match input.operator {
            Some(id) => Some(load_user(&self.users, &self.admins, id).await?),
            None => None,
        };
        check_operator(operator.as_ref())?;
        let user = load_user(&self.users, &self.admins, input.target).await?;
        ban_user(&self.users, &self.media, &user, &input.reason).await
    }
}

pub struct UnbanUseCase<U: UserRepository, M: MediaServerPort> {
    pub users: U,
    pub media: M,
    pub admins: AdminList,
}

impl<U: UserRepository, M: MediaServerPort> UnbanUseCase<U, M> {
    pub async fn execute(
        &self,
        target: TelegramId,
        operator: Option<TelegramId>,
    ) -> Result<User, BotServiceError> {
        let operator = match operator {
            Some(id) => Some(load_user(&self.users, &self.admins, id).await?),
            None => None,
        };
        check_operator(operator.as_ref())?;
        let user = load_user(&self.users, &self.admins, target).await?;
        check_unban(&user)?;
        let emby_id = user.emby_id.as_ref().ok_or(BotServiceError::NotBound)?;
        self.media.set_default_policy(emby_id).await?;
        if !self.users.clear_ban(target).await? {
            return Err(BotServiceError::NotBanned);
        }
        info!(%target, %emby_id, "account unbanned");
        reload(&self.users, target).await
    }
}

// ── MemberLeft ───────────────────────────────────────────────────────────────

pub struct MemberLeftUseCase<U: UserRepository, M: MediaServerPort> {
    pub users: U,
    pub media: M,
}

impl<U: UserRepository, M: MediaServerPort> MemberLeftUseCase<U, M> {
    /// Ban an active, non-whitelisted account whose owner left the group.
    /// Returns whether a ban happened.
    pub async fn execute(&self, target: TelegramId) -> Result<bool, BotServiceError> {
        let Some(user) = self.users.find(target).await? else {
            return Ok(false);
        };
        if !user.has_account() || user.is_banned() || user.is_whitelist {
            return Ok(false);
        }
        ban_user(&self.users, &self.media, &user, MEMBER_LEFT_REASON).await?;
        Ok(true)
    }
}
