use anyhow::anyhow;
use chrono::Utc;
use rand::RngExt;
use tracing::info;

use embyhub_domain::id::TelegramId;
use embyhub_domain::invite::{InviteCodeType, parse_code_format};

use crate::domain::capability::{check_admin, check_create_invite_code, check_redeem};
use crate::domain::repository::{
    InviteCodeRepository, MediaServerPort, StoreTransaction, UnitOfWork, UserRepository,
};
use crate::domain::types::{AdminList, InviteCode};
use crate::error::BotServiceError;
use crate::usecase::{load_user, settle};

/// Upper bound on codes generated per request.
pub const MAX_CODES_PER_REQUEST: i64 = 20;

/// Random token length after the type prefix.
const TOKEN_LEN: usize = 22;

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fresh tokens tried per code before giving up on unique-index collisions.
const MAX_GENERATE_ATTEMPTS: usize = 3;

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

// ── CreateInviteCodes ────────────────────────────────────────────────────────

pub struct CreateInviteCodesInput {
    pub issuer: TelegramId,
    pub code_type: InviteCodeType,
    pub count: i64,
}

pub struct CreateInviteCodesUseCase<U: UserRepository, I: InviteCodeRepository> {
    pub users: U,
    pub codes: I,
    pub admins: AdminList,
}

impl<U: UserRepository, I: InviteCodeRepository> CreateInviteCodesUseCase<U, I> {
    /// Codes are stored one by one; a failure part-way keeps the ones already stored.
    pub async fn execute(
        &self,
        input: CreateInviteCodesInput,
    ) -> Result<Vec<InviteCode>, BotServiceError> {
        if !(1..=MAX_CODES_PER_REQUEST).contains(&input.count) {
            return Err(BotServiceError::InvalidInput("count must be between 1 and 20"));
        }
        let issuer = load_user(&self.users, &self.admins, input.issuer).await?;
        check_create_invite_code(&issuer, input.code_type)?;

        let mut created = Vec::with_capacity(input.count as usize);
        for _ in 0..input.count {
            created.push(self.create_one(input.issuer, input.code_type).await?);
        }
        info!(
            issuer = %input.issuer,
            code_type = %input.code_type,
            count = created.len(),
            "invite codes created"
        );
        Ok(created)
    }

    async fn create_one(
        &self,
        issuer: TelegramId,
        code_type: InviteCodeType,
    ) -> Result<InviteCode, BotServiceError> {
        for _ in 0..MAX_GENERATE_ATTEMPTS {
            let code = InviteCode::new(code_type.format_code(&generate_token()), issuer, code_type);
            if self.codes.create(&code).await? {
                return Ok(code);
            }
        }
        Err(anyhow!("no unique invite code after {MAX_GENERATE_ATTEMPTS} attempts").into())
    }
}

// ── RedeemInviteCode ─────────────────────────────────────────────────────────

pub struct RedeemInviteCodeUseCase<U, I, W, M>
where
    U: UserRepository,
    I: InviteCodeRepository,
    W: UnitOfWork,
    M: MediaServerPort,
{
    pub users: U,
    pub codes: I,
    pub uow: W,
    pub media: M,
    pub admins: AdminList,
}

impl<U, I, W, M> RedeemInviteCodeUseCase<U, I, W, M>
where
    U: UserRepository,
    I: InviteCodeRepository,
    W: UnitOfWork,
    M: MediaServerPort,
{
    /// Redeem `code` for `telegram_id`. Of several concurrent redeemers of the
    /// same code exactly one succeeds; the rest get `InvalidOrUsed`.
    pub async fn execute(
        &self,
        telegram_id: TelegramId,
        code: &str,
    ) -> Result<InviteCode, BotServiceError> {
        // 1. Format check before touching the store
        if parse_code_format(code).is_none() {
            return Err(BotServiceError::InvalidFormat);
        }

        // 2. Snapshot checks
        let user = load_user(&self.users, &self.admins, telegram_id).await?;
        let invite = self
            .codes
            .find_by_code(code)
            .await?
            .filter(|c| !c.is_used)
            .ok_or(BotServiceError::InvalidOrUsed)?;
        check_redeem(&user, invite.code_type)?;

        // 3. Mark used + grant (+ unban) commit together
        let now = Utc::now().timestamp();
        let mut tx = self.uow.begin().await?;
        let result: Result<(), BotServiceError> = async {
            if !tx.mark_code_used(invite.id, telegram_id, now).await? {
                return Err(BotServiceError::InvalidOrUsed);
            }
            if !tx.grant(telegram_id, invite.code_type.into()).await? {
                return Err(BotServiceError::PermissionDenied(
                    "user no longer qualifies for this code",
                ));
            }
            if invite.code_type == InviteCodeType::Whitelist && user.is_banned() {
                let emby_id = user.emby_id.as_ref().ok_or(BotServiceError::NotBound)?;
                // Unbanned meanwhile; the remote policy is already restored.
                if tx.clear_ban(telegram_id).await? {
                    self.media.set_default_policy(emby_id).await?;
                    info!(%telegram_id, %emby_id, "account unbanned by whitelist code");
                }
            }
            Ok(())
        }
        .await;
        settle(tx, result).await?;

        info!(%telegram_id, code_type = %invite.code_type, "invite code redeemed");
        Ok(InviteCode {
            is_used: true,
            used_time: Some(now),
            used_by: Some(telegram_id),
            ..invite
        })
    }
}

// ── ListInviteCodes ──────────────────────────────────────────────────────────

pub struct ListInviteCodesUseCase<U: UserRepository, I: InviteCodeRepository> {
    pub users: U,
    pub codes: I,
    pub admins: AdminList,
}

impl<U: UserRepository, I: InviteCodeRepository> ListInviteCodesUseCase<U, I> {
    pub async fn execute(&self, issuer: TelegramId) -> Result<Vec<InviteCode>, BotServiceError> {
        let user = load_user(&self.users, &self.admins, issuer).await?;
        check_admin(&user)?;
        self.codes.list_by_issuer(issuer).await
    }
}
