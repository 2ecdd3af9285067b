use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use embyhub_domain::id::{EmbyId, TelegramId};
use embyhub_domain::invite::InviteCodeType;

use crate::error::BotServiceError;

/// Telegram user known to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub telegram_id: TelegramId,
    pub telegram_name: Option<String>,
    pub emby_id: Option<EmbyId>,
    pub emby_name: Option<String>,
    pub is_admin: bool,
    pub is_whitelist: bool,
    pub enable_register: bool,
    /// Epoch seconds. `None` or `0` means active.
    pub ban_time: Option<i64>,
    pub reason: Option<String>,
}

/// Static admin allow-list. Only seeds `is_admin` when a user is first seen.
#[derive(Debug, Clone, Default)]
pub struct AdminList(Arc<HashSet<TelegramId>>);

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = TelegramId>) -> Self {
        Self(Arc::new(ids.into_iter().collect()))
    }

    pub fn contains(&self, id: TelegramId) -> bool {
        self.0.contains(&id)
    }
}

/// Account dimension of a user's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    NoAccount,
    Active,
    Banned,
}

impl User {
    /// Fresh record as produced by get-or-create.
    pub fn new(telegram_id: TelegramId, is_admin: bool) -> Self {
        Self {
            telegram_id,
            telegram_name: None,
            emby_id: None,
            emby_name: None,
            is_admin,
            is_whitelist: false,
            enable_register: false,
            ban_time: None,
            reason: None,
        }
    }

    pub fn has_account(&self) -> bool {
        self.emby_id.is_some()
    }

    pub fn is_banned(&self) -> bool {
        matches!(self.ban_time, Some(t) if t > 0)
    }

    pub fn account_state(&self) -> AccountState {
        match (self.has_account(), self.is_banned()) {
            (false, _) => AccountState::NoAccount,
            (true, false) => AccountState::Active,
            (true, true) => AccountState::Banned,
        }
    }

    /// Media-server id of an account that exists and is not banned.
    pub fn active_emby_id(&self) -> Result<&EmbyId, BotServiceError> {
        let id = self.emby_id.as_ref().ok_or(BotServiceError::NotBound)?;
        if self.is_banned() {
            return Err(BotServiceError::AlreadyBanned);
        }
        Ok(id)
    }
}

/// One-time invite code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub issuer: TelegramId,
    pub code_type: InviteCodeType,
    pub is_used: bool,
    pub used_time: Option<i64>,
    pub used_by: Option<TelegramId>,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    pub fn new(code: String, issuer: TelegramId, code_type: InviteCodeType) -> Self {
        Self {
            id: Uuid::now_v7(),
            code,
            issuer,
            code_type,
            is_used: false,
            used_time: None,
            used_by: None,
            created_at: Utc::now(),
        }
    }
}

/// Global registration state (singleton row).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationConfig {
    pub total_register_user: i64,
    pub register_public_user: i64,
    /// Epoch seconds; `0` means no open window.
    pub register_public_time: i64,
}

impl RegistrationConfig {
    pub fn window_open(&self, now: i64) -> bool {
        self.register_public_time > 0 && now < self.register_public_time
    }

    pub fn deadline_expired(&self, now: i64) -> bool {
        self.register_public_time > 0 && self.register_public_time < now
    }
}

/// Admin patch for the registration config. `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationConfigPatch {
    pub register_public_user: Option<i64>,
    pub register_public_time: Option<i64>,
}

impl RegistrationConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.register_public_user.is_none() && self.register_public_time.is_none()
    }
}

/// Which flag a redeemed code flips on the redeemer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Register,
    Whitelist,
}

impl From<InviteCodeType> for Grant {
    fn from(kind: InviteCodeType) -> Self {
        match kind {
            InviteCodeType::Register => Self::Register,
            InviteCodeType::Whitelist => Self::Whitelist,
        }
    }
}

/// Media-server view of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbyAccountInfo {
    pub last_activity_date: Option<String>,
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MediaCounts {
    pub movies: u64,
    pub series: u64,
    pub episodes: u64,
}

/// A selectable line on the router service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub index: String,
    pub name: String,
}

/// Longest media-server account name accepted.
pub const ACCOUNT_NAME_MAX_LEN: usize = 32;

/// Account names are 1..=32 chars of ASCII letters, digits, `_`, `-` or `.`.
pub fn validate_account_name(name: &str) -> Result<(), BotServiceError> {
    if name.is_empty() || name.len() > ACCOUNT_NAME_MAX_LEN {
        return Err(BotServiceError::InvalidInput(
            "account name must be 1 to 32 characters",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(BotServiceError::InvalidInput(
            "account name may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}
