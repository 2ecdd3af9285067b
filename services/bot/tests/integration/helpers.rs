use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use embyhub_bot::domain::repository::{
    InviteCodeRepository, MediaServerPort, RegistrationConfigRepository, StoreTransaction,
    UnitOfWork, UserRepository,
};
use embyhub_bot::domain::types::{
    AdminList, EmbyAccountInfo, Grant, InviteCode, MediaCounts, RegistrationConfig,
    RegistrationConfigPatch, User,
};
use embyhub_bot::error::BotServiceError;
use embyhub_domain::id::{EmbyId, TelegramId};
use embyhub_domain::invite::InviteCodeType;

pub const ADMIN: TelegramId = TelegramId(1);

pub fn admins() -> AdminList {
    AdminList::new([ADMIN])
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: HashMap<TelegramId, User>,
    pub codes: Vec<InviteCode>,
    pub config: Option<RegistrationConfig>,
}

/// In-memory record store. A transaction holds the table lock from `begin` to
/// `commit`/`rollback` and works on a staged copy, so transactions serialise
/// and a rollback leaves no trace.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    code_lookups: Arc<AtomicUsize>,
    fail_grant: Arc<AtomicBool>,
    fail_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn with_config(config: RegistrationConfig) -> Self {
        let store = Self::default();
        store
            .tables
            .try_lock()
            .expect("fresh store is unlocked")
            .config = Some(config);
        store
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.telegram_id, user);
    }

    pub async fn insert_code(&self, code: InviteCode) {
        self.tables.lock().await.codes.push(code);
    }

    pub async fn user(&self, id: TelegramId) -> Option<User> {
        self.tables.lock().await.users.get(&id).cloned()
    }

    pub async fn code(&self, code: &str) -> Option<InviteCode> {
        self.tables
            .lock()
            .await
            .codes
            .iter()
            .find(|c| c.code == code)
            .cloned()
    }

    pub async fn config(&self) -> Option<RegistrationConfig> {
        self.tables.lock().await.config
    }

    /// Make every transactional grant fail with a store error.
    pub fn fail_grants(&self) {
        self.fail_grant.store(true, Ordering::SeqCst);
    }

    /// Make every commit fail, leaving the store untouched.
    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Number of `find_by_code` calls served so far.
    pub fn code_lookups(&self) -> usize {
        self.code_lookups.load(Ordering::SeqCst)
    }
}

impl UserRepository for MemoryStore {
    async fn get_or_create(
        &self,
        telegram_id: TelegramId,
        is_admin: bool,
    ) -> Result<User, BotServiceError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .users
            .entry(telegram_id)
            .or_insert_with(|| User::new(telegram_id, is_admin))
            .clone())
    }

    async fn find(&self, telegram_id: TelegramId) -> Result<Option<User>, BotServiceError> {
        Ok(self.tables.lock().await.users.get(&telegram_id).cloned())
    }

    async fn set_ban(
        &self,
        telegram_id: TelegramId,
        ban_time: i64,
        reason: &str,
    ) -> Result<bool, BotServiceError> {
        let mut tables = self.tables.lock().await;
        match tables.users.get_mut(&telegram_id) {
            Some(u) if u.has_account() && !u.is_banned() => {
                u.ban_time = Some(ban_time);
                u.reason = Some(reason.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_ban(&self, telegram_id: TelegramId) -> Result<bool, BotServiceError> {
        let mut tables = self.tables.lock().await;
        Ok(clear_ban_in(&mut tables, telegram_id))
    }
}

impl InviteCodeRepository for MemoryStore {
    async fn create(&self, code: &InviteCode) -> Result<bool, BotServiceError> {
        let mut tables = self.tables.lock().await;
        if tables.codes.iter().any(|c| c.code == code.code) {
            return Ok(false);
        }
        tables.codes.push(code.clone());
        Ok(true)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<InviteCode>, BotServiceError> {
        self.code_lookups.fetch_add(1, Ordering::SeqCst);
        let found = self
            .tables
            .lock()
            .await
            .codes
            .iter()
            .find(|c| c.code == code)
            .cloned();
        // Let concurrent redeemers all take their snapshot before any commits.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn list_by_issuer(
        &self,
        issuer: TelegramId,
    ) -> Result<Vec<InviteCode>, BotServiceError> {
        let tables = self.tables.lock().await;
        let mut codes: Vec<_> = tables
            .codes
            .iter()
            .filter(|c| c.issuer == issuer)
            .cloned()
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(codes)
    }
}

impl RegistrationConfigRepository for MemoryStore {
    async fn first_or_create(&self) -> Result<Option<RegistrationConfig>, BotServiceError> {
        let config = *self
            .tables
            .lock()
            .await
            .config
            .get_or_insert_with(Default::default);
        // Let concurrent creators all evaluate the policy before any commits.
        tokio::task::yield_now().await;
        Ok(Some(config))
    }

    async fn clear_expired_deadline(&self, now: i64) -> Result<bool, BotServiceError> {
        let mut tables = self.tables.lock().await;
        match tables.config.as_mut() {
            Some(c) if c.deadline_expired(now) => {
                c.register_public_time = 0;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update(
        &self,
        patch: &RegistrationConfigPatch,
    ) -> Result<Option<RegistrationConfig>, BotServiceError> {
        let mut tables = self.tables.lock().await;
        if let Some(c) = tables.config.as_mut() {
            if let Some(n) = patch.register_public_user {
                c.register_public_user = n;
            }
            if let Some(t) = patch.register_public_time {
                c.register_public_time = t;
            }
        }
        Ok(tables.config)
    }
}

impl UnitOfWork for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, BotServiceError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = (*guard).clone();
        Ok(MemoryTx {
            guard,
            staged,
            fail_grant: self.fail_grant.load(Ordering::SeqCst),
            fail_commit: self.fail_commit.load(Ordering::SeqCst),
        })
    }
}

fn clear_ban_in(tables: &mut Tables, telegram_id: TelegramId) -> bool {
    match tables.users.get_mut(&telegram_id) {
        Some(u) if u.is_banned() => {
            u.ban_time = Some(0);
            u.reason = None;
            true
        }
        _ => false,
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_grant: bool,
    fail_commit: bool,
}

impl StoreTransaction for MemoryTx {
    async fn record_registration(&mut self, consume_quota: bool) -> Result<bool, BotServiceError> {
        let config = self
            .staged
            .config
            .as_mut()
            .ok_or(BotServiceError::ConfigMissing)?;
        config.total_register_user += 1;
        if consume_quota && config.register_public_user > 0 {
            config.register_public_user -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn bind_account(
        &mut self,
        telegram_id: TelegramId,
        emby_id: &EmbyId,
        emby_name: &str,
    ) -> Result<(), BotServiceError> {
        match self.staged.users.get_mut(&telegram_id) {
            Some(u) if !u.has_account() => {
                u.emby_id = Some(emby_id.clone());
                u.emby_name = Some(emby_name.to_owned());
                u.enable_register = false;
                Ok(())
            }
            _ => Err(BotServiceError::AlreadyBound),
        }
    }

    async fn mark_code_used(
        &mut self,
        code_id: Uuid,
        used_by: TelegramId,
        used_time: i64,
    ) -> Result<bool, BotServiceError> {
        match self
            .staged
            .codes
            .iter_mut()
            .find(|c| c.id == code_id && !c.is_used)
        {
            Some(c) => {
                c.is_used = true;
                c.used_by = Some(used_by);
                c.used_time = Some(used_time);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn grant(
        &mut self,
        telegram_id: TelegramId,
        grant: Grant,
    ) -> Result<bool, BotServiceError> {
        if self.fail_grant {
            return Err(anyhow::anyhow!("grant write failed").into());
        }
        let Some(u) = self.staged.users.get_mut(&telegram_id) else {
            return Ok(false);
        };
        match grant {
            Grant::Register if !u.has_account() && !u.enable_register => {
                u.enable_register = true;
                Ok(true)
            }
            Grant::Whitelist if u.has_account() && !u.is_whitelist => {
                u.is_whitelist = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_ban(&mut self, telegram_id: TelegramId) -> Result<bool, BotServiceError> {
        Ok(clear_ban_in(&mut self.staged, telegram_id))
    }

    async fn commit(self) -> Result<(), BotServiceError> {
        if self.fail_commit {
            return Err(anyhow::anyhow!("commit failed").into());
        }
        let MemoryTx {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), BotServiceError> {
        Ok(())
    }
}

// ── MockMediaServer ──────────────────────────────────────────────────────────

/// Records every call; `fail` makes every call return `RemoteFailure`.
#[derive(Clone, Default)]
pub struct MockMediaServer {
    pub fail: Arc<AtomicBool>,
    pub calls: Arc<StdMutex<Vec<String>>>,
}

impl MockMediaServer {
    pub fn failing() -> Self {
        let media = Self::default();
        media.fail.store(true, Ordering::SeqCst);
        media
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), BotServiceError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BotServiceError::RemoteFailure("media server down".to_owned()));
        }
        Ok(())
    }
}

impl MediaServerPort for MockMediaServer {
    async fn create_account(&self, name: &str) -> Result<EmbyId, BotServiceError> {
        self.record(format!("create:{name}"))?;
        Ok(EmbyId(format!("emby-{name}")))
    }

    async fn set_password(&self, id: &EmbyId, _password: &str) -> Result<(), BotServiceError> {
        self.record(format!("set_password:{id}"))
    }

    async fn reset_password(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.record(format!("reset_password:{id}"))
    }

    async fn set_default_policy(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.record(format!("default_policy:{id}"))
    }

    async fn ban_account(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.record(format!("ban:{id}"))
    }

    async fn get_account(&self, id: &EmbyId) -> Result<EmbyAccountInfo, BotServiceError> {
        self.record(format!("get:{id}"))?;
        Ok(EmbyAccountInfo {
            last_activity_date: None,
            date_created: None,
        })
    }

    async fn count_assets(&self) -> Result<MediaCounts, BotServiceError> {
        self.record("count".to_owned())?;
        Ok(MediaCounts::default())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn user_with_account(id: i64) -> User {
    User {
        emby_id: Some(EmbyId(format!("emby-{id}"))),
        emby_name: Some(format!("user{id}")),
        ..User::new(TelegramId(id), false)
    }
}

pub fn banned_user(id: i64) -> User {
    User {
        ban_time: Some(1_700_000_000),
        reason: Some("left the group".to_owned()),
        ..user_with_account(id)
    }
}

pub fn invite(code: &str, code_type: InviteCodeType) -> InviteCode {
    InviteCode::new(code.to_owned(), ADMIN, code_type)
}
