use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use embyhub_bot_schema::{invite_codes, registration_config, users};
use embyhub_core::sea_ext::DbErrExt;
use embyhub_domain::id::{EmbyId, TelegramId};
use embyhub_domain::invite::InviteCodeType;

use crate::domain::repository::{
    InviteCodeRepository, RegistrationConfigRepository, StoreTransaction, UnitOfWork,
    UserRepository,
};
use crate::domain::types::{Grant, InviteCode, RegistrationConfig, RegistrationConfigPatch, User};
use crate::error::BotServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn get_or_create(
        &self,
        telegram_id: TelegramId,
        is_admin: bool,
    ) -> Result<User, BotServiceError> {
        let now = Utc::now();
        let model = users::ActiveModel {
            telegram_id: Set(telegram_id.get()),
            telegram_name: Set(None),
            emby_id: Set(None),
            emby_name: Set(None),
            is_admin: Set(is_admin),
            is_whitelist: Set(false),
            enable_register: Set(false),
            ban_time: Set(None),
            reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        users::Entity::insert(model)
            .on_conflict(
                OnConflict::column(users::Column::TelegramId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("insert user if absent")?;
        let model = users::Entity::find_by_id(telegram_id.get())
            .one(&self.db)
            .await
            .context("find user after insert")?
            .with_context(|| format!("user {telegram_id} missing after insert"))?;
        Ok(user_from_model(model))
    }

    async fn find(&self, telegram_id: TelegramId) -> Result<Option<User>, BotServiceError> {
        let model = users::Entity::find_by_id(telegram_id.get())
            .one(&self.db)
            .await
            .context("find user")?;
        Ok(model.map(user_from_model))
    }

    async fn set_ban(
        &self,
        telegram_id: TelegramId,
        ban_time: i64,
        reason: &str,
    ) -> Result<bool, BotServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::BanTime, Expr::value(Some(ban_time)))
            .col_expr(users::Column::Reason, Expr::value(Some(reason.to_owned())))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::TelegramId.eq(telegram_id.get()))
            .filter(users::Column::EmbyId.is_not_null())
            .filter(not_banned())
            .exec(&self.db)
            .await
            .context("set user ban")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear_ban(&self, telegram_id: TelegramId) -> Result<bool, BotServiceError> {
        let result = clear_ban_stmt(telegram_id)
            .exec(&self.db)
            .await
            .context("clear user ban")?;
        Ok(result.rows_affected > 0)
    }
}

fn not_banned() -> Condition {
    Condition::any()
        .add(users::Column::BanTime.is_null())
        .add(users::Column::BanTime.lte(0))
}

fn clear_ban_stmt(telegram_id: TelegramId) -> sea_orm::UpdateMany<users::Entity> {
    users::Entity::update_many()
        .col_expr(users::Column::BanTime, Expr::value(Some(0i64)))
        .col_expr(users::Column::Reason, Expr::value(Option::<String>::None))
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::TelegramId.eq(telegram_id.get()))
        .filter(users::Column::BanTime.gt(0))
}

fn user_from_model(model: users::Model) -> User {
    User {
        telegram_id: TelegramId(model.telegram_id),
        telegram_name: model.telegram_name,
        emby_id: model.emby_id.map(EmbyId),
        emby_name: model.emby_name,
        is_admin: model.is_admin,
        is_whitelist: model.is_whitelist,
        enable_register: model.enable_register,
        ban_time: model.ban_time,
        reason: model.reason,
    }
}

// ── InviteCode repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbInviteCodeRepository {
    pub db: DatabaseConnection,
}

impl InviteCodeRepository for DbInviteCodeRepository {
    async fn create(&self, code: &InviteCode) -> Result<bool, BotServiceError> {
        let model = invite_codes::ActiveModel {
            id: Set(code.id),
            code: Set(code.code.clone()),
            telegram_id: Set(code.issuer.get()),
            code_type: Set(code.code_type.as_str().to_owned()),
            is_used: Set(false),
            used_time: Set(None),
            used_user_id: Set(None),
            created_at: Set(code.created_at),
        };
        match invite_codes::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("create invite code").into()),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<InviteCode>, BotServiceError> {
        let model = invite_codes::Entity::find()
            .filter(invite_codes::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find invite code")?;
        model.map(invite_code_from_model).transpose()
    }

    async fn list_by_issuer(
        &self,
        issuer: TelegramId,
    ) -> Result<Vec<InviteCode>, BotServiceError> {
        let models = invite_codes::Entity::find()
            .filter(invite_codes::Column::TelegramId.eq(issuer.get()))
            .order_by_desc(invite_codes::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list invite codes by issuer")?;
        models.into_iter().map(invite_code_from_model).collect()
    }
}

fn invite_code_from_model(model: invite_codes::Model) -> Result<InviteCode, BotServiceError> {
    let code_type: InviteCodeType = model
        .code_type
        .parse()
        .context("invalid code_type in invite_codes")?;
    Ok(InviteCode {
        id: model.id,
        code: model.code,
        issuer: TelegramId(model.telegram_id),
        code_type,
        is_used: model.is_used,
        used_time: model.used_time,
        used_by: model.used_user_id.map(TelegramId),
        created_at: model.created_at,
    })
}

// ── RegistrationConfig repository ─────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRegistrationConfigRepository {
    pub db: DatabaseConnection,
}

impl RegistrationConfigRepository for DbRegistrationConfigRepository {
    async fn first_or_create(&self) -> Result<Option<RegistrationConfig>, BotServiceError> {
        let now = Utc::now();
        let model = registration_config::ActiveModel {
            id: Set(registration_config::SINGLETON_ID),
            total_register_user: Set(0),
            register_public_user: Set(0),
            register_public_time: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        registration_config::Entity::insert(model)
            .on_conflict(
                OnConflict::column(registration_config::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("insert registration config if absent")?;
        self.find().await
    }

    async fn clear_expired_deadline(&self, now: i64) -> Result<bool, BotServiceError> {
        let result = registration_config::Entity::update_many()
            .col_expr(registration_config::Column::RegisterPublicTime, Expr::value(0i64))
            .col_expr(registration_config::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registration_config::Column::Id.eq(registration_config::SINGLETON_ID))
            .filter(registration_config::Column::RegisterPublicTime.gt(0))
            .filter(registration_config::Column::RegisterPublicTime.lt(now))
            .exec(&self.db)
            .await
            .context("clear expired registration deadline")?;
        Ok(result.rows_affected > 0)
    }

    async fn update(
        &self,
        patch: &RegistrationConfigPatch,
    ) -> Result<Option<RegistrationConfig>, BotServiceError> {
        let mut stmt = registration_config::Entity::update_many()
            .col_expr(registration_config::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registration_config::Column::Id.eq(registration_config::SINGLETON_ID));
        if let Some(n) = patch.register_public_user {
            stmt = stmt.col_expr(registration_config::Column::RegisterPublicUser, Expr::value(n));
        }
        if let Some(t) = patch.register_public_time {
            stmt = stmt.col_expr(registration_config::Column::RegisterPublicTime, Expr::value(t));
        }
        stmt.exec(&self.db)
            .await
            .context("update registration config")?;
        self.find().await
    }
}

impl DbRegistrationConfigRepository {
    async fn find(&self) -> Result<Option<RegistrationConfig>, BotServiceError> {
        let model = registration_config::Entity::find_by_id(registration_config::SINGLETON_ID)
            .one(&self.db)
            .await
            .context("find registration config")?;
        Ok(model.map(config_from_model))
    }
}

fn config_from_model(model: registration_config::Model) -> RegistrationConfig {
    RegistrationConfig {
        total_register_user: model.total_register_user,
        register_public_user: model.register_public_user,
        register_public_time: model.register_public_time,
    }
}

// ── Unit of work ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUnitOfWork {
    pub db: DatabaseConnection,
}

impl UnitOfWork for DbUnitOfWork {
    type Tx = DbTransaction;

    async fn begin(&self) -> Result<DbTransaction, BotServiceError> {
        let txn = self.db.begin().await.context("begin transaction")?;
        Ok(DbTransaction { txn })
    }
}

/// sea-orm rolls the transaction back if it is dropped uncommitted.
pub struct DbTransaction {
    txn: DatabaseTransaction,
}

impl StoreTransaction for DbTransaction {
    async fn record_registration(&mut self, consume_quota: bool) -> Result<bool, BotServiceError> {
        let mut spent = false;
        if consume_quota {
            let result = registration_config::Entity::update_many()
                .col_expr(
                    registration_config::Column::RegisterPublicUser,
                    Expr::col(registration_config::Column::RegisterPublicUser).sub(1),
                )
                .filter(registration_config::Column::Id.eq(registration_config::SINGLETON_ID))
                .filter(registration_config::Column::RegisterPublicUser.gt(0))
                .exec(&self.txn)
                .await
                .context("consume public registration quota")?;
            spent = result.rows_affected > 0;
        }
        let result = registration_config::Entity::update_many()
            .col_expr(
                registration_config::Column::TotalRegisterUser,
                Expr::col(registration_config::Column::TotalRegisterUser).add(1),
            )
            .col_expr(registration_config::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registration_config::Column::Id.eq(registration_config::SINGLETON_ID))
            .exec(&self.txn)
            .await
            .context("increment total registrations")?;
        if result.rows_affected == 0 {
            return Err(BotServiceError::ConfigMissing);
        }
        Ok(spent)
    }

    async fn bind_account(
        &mut self,
        telegram_id: TelegramId,
        emby_id: &EmbyId,
        emby_name: &str,
    ) -> Result<(), BotServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::EmbyId, Expr::value(Some(emby_id.as_str().to_owned())))
            .col_expr(users::Column::EmbyName, Expr::value(Some(emby_name.to_owned())))
            .col_expr(users::Column::EnableRegister, Expr::value(false))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::TelegramId.eq(telegram_id.get()))
            .filter(users::Column::EmbyId.is_null())
            .exec(&self.txn)
            .await
            .context("bind media server account")?;
        if result.rows_affected == 0 {
            return Err(BotServiceError::AlreadyBound);
        }
        Ok(())
    }

    async fn mark_code_used(
        &mut self,
        code_id: Uuid,
        used_by: TelegramId,
        used_time: i64,
    ) -> Result<bool, BotServiceError> {
        let result = invite_codes::Entity::update_many()
            .col_expr(invite_codes::Column::IsUsed, Expr::value(true))
            .col_expr(invite_codes::Column::UsedTime, Expr::value(Some(used_time)))
            .col_expr(invite_codes::Column::UsedUserId, Expr::value(Some(used_by.get())))
            .filter(invite_codes::Column::Id.eq(code_id))
            .filter(invite_codes::Column::IsUsed.eq(false))
            .exec(&self.txn)
            .await
            .context("mark invite code used")?;
        Ok(result.rows_affected > 0)
    }

    async fn grant(
        &mut self,
        telegram_id: TelegramId,
        grant: Grant,
    ) -> Result<bool, BotServiceError> {
        let stmt = users::Entity::update_many()
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::TelegramId.eq(telegram_id.get()));
        let stmt = match grant {
            Grant::Register => stmt
                .col_expr(users::Column::EnableRegister, Expr::value(true))
                .filter(users::Column::EnableRegister.eq(false))
                .filter(users::Column::EmbyId.is_null()),
            Grant::Whitelist => stmt
                .col_expr(users::Column::IsWhitelist, Expr::value(true))
                .filter(users::Column::IsWhitelist.eq(false))
                .filter(users::Column::EmbyId.is_not_null()),
        };
        let result = stmt.exec(&self.txn).await.context("grant invite code flag")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear_ban(&mut self, telegram_id: TelegramId) -> Result<bool, BotServiceError> {
        let result = clear_ban_stmt(telegram_id)
            .exec(&self.txn)
            .await
            .context("clear user ban in transaction")?;
        Ok(result.rows_affected > 0)
    }

    async fn commit(self) -> Result<(), BotServiceError> {
        self.txn.commit().await.context("commit transaction")?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), BotServiceError> {
        self.txn.rollback().await.context("rollback transaction")?;
        Ok(())
    }
}
