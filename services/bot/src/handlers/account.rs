use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use embyhub_domain::id::TelegramId;

use crate::domain::types::{AccountState, User};
use crate::error::BotServiceError;
use crate::handlers::identity::Caller;
use crate::state::AppState;
use crate::usecase::account::{
    BanInput, BanUseCase, CreateAccountInput, CreateAccountUseCase, GetInfoUseCase,
    MemberLeftUseCase, ResetPasswordUseCase, UnbanUseCase,
};

/// Ban reason when the operator gives none.
const DEFAULT_BAN_REASON: &str = "banned by admin";

#[derive(Serialize)]
pub struct UserResponse {
    pub telegram_id: TelegramId,
    pub telegram_name: Option<String>,
    pub emby_id: Option<String>,
    pub emby_name: Option<String>,
    pub is_admin: bool,
    pub is_whitelist: bool,
    pub enable_register: bool,
    pub state: AccountState,
    #[serde(serialize_with = "embyhub_core::serde::opt_epoch_as_rfc3339")]
    pub ban_time: Option<i64>,
    pub reason: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            state: user.account_state(),
            telegram_id: user.telegram_id,
            telegram_name: user.telegram_name,
            emby_id: user.emby_id.map(|id| id.0),
            emby_name: user.emby_name,
            is_admin: user.is_admin,
            is_whitelist: user.is_whitelist,
            enable_register: user.enable_register,
            ban_time: user.ban_time,
            reason: user.reason,
        }
    }
}

// ── POST /accounts ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct CreateAccountResponse {
    pub telegram_id: TelegramId,
    pub emby_id: Option<String>,
    pub emby_name: Option<String>,
    pub password: String,
}

pub async fn create_account(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), BotServiceError> {
    let usecase = CreateAccountUseCase {
        users: state.user_repo(),
        config: state.config_repo(),
        uow: state.unit_of_work(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let created = usecase
        .execute(CreateAccountInput {
            telegram_id: caller,
            name: body.name,
            password: body.password,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            telegram_id: created.user.telegram_id,
            emby_id: created.user.emby_id.map(|id| id.0),
            emby_name: created.user.emby_name,
            password: created.password,
        }),
    ))
}

// ── GET /accounts/{telegram_id} ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct AccountInfoResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub last_activity_date: Option<String>,
    pub date_created: Option<String>,
}

pub async fn get_account(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(target): Path<TelegramId>,
) -> Result<Json<AccountInfoResponse>, BotServiceError> {
    let usecase = GetInfoUseCase {
        users: state.user_repo(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let info = usecase.execute(caller, target).await?;
    Ok(Json(AccountInfoResponse {
        user: info.user.into(),
        last_activity_date: info.emby.last_activity_date,
        date_created: info.emby.date_created,
    }))
}

// ── POST /accounts/@me/password ──────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct PasswordResponse {
    pub password: String,
}

pub async fn reset_password(
    Caller(caller): Caller,
    State(state): State<AppState>,
    body: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<PasswordResponse>, BotServiceError> {
    let Json(body) = body.unwrap_or_default();
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let password = usecase.execute(caller, body.password).await?;
    Ok(Json(PasswordResponse { password }))
}

// ── POST /accounts/{telegram_id}/ban ─────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct BanRequest {
    pub reason: Option<String>,
}

pub async fn ban_account(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(target): Path<TelegramId>,
    body: Option<Json<BanRequest>>,
) -> Result<Json<UserResponse>, BotServiceError> {
    let Json(body) = body.unwrap_or_default();
    let usecase = BanUseCase {
        users: state.user_repo(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let user = usecase
        .execute(BanInput {
            target,
            reason: body
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BAN_REASON.to_owned()),
            operator: Some(caller),
        })
        .await?;
    Ok(Json(user.into()))
}

// ── POST /accounts/{telegram_id}/unban ───────────────────────────────────────

pub async fn unban_account(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(target): Path<TelegramId>,
) -> Result<Json<UserResponse>, BotServiceError> {
    let usecase = UnbanUseCase {
        users: state.user_repo(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let user = usecase.execute(target, Some(caller)).await?;
    Ok(Json(user.into()))
}

// ── POST /accounts/{telegram_id}/left ────────────────────────────────────────

#[derive(Serialize)]
pub struct MemberLeftResponse {
    pub banned: bool,
}

/// Group-membership event from the dispatcher; no operator involved.
pub async fn member_left(
    State(state): State<AppState>,
    Path(target): Path<TelegramId>,
) -> Result<Json<MemberLeftResponse>, BotServiceError> {
    let usecase = MemberLeftUseCase {
        users: state.user_repo(),
        media: state.emby.clone(),
    };
    let banned = usecase.execute(target).await?;
    Ok(Json(MemberLeftResponse { banned }))
}
