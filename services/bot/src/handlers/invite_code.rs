use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use embyhub_domain::id::TelegramId;
use embyhub_domain::invite::InviteCodeType;

use crate::domain::types::InviteCode;
use crate::error::BotServiceError;
use crate::handlers::identity::Caller;
use crate::state::AppState;
use crate::usecase::invite_code::{
    CreateInviteCodesInput, CreateInviteCodesUseCase, ListInviteCodesUseCase,
    MAX_CODES_PER_REQUEST, RedeemInviteCodeUseCase,
};

#[derive(Serialize)]
pub struct InviteCodeResponse {
    pub code: String,
    pub code_type: InviteCodeType,
    pub issuer: TelegramId,
    pub is_used: bool,
    #[serde(serialize_with = "embyhub_core::serde::opt_epoch_as_rfc3339")]
    pub used_time: Option<i64>,
    pub used_by: Option<TelegramId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<InviteCode> for InviteCodeResponse {
    fn from(code: InviteCode) -> Self {
        Self {
            code: code.code,
            code_type: code.code_type,
            issuer: code.issuer,
            is_used: code.is_used,
            used_time: code.used_time,
            used_by: code.used_by,
            created_at: code.created_at,
        }
    }
}

// ── POST /invite-codes ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateInviteCodesRequest {
    pub code_type: InviteCodeType,
    pub count: Option<i64>,
}

pub async fn create_invite_codes(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(body): Json<CreateInviteCodesRequest>,
) -> Result<(StatusCode, Json<Vec<InviteCodeResponse>>), BotServiceError> {
    // Oversized batches are clamped here; the use case rejects anything else out of range.
    let count = body.count.unwrap_or(1).min(MAX_CODES_PER_REQUEST);
    let usecase = CreateInviteCodesUseCase {
        users: state.user_repo(),
        codes: state.invite_code_repo(),
        admins: state.admins.clone(),
    };
    let codes = usecase
        .execute(CreateInviteCodesInput {
            issuer: caller,
            code_type: body.code_type,
            count,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(codes.into_iter().map(Into::into).collect()),
    ))
}

// ── GET /invite-codes ────────────────────────────────────────────────────────

pub async fn list_invite_codes(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<InviteCodeResponse>>, BotServiceError> {
    let usecase = ListInviteCodesUseCase {
        users: state.user_repo(),
        codes: state.invite_code_repo(),
        admins: state.admins.clone(),
    };
    let codes = usecase.execute(caller).await?;
    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

// ── POST /invite-codes/redeem ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

pub async fn redeem_invite_code(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(body): Json<RedeemRequest>,
) -> Result<Json<InviteCodeResponse>, BotServiceError> {
    let usecase = RedeemInviteCodeUseCase {
        users: state.user_repo(),
        codes: state.invite_code_repo(),
        uow: state.unit_of_work(),
        media: state.emby.clone(),
        admins: state.admins.clone(),
    };
    let code = usecase.execute(caller, body.code.trim()).await?;
    Ok(Json(code.into()))
}
