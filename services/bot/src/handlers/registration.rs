use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use embyhub_core::serde::epoch_to_rfc3339;

use crate::domain::types::{RegistrationConfig, RegistrationConfigPatch};
use crate::error::BotServiceError;
use crate::handlers::identity::Caller;
use crate::state::AppState;
use crate::usecase::registration::{GetRegistrationConfigUseCase, SetRegistrationConfigUseCase};

#[derive(Serialize)]
pub struct RegistrationConfigResponse {
    pub total_register_user: i64,
    pub register_public_user: i64,
    /// Epoch seconds, `0` when no window is open.
    pub register_public_time: i64,
    /// Same deadline as RFC 3339, `null` when unset.
    pub register_public_deadline: Option<String>,
}

impl From<RegistrationConfig> for RegistrationConfigResponse {
    fn from(config: RegistrationConfig) -> Self {
        Self {
            total_register_user: config.total_register_user,
            register_public_user: config.register_public_user,
            register_public_time: config.register_public_time,
            register_public_deadline: epoch_to_rfc3339(config.register_public_time),
        }
    }
}

// ── GET /registration-config ─────────────────────────────────────────────────

pub async fn get_registration_config(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Json<RegistrationConfigResponse>, BotServiceError> {
    let usecase = GetRegistrationConfigUseCase {
        users: state.user_repo(),
        config: state.config_repo(),
        admins: state.admins.clone(),
    };
    let config = usecase.execute(caller).await?;
    Ok(Json(config.into()))
}

// ── PATCH /registration-config ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateRegistrationConfigRequest {
    pub register_public_user: Option<i64>,
    pub register_public_time: Option<i64>,
}

pub async fn update_registration_config(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(body): Json<UpdateRegistrationConfigRequest>,
) -> Result<Json<RegistrationConfigResponse>, BotServiceError> {
    let usecase = SetRegistrationConfigUseCase {
        users: state.user_repo(),
        config: state.config_repo(),
        admins: state.admins.clone(),
    };
    let config = usecase
        .execute(
            caller,
            RegistrationConfigPatch {
                register_public_user: body.register_public_user,
                register_public_time: body.register_public_time,
            },
        )
        .await?;
    Ok(Json(config.into()))
}
