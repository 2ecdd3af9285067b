use axum::{Json, extract::State, http::StatusCode};

use embyhub_core::health::readiness;

use crate::domain::types::MediaCounts;
use crate::error::BotServiceError;
use crate::handlers::identity::Caller;
use crate::state::AppState;
use crate::usecase::media::CountAssetsUseCase;

// ── GET /media/counts ────────────────────────────────────────────────────────

pub async fn get_media_counts(
    _caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<MediaCounts>, BotServiceError> {
    let usecase = CountAssetsUseCase {
        media: state.emby.clone(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── GET /readyz ──────────────────────────────────────────────────────────────

pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(&state.db).await
}
