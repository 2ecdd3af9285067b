use axum::{Json, extract::State};
use serde::Deserialize;

use crate::domain::types::Route;
use crate::error::BotServiceError;
use crate::handlers::identity::Caller;
use crate::state::AppState;
use crate::usecase::route::{
    GetUserRouteUseCase, ListRoutesUseCase, RouteSelection, SelectRouteUseCase,
};

// ── GET /routes ──────────────────────────────────────────────────────────────

pub async fn list_routes(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Route>>, BotServiceError> {
    let usecase = ListRoutesUseCase {
        users: state.user_repo(),
        router: state.router.clone(),
        admins: state.admins.clone(),
    };
    Ok(Json(usecase.execute(caller).await?))
}

// ── GET /accounts/@me/route ──────────────────────────────────────────────────

pub async fn get_my_route(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Json<RouteSelection>, BotServiceError> {
    let usecase = GetUserRouteUseCase {
        users: state.user_repo(),
        router: state.router.clone(),
        admins: state.admins.clone(),
    };
    Ok(Json(usecase.execute(caller).await?))
}

// ── PUT /accounts/@me/route ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SelectRouteRequest {
    pub index: String,
}

pub async fn select_my_route(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(body): Json<SelectRouteRequest>,
) -> Result<Json<Route>, BotServiceError> {
    let usecase = SelectRouteUseCase {
        users: state.user_repo(),
        router: state.router.clone(),
        admins: state.admins.clone(),
    };
    Ok(Json(usecase.execute(caller, &body.index).await?))
}
