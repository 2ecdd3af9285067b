use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use embyhub_core::health::healthz;
use embyhub_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    account::{
        ban_account, create_account, get_account, member_left, reset_password, unban_account,
    },
    invite_code::{create_invite_codes, list_invite_codes, redeem_invite_code},
    media::{get_media_counts, readyz},
    registration::{get_registration_config, update_registration_config},
    route::{get_my_route, list_routes, select_my_route},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Accounts
        .route("/accounts", post(create_account))
        .route("/accounts/@me/password", post(reset_password))
        .route("/accounts/@me/route", get(get_my_route))
        .route("/accounts/@me/route", put(select_my_route))
        .route("/accounts/{telegram_id}", get(get_account))
        .route("/accounts/{telegram_id}/ban", post(ban_account))
        .route("/accounts/{telegram_id}/unban", post(unban_account))
        .route("/accounts/{telegram_id}/left", post(member_left))
        // Routes
        .route("/routes", get(list_routes))
        // Invite codes
        .route("/invite-codes", post(create_invite_codes))
        .route("/invite-codes", get(list_invite_codes))
        .route("/invite-codes/redeem", post(redeem_invite_code))
        // Registration config
        .route("/registration-config", get(get_registration_config))
        .route("/registration-config", patch(update_registration_config))
        // Media
        .route("/media/counts", get(get_media_counts))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
