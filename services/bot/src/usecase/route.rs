use serde::Serialize;
use tracing::info;

use embyhub_domain::id::TelegramId;

use crate::domain::repository::{RouterPort, UserRepository};
use crate::domain::types::{AdminList, Route};
use crate::error::BotServiceError;
use crate::usecase::load_user;

/// Current selection plus the routes to choose from.
#[derive(Debug, Serialize)]
pub struct RouteSelection {
    pub current: String,
    pub routes: Vec<Route>,
}

// ── ListRoutes ───────────────────────────────────────────────────────────────

pub struct ListRoutesUseCase<U: UserRepository, R: RouterPort> {
    pub users: U,
    pub router: R,
    pub admins: AdminList,
}

impl<U: UserRepository, R: RouterPort> ListRoutesUseCase<U, R> {
    pub async fn execute(&self, caller: TelegramId) -> Result<Vec<Route>, BotServiceError> {
        let user = load_user(&self.users, &self.admins, caller).await?;
        user.active_emby_id()?;
        self.router.list_routes().await
    }
}

// ── GetUserRoute ─────────────────────────────────────────────────────────────

pub struct GetUserRouteUseCase<U: UserRepository, R: RouterPort> {
    pub users: U,
    pub router: R,
    pub admins: AdminList,
}

impl<U: UserRepository, R: RouterPort> GetUserRouteUseCase<U, R> {
    pub async fn execute(&self, caller: TelegramId) -> Result<RouteSelection, BotServiceError> {
        let user = load_user(&self.users, &self.admins, caller).await?;
        let emby_id = user.active_emby_id()?;
        let current = self.router.user_route(emby_id).await?;
        let routes = self.router.list_routes().await?;
        Ok(RouteSelection { current, routes })
    }
}

// ── SelectRoute ──────────────────────────────────────────────────────────────

pub struct SelectRouteUseCase<U: UserRepository, R: RouterPort> {
    pub users: U,
    pub router: R,
    pub admins: AdminList,
}

impl<U: UserRepository, R: RouterPort> SelectRouteUseCase<U, R> {
    /// `index` must name one of the routes the router currently offers.
    pub async fn execute(&self, caller: TelegramId, index: &str) -> Result<Route, BotServiceError> {
        let user = load_user(&self.users, &self.admins, caller).await?;
        let emby_id = user.active_emby_id()?;
        let route = self
            .router
            .list_routes()
            .await?
            .into_iter()
            .find(|r| r.index == index)
            .ok_or(BotServiceError::InvalidInput("unknown route index"))?;
        if !self.router.update_user_route(emby_id, &route.index).await? {
            return Err(BotServiceError::remote(
                "update user route",
                "router refused the selection",
            ));
        }
        info!(%caller, index = %route.index, "route selected");
        Ok(route)
    }
}
