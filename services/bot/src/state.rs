use sea_orm::DatabaseConnection;

use crate::domain::types::AdminList;
use crate::infra::db::{
    DbInviteCodeRepository, DbRegistrationConfigRepository, DbUnitOfWork, DbUserRepository,
};
use crate::infra::emby::EmbyClient;
use crate::infra::router_api::RouterClient;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub emby: EmbyClient,
    pub router: RouterClient,
    pub admins: AdminList,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn invite_code_repo(&self) -> DbInviteCodeRepository {
        DbInviteCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn config_repo(&self) -> DbRegistrationConfigRepository {
        DbRegistrationConfigRepository {
            db: self.db.clone(),
        }
    }

    pub fn unit_of_work(&self) -> DbUnitOfWork {
        DbUnitOfWork {
            db: self.db.clone(),
        }
    }
}
