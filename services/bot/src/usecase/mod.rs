pub mod account;
pub mod invite_code;
pub mod media;
pub mod registration;
pub mod route;

use embyhub_domain::id::TelegramId;

use crate::domain::repository::{StoreTransaction, UserRepository};
use crate::domain::types::{AdminList, User};
use crate::error::BotServiceError;

/// Get-or-create a user, seeding `is_admin` from the allow-list.
pub(crate) async fn load_user<U: UserRepository>(
    users: &U,
    admins: &AdminList,
    telegram_id: TelegramId,
) -> Result<User, BotServiceError> {
    users
        .get_or_create(telegram_id, admins.contains(telegram_id))
        .await
}

/// Commit on success, roll back on failure. The body's error wins over a
/// failed rollback.
pub(crate) async fn settle<T, X: StoreTransaction>(
    tx: X,
    result: Result<T, BotServiceError>,
) -> Result<T, BotServiceError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => Err(abort(tx, e).await),
    }
}

/// Roll back after `err` and hand it back.
pub(crate) async fn abort<X: StoreTransaction>(tx: X, err: BotServiceError) -> BotServiceError {
    if let Err(rb) = tx.rollback().await {
        tracing::warn!(error = %rb, "transaction rollback failed");
    }
    err
}
