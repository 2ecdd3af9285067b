//! Caller identity forwarded by the chat dispatcher.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

use embyhub_domain::id::TelegramId;

pub const TELEGRAM_USER_ID_HEADER: &str = "x-telegram-user-id";

/// Telegram id of the user who issued the command.
///
/// Returns 401 if `x-telegram-user-id` is absent or not an integer.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub TelegramId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Read the header synchronously so the returned future borrows nothing.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let telegram_id = parts
            .headers
            .get(TELEGRAM_USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<TelegramId>().ok());

        async move {
            let telegram_id = telegram_id.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self(telegram_id))
        }
    }
}
