//! Capability predicates over an immutable user snapshot.
//!
//! Each check returns `Ok(())` or the kind of refusal; nothing here touches
//! the store or the media server.

use embyhub_domain::invite::InviteCodeType;

use crate::domain::types::User;
use crate::error::BotServiceError;

pub fn check_admin(user: &User) -> Result<(), BotServiceError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(BotServiceError::PermissionDenied("admin only"))
    }
}

/// Issuing codes of either kind is reserved to admins.
pub fn check_create_invite_code(user: &User, kind: InviteCodeType) -> Result<(), BotServiceError> {
    match kind {
        InviteCodeType::Register => check_admin(user)
            .map_err(|_| BotServiceError::PermissionDenied("only admins may create register codes")),
        InviteCodeType::Whitelist => check_admin(user).map_err(|_| {
            BotServiceError::PermissionDenied("only admins may create whitelist codes")
        }),
    }
}

/// Whether `user` may redeem a code of `kind`.
///
/// A register code only helps someone without an account and without a
/// pending grant. A whitelist code needs an account and is pointless twice.
pub fn check_redeem(user: &User, kind: InviteCodeType) -> Result<(), BotServiceError> {
    match kind {
        InviteCodeType::Register => {
            if user.has_account() {
                return Err(BotServiceError::PermissionDenied(
                    "user already has an account",
                ));
            }
            if user.enable_register {
                return Err(BotServiceError::PermissionDenied(
                    "user may already register",
                ));
            }
        }
        InviteCodeType::Whitelist => {
            if !user.has_account() {
                return Err(BotServiceError::PermissionDenied(
                    "whitelist codes need an account",
                ));
            }
            if user.is_whitelist {
                return Err(BotServiceError::PermissionDenied("user is already whitelisted"));
            }
        }
    }
    Ok(())
}

pub fn check_ban(user: &User) -> Result<(), BotServiceError> {
    if !user.has_account() {
        return Err(BotServiceError::NotBound);
    }
    if user.is_banned() {
        return Err(BotServiceError::AlreadyBanned);
    }
    Ok(())
}

pub fn check_unban(user: &User) -> Result<(), BotServiceError> {
    if !user.has_account() {
        return Err(BotServiceError::NotBound);
    }
    if !user.is_banned() {
        return Err(BotServiceError::NotBanned);
    }
    Ok(())
}

/// Optional operator must be an admin.
pub fn check_operator(operator: Option<&User>) -> Result<(), BotServiceError> {
    match operator {
        Some(op) => check_admin(op),
        None => Ok(()),
    }
}
