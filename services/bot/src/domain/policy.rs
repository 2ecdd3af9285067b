//! Registration policy: may this user create a media-server account right now?

use crate::domain::types::{RegistrationConfig, User};

/// Why a user was allowed to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSource {
    /// The user redeemed a register code (or an admin granted it).
    Explicit,
    /// Remaining open-registration quota was positive.
    PublicQuota,
    /// The open-registration deadline has not passed yet.
    PublicWindow,
}

/// Outcome of one policy evaluation. Always computed fresh from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationDecision {
    pub grant: Option<GrantSource>,
    /// The caller should spend one unit of public quota when creating.
    ///
    /// True whenever the user lacks an explicit grant and the observed quota
    /// is positive, even if the window alone would also have admitted them.
    pub consume_quota: bool,
    /// The time window is open, independently of quota.
    pub window_open: bool,
    /// The deadline has passed and should be reset to 0.
    pub clear_deadline: bool,
}

impl RegistrationDecision {
    pub fn allowed(&self) -> bool {
        self.grant.is_some()
    }
}

pub fn evaluate(user: &User, config: &RegistrationConfig, now: i64) -> RegistrationDecision {
    let window_open = config.window_open(now);
    let grant = if user.enable_register {
        Some(GrantSource::Explicit)
    } else if config.register_public_user > 0 {
        Some(GrantSource::PublicQuota)
    } else if window_open {
        Some(GrantSource::PublicWindow)
    } else {
        None
    };

    RegistrationDecision {
        grant,
        consume_quota: !user.enable_register && config.register_public_user > 0,
        window_open,
        clear_deadline: config.deadline_expired(now),
    }
}
