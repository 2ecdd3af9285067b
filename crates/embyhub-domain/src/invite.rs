//! Invite code kinds and code-string format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What an invite code grants when redeemed.
///
/// Wire format: `"register"` / `"whitelist"`. Each kind owns a fixed code prefix
/// so the kind can be recognised from the code string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteCodeType {
    /// Grants one-time permission to create a media-server account.
    Register,
    /// Puts the redeemer on the whitelist.
    Whitelist,
}

impl InviteCodeType {
    pub const REGISTER_PREFIX: &'static str = "epr";
    pub const WHITELIST_PREFIX: &'static str = "epw";

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Register => Self::REGISTER_PREFIX,
            Self::Whitelist => Self::WHITELIST_PREFIX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Whitelist => "whitelist",
        }
    }

    /// Build a full code string from a random token body.
    pub fn format_code(self, token: &str) -> String {
        format!("{}-{}", self.prefix(), token)
    }
}

impl fmt::Display for InviteCodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown invite code type: {0}")]
pub struct UnknownCodeType(pub String);

impl FromStr for InviteCodeType {
    type Err = UnknownCodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(Self::Register),
            "whitelist" => Ok(Self::Whitelist),
            other => Err(UnknownCodeType(other.to_owned())),
        }
    }
}

/// Check a code string against `^(epr|epw)-[A-Za-z0-9]+$`.
///
/// Returns the kind implied by the prefix. The stored record's own kind stays
/// authoritative; this is only a cheap pre-lookup filter.
pub fn parse_code_format(code: &str) -> Option<InviteCodeType> {
    let (prefix, body) = code.split_once('-')?;
    let kind = match prefix {
        InviteCodeType::REGISTER_PREFIX => InviteCodeType::Register,
        InviteCodeType::WHITELIST_PREFIX => InviteCodeType::Whitelist,
        _ => return None,
    };
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(kind)
}
