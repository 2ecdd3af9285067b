pub mod invite_codes;
pub mod registration_config;
pub mod users;
