pub mod account;
pub mod identity;
pub mod invite_code;
pub mod media;
pub mod registration;
pub mod route;
