pub mod db;
pub mod emby;
pub mod router_api;
