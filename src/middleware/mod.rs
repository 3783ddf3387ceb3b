pub mod auth;
pub mod permissions;
pub mod rate_limit;
