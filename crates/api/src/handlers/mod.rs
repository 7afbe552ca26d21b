pub mod auth;
pub mod autologin;
pub mod users;
