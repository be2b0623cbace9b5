pub mod auth;
pub mod employees;
pub mod logs;
pub mod teams;
pub mod users;
