//! HTTP 请求处理器

pub mod activity;
pub mod point_rule;
pub mod points;
pub mod registration;
pub mod user;
