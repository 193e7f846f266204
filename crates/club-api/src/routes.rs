//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::{handlers, state::AppState};

/// 用户相关路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(handlers::user::register))
        .route("/users/login", post(handlers::user::login))
        .route("/users", get(handlers::user::list_users))
        .route("/users/{id}", get(handlers::user::get_user))
}

/// 积分规则管理路由（管理员）
fn rule_routes() -> Router<AppState> {
    Router::new()
        .route("/point-rules", post(handlers::point_rule::create_rule))
        .route("/point-rules", get(handlers::point_rule::list_rules))
        .route("/point-rules/{id}", get(handlers::point_rule::get_rule))
        .route("/point-rules/{id}", put(handlers::point_rule::update_rule))
        .route(
            "/point-rules/{id}/active",
            patch(handlers::point_rule::set_rule_active),
        )
}

/// 活动与报名路由
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/activities", post(handlers::activity::create_activity))
        .route("/activities", get(handlers::activity::list_activities))
        .route("/activities/{id}", get(handlers::activity::get_activity))
        .route(
            "/activities/{id}/status",
            patch(handlers::activity::update_activity_status),
        )
        .route(
            "/activities/{id}/complete",
            post(handlers::activity::complete_activity),
        )
        .route(
            "/activities/{id}/registrations",
            post(handlers::registration::register_for_activity),
        )
        .route(
            "/activities/{id}/registrations",
            get(handlers::registration::list_registrations),
        )
        .route(
            "/registrations/{id}/review",
            patch(handlers::registration::review_registration),
        )
        .route(
            "/registrations/{id}/check-in",
            post(handlers::registration::check_in),
        )
        .route(
            "/registrations/{id}/check-out",
            post(handlers::registration::check_out),
        )
}

/// 积分账本、统计与排行榜路由
fn points_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/points/user/{userId}",
            get(handlers::points::list_user_transactions),
        )
        .route("/points/stats", get(handlers::points::user_stats))
        .route("/points/leaderboard", get(handlers::points::leaderboard))
        .route("/points/award", post(handlers::points::manual_settle))
}

/// 聚合所有 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(rule_routes())
        .merge(activity_routes())
        .merge(points_routes())
}
