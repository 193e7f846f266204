//! 用户 API 处理器
//!
//! 注册、登录和用户查询。

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use tracing::info;
use validator::Validate;

use points_service::{PointsError, User};

use crate::auth::Operator;
use crate::dto::{ApiResponse, LoginRequest, RegisterRequest, UserListQuery};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 注册用户
///
/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    req.validate()?;

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;
    let user_id = state
        .users()
        .create(&req.username, &req.email, &password_hash)
        .await?;

    info!(user_id = user_id, username = %req.username, "用户注册成功");

    Ok(Json(ApiResponse::success(json!({ "id": user_id }))))
}

/// 登录
///
/// POST /api/users/login
///
/// 校验密码后返回用户信息；会话管理由网关层负责
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>> {
    req.validate()?;

    let user = state
        .users()
        .find_by_username(&req.username)
        .await?
        .ok_or(ApiError::Points(PointsError::InvalidCredentials))?;

    if !bcrypt::verify(&req.password, &user.password_hash)? {
        return Err(ApiError::Points(PointsError::InvalidCredentials));
    }

    info!(user_id = user.id, "用户登录成功");

    Ok(Json(ApiResponse::success(user)))
}

/// 查询用户详情（含当前积分余额）
///
/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .users()
        .find_by_id(id)
        .await?
        .ok_or(PointsError::UserNotFound(id))?;

    Ok(Json(ApiResponse::success(user)))
}

/// 用户列表（管理员）
///
/// GET /api/users?search=&page=&pageSize=
pub async fn list_users(
    State(state): State<AppState>,
    operator: Operator,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    operator.ensure_admin()?;

    let (_, page_size, offset) = query.pagination().normalize();
    let users = state
        .users()
        .list(query.search.as_deref(), page_size, offset)
        .await?;

    Ok(Json(ApiResponse::success(users)))
}
