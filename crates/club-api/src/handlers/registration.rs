//! 报名 API 处理器
//!
//! 报名、审核和签到/签退。签到和签退构成出勤记录，
//! 活动完成结算只认"审核通过 + 签到 + 签退"齐全的报名。

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use tracing::info;

use points_service::repository::RegistrationRow;
use points_service::{ActivityStatus, PointsError, RegistrationStatus};

use crate::auth::Operator;
use crate::dto::{ApiResponse, ReviewRegistrationRequest};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 报名活动
///
/// POST /api/activities/{id}/registrations
///
/// 操作人以自己的身份报名；只有已发布的活动接受报名，
/// 设置了人数上限的活动报满后拒绝。
pub async fn register_for_activity(
    State(state): State<AppState>,
    operator: Operator,
    Path(activity_id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let activity = state
        .activities()
        .find_by_id(activity_id)
        .await?
        .ok_or(PointsError::ActivityNotFound(activity_id))?;

    if activity.status != ActivityStatus::Published {
        return Err(ApiError::Validation("活动未开放报名".to_string()));
    }

    if let Some(max) = activity.max_participants {
        let current = state.registrations().count_active(activity_id).await?;
        if current >= max as i64 {
            return Err(PointsError::ActivityFull(activity_id).into());
        }
    }

    let registration_id = state
        .registrations()
        .create(activity_id, operator.id)
        .await?;

    info!(
        registration_id = registration_id,
        activity_id = activity_id,
        user_id = operator.id,
        "活动报名成功"
    );

    Ok(Json(ApiResponse::success(json!({ "id": registration_id }))))
}

/// 活动报名列表（管理员）
///
/// GET /api/activities/{id}/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    operator: Operator,
    Path(activity_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<RegistrationRow>>>> {
    operator.ensure_admin()?;

    let rows = state.registrations().list_by_activity(activity_id).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// 审核报名（管理员）
///
/// PATCH /api/registrations/{id}/review
pub async fn review_registration(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRegistrationRequest>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;

    if req.status == RegistrationStatus::Pending {
        return Err(ApiError::Validation(
            "审核结果只能是 approved 或 rejected".to_string(),
        ));
    }

    state.registrations().update_status(id, req.status).await?;

    info!(
        registration_id = id,
        status = ?req.status,
        operator_id = operator.id,
        "报名审核完成"
    );

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 签到（管理员代为录入）
///
/// POST /api/registrations/{id}/check-in
pub async fn check_in(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;

    // 先确认报名存在，把"不存在"和"状态不允许"区分开
    state
        .registrations()
        .find_by_id(id)
        .await?
        .ok_or(PointsError::RegistrationNotFound(id))?;

    state.registrations().check_in(id).await?;

    info!(registration_id = id, operator_id = operator.id, "签到成功");

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 签退（管理员代为录入）
///
/// POST /api/registrations/{id}/check-out
pub async fn check_out(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;

    state
        .registrations()
        .find_by_id(id)
        .await?
        .ok_or(PointsError::RegistrationNotFound(id))?;

    state.registrations().check_out(id).await?;

    info!(registration_id = id, operator_id = operator.id, "签退成功");

    Ok(Json(ApiResponse::<()>::success_empty()))
}
