//! 活动 API 处理器
//!
//! 活动的创建、状态流转和完成结算。完成结算是本服务的核心写路径：
//! 解析当前活动参与规则后交给结算引擎，在单个事务内完成
//! 状态流转和全体合格参与者的积分发放。

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use tracing::info;
use validator::Validate;

use points_service::repository::NewActivity;
use points_service::service::{ACTION_ACTIVITY_PARTICIPATION, CompletionSummary};
use points_service::{Activity, PointsError};

use crate::auth::Operator;
use crate::dto::{ActivityListQuery, ApiResponse, CreateActivityRequest, UpdateActivityStatusRequest};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 创建活动
///
/// POST /api/activities
pub async fn create_activity(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<CreateActivityRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    operator.ensure_admin()?;
    req.validate()?;

    if req.end_time <= req.start_time {
        return Err(ApiError::Validation(
            "活动结束时间必须晚于开始时间".to_string(),
        ));
    }

    let activity_id = state
        .activities()
        .create(&NewActivity {
            title: req.title.clone(),
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            max_participants: req.max_participants,
            club_id: req.club_id,
        })
        .await?;

    info!(
        activity_id = activity_id,
        title = %req.title,
        operator_id = operator.id,
        "活动创建成功"
    );

    Ok(Json(ApiResponse::success(json!({ "id": activity_id }))))
}

/// 活动列表
///
/// GET /api/activities?status=
///
/// 管理员可按任意状态过滤；普通用户和匿名访问只能看到已发布的活动
pub async fn list_activities(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<ActivityListQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>> {
    let is_admin = crate::auth::optional_operator(&state, &headers)
        .await?
        .is_some_and(|op| op.role.is_admin());

    let status = if is_admin {
        query.status
    } else {
        Some(points_service::ActivityStatus::Published)
    };

    let activities = state.activities().list(status).await?;
    Ok(Json(ApiResponse::success(activities)))
}

/// 活动详情
///
/// GET /api/activities/{id}
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Activity>>> {
    let activity = state
        .activities()
        .find_by_id(id)
        .await?
        .ok_or(PointsError::ActivityNotFound(id))?;

    Ok(Json(ApiResponse::success(activity)))
}

/// 活动状态流转（发布/取消）
///
/// PATCH /api/activities/{id}/status
///
/// 完成状态不走此接口，必须通过 complete 端点触发结算
pub async fn update_activity_status(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
    Json(req): Json<UpdateActivityStatusRequest>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;

    if req.status == points_service::ActivityStatus::Completed {
        return Err(ApiError::Validation(
            "完成活动请使用 complete 接口触发积分结算".to_string(),
        ));
    }

    let activity = state
        .activities()
        .find_by_id(id)
        .await?
        .ok_or(PointsError::ActivityNotFound(id))?;

    if !activity.status.can_transition_to(req.status) {
        return Err(PointsError::InvalidStatusTransition {
            from: activity.status.as_str().to_string(),
            to: req.status.as_str().to_string(),
        }
        .into());
    }

    state
        .activities()
        .update_status(id, activity.status, req.status)
        .await?;

    info!(
        activity_id = id,
        status = req.status.as_str(),
        operator_id = operator.id,
        "活动状态更新成功"
    );

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 完成活动并批量结算积分
///
/// POST /api/activities/{id}/complete
///
/// 按 activity_participation 行为类型解析最新激活规则，
/// 规则缺失时直接失败，活动保持 published。
pub async fn complete_activity(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompletionSummary>>> {
    operator.ensure_admin()?;

    let rule = state
        .resolver()
        .resolve_by_action_type(ACTION_ACTIVITY_PARTICIPATION)
        .await?;

    let summary = state
        .settlement
        .settle_activity_completion(id, &rule, operator.id)
        .await?;

    Ok(Json(ApiResponse::success(summary)))
}
