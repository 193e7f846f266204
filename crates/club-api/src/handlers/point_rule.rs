//! 积分规则 API 处理器
//!
//! 规则的增删改查都是管理员操作。规则从不物理删除，
//! 只通过启用/禁用开关控制是否参与解析。

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use tracing::info;
use validator::Validate;

use points_service::repository::{NewRule, RuleWithCreator, UpdateRule};
use points_service::PointsError;

use crate::auth::Operator;
use crate::dto::{ApiResponse, CreateRuleRequest, SetRuleActiveRequest, UpdateRuleRequest};
use crate::error::Result;
use crate::state::AppState;

/// 创建积分规则
///
/// POST /api/point-rules
pub async fn create_rule(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<CreateRuleRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    operator.ensure_admin()?;
    req.validate()?;

    let rule_id = state
        .rules()
        .create(&NewRule {
            rule_name: req.rule_name.clone(),
            rule_type: req.rule_type,
            action_type: req.action_type.clone(),
            points: req.points,
            exchange_ratio: req.exchange_ratio,
            validity_days: req.validity_days,
            description: req.description,
            is_active: req.is_active,
            created_by: operator.id,
        })
        .await?;

    info!(
        rule_id = rule_id,
        rule_name = %req.rule_name,
        action_type = %req.action_type,
        operator_id = operator.id,
        "积分规则创建成功"
    );

    Ok(Json(ApiResponse::success(json!({ "id": rule_id }))))
}

/// 规则列表（含创建人名称）
///
/// GET /api/point-rules
pub async fn list_rules(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<ApiResponse<Vec<RuleWithCreator>>>> {
    operator.ensure_admin()?;

    let rules = state.rules().list().await?;
    Ok(Json(ApiResponse::success(rules)))
}

/// 规则详情
///
/// GET /api/point-rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RuleWithCreator>>> {
    operator.ensure_admin()?;

    let rule = state
        .rules()
        .find_with_creator(id)
        .await?
        .ok_or(PointsError::RuleNotFound(id))?;

    Ok(Json(ApiResponse::success(rule)))
}

/// 更新规则（全量替换）
///
/// PUT /api/point-rules/{id}
///
/// 历史账本记录只引用规则 ID，额度修改不影响已结算的记录
pub async fn update_rule(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;
    req.validate()?;

    let updated = state
        .rules()
        .update(
            id,
            &UpdateRule {
                rule_name: req.rule_name,
                rule_type: req.rule_type,
                action_type: req.action_type,
                points: req.points,
                exchange_ratio: req.exchange_ratio,
                validity_days: req.validity_days,
                description: req.description,
                is_active: req.is_active,
            },
        )
        .await?;

    if !updated {
        return Err(PointsError::RuleNotFound(id).into());
    }

    info!(rule_id = id, operator_id = operator.id, "积分规则更新成功");

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 启用/禁用规则
///
/// PATCH /api/point-rules/{id}/active
pub async fn set_rule_active(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<i64>,
    Json(req): Json<SetRuleActiveRequest>,
) -> Result<Json<ApiResponse<()>>> {
    operator.ensure_admin()?;

    let updated = state.rules().set_active(id, req.is_active).await?;
    if !updated {
        return Err(PointsError::RuleNotFound(id).into());
    }

    info!(
        rule_id = id,
        is_active = req.is_active,
        operator_id = operator.id,
        "积分规则状态更新成功"
    );

    Ok(Json(ApiResponse::<()>::success_empty()))
}
