//! 积分 API 处理器
//!
//! 账本查询、统计、排行榜和手动发放/扣除。所有写入都经由结算引擎，
//! 本模块不直接操作 point_transactions。

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::info;
use validator::Validate;

use points_service::repository::{LedgerEntry, LedgerFilter};
use points_service::service::{ManualSettlement, SettlementOutcome};
use points_service::{LeaderboardEntry, PointsError, TransactionType};

use crate::auth::Operator;
use crate::dto::{
    ApiResponse, LeaderboardQuery, LedgerQuery, ManualPointsRequest, PageResponse, StatsQuery,
    UserStatsResponse,
};
use crate::error::Result;
use crate::state::AppState;

/// 用户账本记录
///
/// GET /api/points/user/{userId}?startDate=&endDate=&transactionType=
pub async fn list_user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>> {
    // 确认用户存在，避免空列表掩盖错误的用户 ID
    state
        .users()
        .find_by_id(user_id)
        .await?
        .ok_or(PointsError::UserNotFound(user_id))?;

    let entries = state
        .ledger()
        .list_by_user(
            user_id,
            &LedgerFilter {
                start_date: query.start_date,
                end_date: query.end_date,
                transaction_type: query.transaction_type,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// 用户积分统计
///
/// GET /api/points/stats?userId=&period=
///
/// 按日/周/月分桶聚合，同时返回获得与消耗两条序列
pub async fn user_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<UserStatsResponse>>> {
    state
        .users()
        .find_by_id(query.user_id)
        .await?
        .ok_or(PointsError::UserNotFound(query.user_id))?;

    let ledger = state.ledger();
    let earn_stats = ledger
        .stats_series(query.user_id, query.period, TransactionType::Earn)
        .await?;
    let consume_stats = ledger
        .stats_series(query.user_id, query.period, TransactionType::Consume)
        .await?;

    Ok(Json(ApiResponse::success(UserStatsResponse {
        period: query.period,
        earn_stats,
        consume_stats,
    })))
}

/// 积分排行榜
///
/// GET /api/points/leaderboard?limit=&offset=
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<PageResponse<LeaderboardEntry>>>> {
    let (limit, offset) = query.normalize();
    let (entries, total) = state.users().leaderboard(limit, offset).await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        entries, total, limit, offset,
    ))))
}

/// 手动发放/扣除积分（管理员）
///
/// POST /api/points/award
///
/// 方向由所选规则的 rule_type 决定；扣除在余额不足时被拒绝
pub async fn manual_settle(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<ManualPointsRequest>,
) -> Result<Json<ApiResponse<SettlementOutcome>>> {
    operator.ensure_admin()?;
    req.validate()?;

    // 目标用户必须存在，结算引擎锁余额时才会再查一次
    state
        .users()
        .find_by_id(req.user_id)
        .await?
        .ok_or(PointsError::UserNotFound(req.user_id))?;

    let rule = state.resolver().resolve_by_id(req.rule_id).await?;

    let outcome = state
        .settlement
        .settle_manual(
            &rule,
            &ManualSettlement {
                user_id: req.user_id,
                points_override: req.points,
                description: req.description,
                operator_id: operator.id,
            },
        )
        .await?;

    info!(
        user_id = req.user_id,
        rule_id = req.rule_id,
        points = outcome.points,
        operator_id = operator.id,
        "手动积分操作成功"
    );

    Ok(Json(ApiResponse::success(outcome)))
}
