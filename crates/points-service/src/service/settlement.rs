//! 账本结算引擎
//!
//! `point_transactions` 和 `users.total_points` 的唯一写入方。
//! 任何积分变动都在单个数据库事务内同时完成账本追加和余额更新，
//! 保证"余额 == 账本带符号求和"在每次提交后成立。
//!
//! ## 活动完成结算流程
//!
//! 1. 锁定活动行 -> 2. 校验状态机（published -> completed）
//!    -> 3. 标记完成 -> 4. 收集满足出勤条件的参与者
//!    -> 5. 逐人写账本并加余额 -> 6. 提交
//!
//! ## 手动结算流程
//!
//! 1. 锁定用户余额行 -> 2. consume 方向校验余额充足
//!    -> 3. 写账本 -> 4. 调余额 -> 5. 提交

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{PointsError, Result};
use crate::models::{ActivityStatus, NewTransaction, PointRule, TransactionType};
use crate::repository::{ActivityRepository, LedgerRepository, UserRepository};

/// 活动完成结算结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub activity_id: i64,
    /// 获得积分的参与者人数（可以为 0，活动照常完成）
    pub participants_count: i64,
    /// 本次结算发放的积分总量（人数 × 规则额度）
    pub points_awarded: i64,
}

/// 手动结算参数
#[derive(Debug, Clone)]
pub struct ManualSettlement {
    pub user_id: i64,
    /// 覆盖规则默认额度；None 时使用 rule.points
    pub points_override: Option<i64>,
    pub description: Option<String>,
    pub operator_id: i64,
}

/// 手动结算结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub transaction_id: i64,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub new_balance: i64,
}

/// 账本结算引擎
#[derive(Clone)]
pub struct SettlementEngine {
    pool: PgPool,
}

impl SettlementEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 活动完成批量结算
    ///
    /// 全有或全无：状态流转、每位参与者的账本记录和余额更新
    /// 在同一事务内提交，任一步失败则整体回滚，活动保持 published。
    /// 没有合格参与者时活动照常进入 completed，不写任何账本记录。
    #[instrument(skip(self, rule), fields(rule_id = rule.id))]
    pub async fn settle_activity_completion(
        &self,
        activity_id: i64,
        rule: &PointRule,
        operator_id: i64,
    ) -> Result<CompletionSummary> {
        rule.assert_active()?;

        let mut tx = self.pool.begin().await?;

        // 1. 锁定活动行并校验状态机
        let activity = ActivityRepository::find_for_update(&mut tx, activity_id).await?;
        if !activity.status.can_transition_to(ActivityStatus::Completed) {
            return Err(PointsError::InvalidStatusTransition {
                from: activity.status.as_str().to_string(),
                to: ActivityStatus::Completed.as_str().to_string(),
            });
        }

        // 2. 标记完成（WHERE status = 'published' 双重守护）
        if !ActivityRepository::mark_completed_in_tx(&mut tx, activity_id).await? {
            return Err(PointsError::InvalidStatusTransition {
                from: activity.status.as_str().to_string(),
                to: ActivityStatus::Completed.as_str().to_string(),
            });
        }

        // 3. 收集合格参与者：报名通过且签到、签退均非空
        let participants = ActivityRepository::eligible_participants(&mut tx, activity_id).await?;

        // 4. 批次内共享同一过期时间
        let expire_at = rule.expire_from(Utc::now());

        for &user_id in &participants {
            // 完成结算只发放：账本方向固定为 earn，与余额增量保持同号，
            // 不随规则的 rule_type 漂移
            let entry = NewTransaction {
                user_id,
                rule_id: rule.id,
                points: rule.points,
                transaction_type: TransactionType::Earn,
                reference_id: Some(activity_id),
                reference_type: Some("activity".to_string()),
                description: Some(format!("参与活动「{}」", activity.title)),
                operator_id: Some(operator_id),
                expire_at,
            };
            LedgerRepository::insert_in_tx(&mut tx, &entry).await?;
            UserRepository::adjust_balance_in_tx(&mut tx, user_id, rule.points).await?;
        }

        tx.commit().await?;

        info!(
            activity_id = activity_id,
            participants = participants.len(),
            points = rule.points,
            operator_id = operator_id,
            "活动完成结算成功"
        );

        Ok(CompletionSummary {
            activity_id,
            participants_count: participants.len() as i64,
            points_awarded: rule.points * participants.len() as i64,
        })
    }

    /// 手动发放/扣除结算
    ///
    /// 方向由规则的 rule_type 决定；扣除方向在锁定余额后校验充足性，
    /// 不足则回滚并返回 InsufficientPoints，余额不会变为负数。
    #[instrument(skip(self, rule, settlement), fields(user_id = settlement.user_id, rule_id = rule.id))]
    pub async fn settle_manual(
        &self,
        rule: &PointRule,
        settlement: &ManualSettlement,
    ) -> Result<SettlementOutcome> {
        rule.assert_active()?;

        let points = settlement.points_override.unwrap_or(rule.points);
        if points <= 0 {
            return Err(PointsError::Validation("积分数量必须为正整数".to_string()));
        }

        let transaction_type = TransactionType::from(rule.rule_type);

        let mut tx = self.pool.begin().await?;

        // 带行锁读取余额，同一用户的并发结算在此串行化
        let balance = UserRepository::balance_for_update(&mut tx, settlement.user_id).await?;

        if transaction_type == TransactionType::Consume && balance < points {
            return Err(PointsError::InsufficientPoints {
                required: points,
                available: balance,
            });
        }

        let entry = NewTransaction {
            user_id: settlement.user_id,
            rule_id: rule.id,
            points,
            transaction_type,
            reference_id: None,
            reference_type: Some("manual".to_string()),
            description: settlement.description.clone(),
            operator_id: Some(settlement.operator_id),
            expire_at: rule.expire_from(Utc::now()),
        };
        let transaction_id = LedgerRepository::insert_in_tx(&mut tx, &entry).await?;

        let delta = points * transaction_type.sign();
        UserRepository::adjust_balance_in_tx(&mut tx, settlement.user_id, delta).await?;

        tx.commit().await?;

        let new_balance = balance + delta;

        info!(
            user_id = settlement.user_id,
            rule_id = rule.id,
            points = points,
            transaction_type = ?transaction_type,
            new_balance = new_balance,
            operator_id = settlement.operator_id,
            "手动结算成功"
        );

        Ok(SettlementOutcome {
            transaction_id,
            points,
            transaction_type,
            new_balance,
        })
    }
}
