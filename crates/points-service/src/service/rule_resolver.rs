//! 规则解析器
//!
//! 把"发生了某类行为"翻译成"适用哪条积分规则"。
//! 两条解析路径：
//!
//! - 按行为类型解析：自动结算使用，取该行为下最新创建的激活规则
//! - 按规则 ID 解析：手动操作使用，管理员明确指定规则

use sqlx::PgPool;
use tracing::debug;

use crate::error::{PointsError, Result};
use crate::models::PointRule;
use crate::repository::RuleRepository;

/// 活动完成结算对应的行为类型
pub const ACTION_ACTIVITY_PARTICIPATION: &str = "activity_participation";

/// 规则解析器
pub struct RuleResolver {
    rule_repo: RuleRepository,
}

impl RuleResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rule_repo: RuleRepository::new(pool),
        }
    }

    /// 按行为类型解析规则
    ///
    /// 同一行为类型允许存在多条激活规则，最新创建的一条生效，
    /// 禁用的规则永不返回。无可用规则映射为 NoActiveRuleForAction。
    pub async fn resolve_by_action_type(&self, action_type: &str) -> Result<PointRule> {
        let rule = self
            .rule_repo
            .latest_active_by_action(action_type)
            .await?
            .ok_or_else(|| PointsError::NoActiveRuleForAction(action_type.to_string()))?;

        debug!(
            action_type = %action_type,
            rule_id = rule.id,
            points = rule.points,
            "规则解析成功"
        );

        Ok(rule)
    }

    /// 按规则 ID 解析规则
    ///
    /// 手动路径允许指定任意存在的规则，但禁用的规则不可应用
    pub async fn resolve_by_id(&self, rule_id: i64) -> Result<PointRule> {
        let rule = self
            .rule_repo
            .find_by_id(rule_id)
            .await?
            .ok_or(PointsError::RuleNotFound(rule_id))?;

        rule.assert_active()?;

        Ok(rule)
    }
}
