//! 积分规则实体定义

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RuleType;
use crate::error::{PointsError, Result};

/// 积分规则
///
/// 描述一类积分变动的策略：方向、额度、有效期。
/// 规则从不删除，只通过 `is_active` 软禁用，因为历史账本记录引用它。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointRule {
    pub id: i64,
    pub rule_name: String,
    pub rule_type: RuleType,
    /// 行为类别，如 `activity_participation`，自动结算按它解析规则
    pub action_type: String,
    /// 积分额度（正整数，方向由 rule_type 决定）
    pub points: i64,
    /// 预留给后续兑换定价
    pub exchange_ratio: Option<f64>,
    /// 积分有效天数，None 表示永不过期
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PointRule {
    /// 校验规则处于激活状态
    ///
    /// 按 ID 查询不过滤 is_active（管理端需要看到禁用规则），
    /// 所以结算前必须显式调用此检查。
    pub fn assert_active(&self) -> Result<()> {
        if !self.is_active {
            return Err(PointsError::RuleInactive(self.id));
        }
        Ok(())
    }

    /// 计算从 now 起算的积分过期时间
    ///
    /// validity_days 为 None 时永不过期
    pub fn expire_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.validity_days
            .map(|days| now + Duration::days(days as i64))
    }
}
