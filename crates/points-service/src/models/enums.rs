//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化，
//! 数据库侧统一存储为小写 varchar。

use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum Role {
    /// 普通用户 - 报名活动、查看积分
    #[default]
    User,
    /// 管理员 - 管理活动、规则，手动发放/扣除积分
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// 规则方向
///
/// 决定规则应用时积分是增加还是减少
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RuleType {
    /// 获得积分（+）
    #[default]
    Earn,
    /// 消耗积分（-）
    Consume,
}

/// 账本变动类型
///
/// 写入账本时从规则的 rule_type 拷贝，保证历史记录不随规则修改漂移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum TransactionType {
    /// 获得（+）
    Earn,
    /// 消耗（-）
    Consume,
}

impl TransactionType {
    /// 返回该变动类型的数量符号
    ///
    /// 余额对账时 total_points == sum(points * sign)
    pub fn sign(&self) -> i64 {
        match self {
            Self::Earn => 1,
            Self::Consume => -1,
        }
    }
}

impl From<RuleType> for TransactionType {
    fn from(rule_type: RuleType) -> Self {
        match rule_type {
            RuleType::Earn => Self::Earn,
            RuleType::Consume => Self::Consume,
        }
    }
}

/// 活动状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ActivityStatus {
    /// 草稿 - 配置中，仅管理员可见
    #[default]
    Draft,
    /// 已发布 - 对用户开放报名
    Published,
    /// 已取消
    Cancelled,
    /// 已完成 - 完成结算后的终态
    Completed,
}

impl ActivityStatus {
    /// 数据库/日志中使用的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// 状态机：校验是否允许从当前状态迁移到目标状态
    ///
    /// Completed 和 Cancelled 是终态；完成结算只能由 Published 进入
    pub fn can_transition_to(&self, next: ActivityStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Published)
                | (Self::Draft, Self::Cancelled)
                | (Self::Published, Self::Cancelled)
                | (Self::Published, Self::Completed)
        )
    }
}

/// 报名状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// 待审核
    #[default]
    Pending,
    /// 审核通过 - 可签到
    Approved,
    /// 已拒绝
    Rejected,
}
