//! 统计周期分桶策略
//!
//! 日/周/月分桶建模为封闭枚举，每个变体绑定自己的分组键和展示格式，
//! 查询层只在固定字符串之间选择，不做任何用户输入的 SQL 拼接。

use serde::{Deserialize, Serialize};

/// 统计周期
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Day,
    Week,
    #[default]
    Month,
}

impl StatsPeriod {
    /// 分组键：对 created_at 做日历截断的 SQL 表达式
    pub fn bucket_expr(&self) -> &'static str {
        match self {
            Self::Day => "date_trunc('day', created_at)",
            Self::Week => "date_trunc('week', created_at)",
            Self::Month => "date_trunc('month', created_at)",
        }
    }

    /// 桶标签的 TO_CHAR 格式
    ///
    /// 周使用 ISO 周格式（IYYY-"W"IW -> 2025-W07），与按周截断的分组键一致
    pub fn label_format(&self) -> &'static str {
        match self {
            Self::Day => "YYYY-MM-DD",
            Self::Week => "IYYY-\"W\"IW",
            Self::Month => "YYYY-MM",
        }
    }
}

/// 统计分桶结果
///
/// 一个时间桶内某一方向（earn/consume）的积分总量与笔数
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatsBucket {
    pub time_period: String,
    pub total_points: i64,
    pub transaction_count: i64,
}
