//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// 用户
///
/// `total_points` 是该用户账本的物化汇总，仅由结算引擎在事务内更新，
/// 任何时刻都可与账本求和对账。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt 哈希，不对外序列化
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

/// 排行榜条目
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    pub username: String,
    pub total_points: i64,
}
