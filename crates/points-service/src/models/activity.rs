//! 活动与报名实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ActivityStatus, RegistrationStatus};

/// 社团活动
///
/// 对结算引擎而言只是状态机加一组满足出勤条件的参与者；
/// 活动本身的排期、搜索不在本服务范围内。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[sqlx(default)]
    pub location: Option<String>,
    #[sqlx(default)]
    pub max_participants: Option<i32>,
    #[sqlx(default)]
    pub club_id: Option<i64>,
    pub status: ActivityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 活动报名
///
/// 出勤完成判定：status = approved 且签到、签退时间均非空，
/// 满足该条件的用户才有活动完成结算资格。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub status: RegistrationStatus,
    #[sqlx(default)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
