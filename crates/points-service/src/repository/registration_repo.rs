//! 报名仓储

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::error::{PointsError, Result};
use crate::models::{Registration, RegistrationStatus};

/// 报名记录投影（关联用户名，供管理端列表展示）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRow {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub username: String,
    pub status: RegistrationStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 报名仓储
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 报名活动
    ///
    /// (activity_id, user_id) 的唯一冲突映射为 AlreadyRegistered；
    /// 容量检查在 INSERT 前完成，活动报名本身不是高并发热点。
    pub async fn create(&self, activity_id: i64, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO registrations (activity_id, user_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id
            "#,
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PointsError::AlreadyRegistered(activity_id)
            }
            _ => PointsError::Database(e),
        })?;

        Ok(row.get("id"))
    }

    /// 活动当前有效报名数（pending + approved）
    pub async fn count_active(&self, activity_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM registrations
            WHERE activity_id = $1 AND status IN ('pending', 'approved')
            "#,
        )
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("cnt"))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, activity_id, user_id, status, check_in_time, check_out_time, created_at
            FROM registrations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// 活动报名列表（带用户名）
    pub async fn list_by_activity(&self, activity_id: i64) -> Result<Vec<RegistrationRow>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT r.id, r.activity_id, r.user_id, u.username,
                   r.status, r.check_in_time, r.check_out_time, r.created_at
            FROM registrations r
            JOIN users u ON r.user_id = u.id
            WHERE r.activity_id = $1
            ORDER BY r.created_at ASC, r.id ASC
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 审核报名（通过/拒绝）
    pub async fn update_status(&self, id: i64, status: RegistrationStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::RegistrationNotFound(id));
        }

        Ok(())
    }

    /// 签到
    ///
    /// 只有审核通过的报名允许签到；重复签到保留首次时间
    pub async fn check_in(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET check_in_time = NOW()
            WHERE id = $1 AND status = 'approved' AND check_in_time IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::AttendanceNotAllowed(
                "报名未通过审核或已签到".to_string(),
            ));
        }

        Ok(())
    }

    /// 签退
    ///
    /// 必须已签到；重复签退保留首次时间
    pub async fn check_out(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET check_out_time = NOW()
            WHERE id = $1 AND check_in_time IS NOT NULL AND check_out_time IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::AttendanceNotAllowed(
                "尚未签到或已签退".to_string(),
            ));
        }

        Ok(())
    }
}
