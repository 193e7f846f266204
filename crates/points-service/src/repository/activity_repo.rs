//! 活动仓储

use sqlx::{PgConnection, PgPool, Row};

use crate::error::{PointsError, Result};
use crate::models::{Activity, ActivityStatus};

const ACTIVITY_COLUMNS: &str = "id, title, description, start_time, end_time, \
     location, max_participants, club_id, status, created_at, updated_at";

/// 创建活动的参数
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub title: String,
    pub description: Option<String>,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    pub club_id: Option<i64>,
}

/// 活动仓储
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建活动，初始状态为 draft
    pub async fn create(&self, activity: &NewActivity) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO activities
                (title, description, start_time, end_time, location,
                 max_participants, club_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft')
            RETURNING id
            "#,
        )
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(&activity.location)
        .bind(activity.max_participants)
        .bind(activity.club_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(activity)
    }

    /// 活动列表，可按状态过滤，按开始时间倒序
    pub async fn list(&self, status: Option<ActivityStatus>) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS} FROM activities
            WHERE $1::varchar IS NULL OR status = $1
            ORDER BY start_time DESC, id DESC
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    /// 状态流转（草稿发布、取消等非结算路径）
    ///
    /// 调用方需先用 can_transition_to 校验；这里再用 WHERE 条件
    /// 守护当前状态，避免并发下跳过状态机。
    pub async fn update_status(
        &self,
        id: i64,
        from: ActivityStatus,
        to: ActivityStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::InvalidStatusTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        Ok(())
    }

    /// 在事务中带行锁读取活动
    ///
    /// 完成结算以活动行锁为串行化点，
    /// 并发的两次完成请求只有先到者能看到 published 状态。
    pub async fn find_for_update(tx: &mut PgConnection, id: i64) -> Result<Activity> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?
        .ok_or(PointsError::ActivityNotFound(id))?;

        Ok(activity)
    }

    /// 在结算事务中把活动标记为 completed
    ///
    /// WHERE status = 'published' 保证重复结算在数据库层面失败，
    /// 返回是否实际完成了流转。
    pub async fn mark_completed_in_tx(tx: &mut PgConnection, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'published'
            "#,
        )
        .bind(id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 满足出勤条件的参与者 ID 列表
    ///
    /// 条件：报名已通过且签到、签退时间均非空
    pub async fn eligible_participants(tx: &mut PgConnection, activity_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id
            FROM registrations
            WHERE activity_id = $1
              AND status = 'approved'
              AND check_in_time IS NOT NULL
              AND check_out_time IS NOT NULL
            ORDER BY user_id ASC
            "#,
        )
        .bind(activity_id)
        .fetch_all(tx)
        .await?;

        Ok(rows.iter().map(|r| r.get("user_id")).collect())
    }
}
