//! 用户仓储
//!
//! 普通读写走连接池；余额的事务性读写提供 `*_in_tx` 关联函数，
//! 由结算引擎在事务内调用。余额不做任何进程内缓存，
//! 每次读取都反映最新已提交值。

use sqlx::{PgConnection, PgPool, Row};

use crate::error::{PointsError, Result};
use crate::models::{LeaderboardEntry, User};

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户，返回新用户 ID
    ///
    /// username/email 的唯一冲突映射为 UserAlreadyExists
    pub async fn create(&self, username: &str, email: &str, password_hash: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, total_points)
            VALUES ($1, $2, $3, 'user', 0)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => PointsError::UserAlreadyExists,
            _ => PointsError::Database(e),
        })?;

        Ok(row.get("id"))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, total_points, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, total_points, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 用户列表，支持用户名/邮箱模糊搜索
    pub async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<User>> {
        let pattern = search.map(|s| format!("%{}%", s));

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, total_points, created_at
            FROM users
            WHERE $1::text IS NULL OR username LIKE $1 OR email LIKE $1
            ORDER BY username ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// 积分排行榜
    ///
    /// 按 total_points 降序，返回 (条目列表, 用户总数)
    pub async fn leaderboard(&self, limit: i64, offset: i64) -> Result<(Vec<LeaderboardEntry>, i64)> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT id, username, total_points
            FROM users
            ORDER BY total_points DESC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((entries, total.0))
    }

    /// 在事务中带行锁读取用户余额
    ///
    /// FOR UPDATE 使并发的扣减对同一用户串行化，
    /// 避免跨多次往返的 read-modify-write 竞争。
    pub async fn balance_for_update(tx: &mut PgConnection, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT total_points
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(tx)
        .await?
        .ok_or(PointsError::UserNotFound(user_id))?;

        Ok(row.get("total_points"))
    }

    /// 在事务中调整用户余额（delta 为带符号增量）
    pub async fn adjust_balance_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        delta: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET total_points = total_points + $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .execute(tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::UserNotFound(user_id));
        }

        Ok(())
    }
}
