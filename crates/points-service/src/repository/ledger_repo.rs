//! 积分账本仓储
//!
//! 账本只追加：仅提供事务内插入和只读查询，不存在更新或删除路径。

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;
use crate::models::{NewTransaction, TransactionType};
use crate::stats::{StatsBucket, StatsPeriod};

/// 账本查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub transaction_type: Option<TransactionType>,
}

/// 账本记录投影（关联规则名称和操作人名称）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub rule_id: i64,
    pub rule_name: String,
    pub action_type: String,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub description: Option<String>,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub expire_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 积分账本仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中插入账本记录，返回新记录 ID
    ///
    /// 这是账本唯一的写入入口，只能由结算引擎在事务内调用
    pub async fn insert_in_tx(tx: &mut PgConnection, entry: &NewTransaction) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_transactions
                (user_id, rule_id, points, transaction_type, reference_id,
                 reference_type, description, operator_id, expire_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.rule_id)
        .bind(entry.points)
        .bind(entry.transaction_type)
        .bind(entry.reference_id)
        .bind(&entry.reference_type)
        .bind(&entry.description)
        .bind(entry.operator_id)
        .bind(entry.expire_at)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 用户账本记录列表
    ///
    /// 按时间倒序，支持日期区间和方向过滤
    pub async fn list_by_user(&self, user_id: i64, filter: &LedgerFilter) -> Result<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT pt.id, pt.user_id, pt.rule_id, pr.rule_name, pr.action_type,
                   pt.points, pt.transaction_type, pt.reference_id, pt.reference_type,
                   pt.description, pt.operator_id, u.username AS operator_name,
                   pt.expire_at, pt.created_at
            FROM point_transactions pt
            JOIN point_rules pr ON pt.rule_id = pr.id
            LEFT JOIN users u ON pt.operator_id = u.id
            WHERE pt.user_id = $1
              AND ($2::timestamptz IS NULL OR pt.created_at >= $2)
              AND ($3::timestamptz IS NULL OR pt.created_at <= $3)
              AND ($4::varchar IS NULL OR pt.transaction_type = $4)
            ORDER BY pt.created_at DESC, pt.id DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.transaction_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 用户账本的带符号求和
    ///
    /// 对账用：任何已提交结算之后都应等于 users.total_points
    pub async fn signed_sum(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(
                CASE transaction_type WHEN 'earn' THEN points ELSE -points END
            ), 0)::bigint AS balance
            FROM point_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("balance"))
    }

    /// 按日历周期聚合某方向的积分统计序列
    ///
    /// 分组键和标签格式来自 StatsPeriod 封闭枚举的固定字符串，
    /// 用户输入不参与 SQL 拼接。
    pub async fn stats_series(
        &self,
        user_id: i64,
        period: StatsPeriod,
        transaction_type: TransactionType,
    ) -> Result<Vec<StatsBucket>> {
        let query = format!(
            r#"
            SELECT TO_CHAR({bucket}, '{label}') AS time_period,
                   SUM(points)::bigint AS total_points,
                   COUNT(*) AS transaction_count
            FROM point_transactions
            WHERE user_id = $1 AND transaction_type = $2
            GROUP BY {bucket}
            ORDER BY {bucket}
            "#,
            bucket = period.bucket_expr(),
            label = period.label_format(),
        );

        let buckets = sqlx::query_as::<_, StatsBucket>(&query)
            .bind(user_id)
            .bind(transaction_type)
            .fetch_all(&self.pool)
            .await?;

        Ok(buckets)
    }
}
