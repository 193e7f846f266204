//! 积分规则仓储
//!
//! 规则从不删除：历史账本记录通过 rule_id 引用规则，
//! 下线只做 is_active 软禁用。

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::models::{PointRule, RuleType};

const RULE_COLUMNS: &str = "id, rule_name, rule_type, action_type, points, exchange_ratio, \
                            validity_days, description, is_active, created_by, created_at, updated_at";

/// 新建规则参数
#[derive(Debug, Clone)]
pub struct NewRule {
    pub rule_name: String,
    pub rule_type: RuleType,
    pub action_type: String,
    pub points: i64,
    pub exchange_ratio: Option<f64>,
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: i64,
}

/// 更新规则参数（整体替换，沿用创建时的字段集）
#[derive(Debug, Clone)]
pub struct UpdateRule {
    pub rule_name: String,
    pub rule_type: RuleType,
    pub action_type: String,
    pub points: i64,
    pub exchange_ratio: Option<f64>,
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// 带创建人名称的规则行（管理端列表/详情用）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RuleWithCreator {
    pub id: i64,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub action_type: String,
    pub points: i64,
    pub exchange_ratio: Option<f64>,
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 积分规则仓储
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建规则，返回新规则 ID
    pub async fn create(&self, rule: &NewRule) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_rules
                (rule_name, rule_type, action_type, points, exchange_ratio,
                 validity_days, description, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&rule.rule_name)
        .bind(rule.rule_type)
        .bind(&rule.action_type)
        .bind(rule.points)
        .bind(rule.exchange_ratio)
        .bind(rule.validity_days)
        .bind(&rule.description)
        .bind(rule.is_active)
        .bind(rule.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// 按 ID 查询规则
    ///
    /// 不过滤 is_active，管理端需要看到禁用规则；
    /// 结算前由调用方显式 assert_active。
    pub async fn find_by_id(&self, id: i64) -> Result<Option<PointRule>> {
        let rule = sqlx::query_as::<_, PointRule>(&format!(
            "SELECT {RULE_COLUMNS} FROM point_rules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// 解析某行为类型当前适用的规则
    ///
    /// 同一 action_type 允许多条激活规则并存，取最新创建的一条
    pub async fn latest_active_by_action(&self, action_type: &str) -> Result<Option<PointRule>> {
        let rule = sqlx::query_as::<_, PointRule>(&format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM point_rules
            WHERE action_type = $1 AND is_active = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(action_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// 规则列表（含创建人名称），按创建时间倒序
    pub async fn list(&self) -> Result<Vec<RuleWithCreator>> {
        let rules = sqlx::query_as::<_, RuleWithCreator>(
            r#"
            SELECT pr.id, pr.rule_name, pr.rule_type, pr.action_type, pr.points,
                   pr.exchange_ratio, pr.validity_days, pr.description, pr.is_active,
                   pr.created_by, u.username AS created_by_name,
                   pr.created_at, pr.updated_at
            FROM point_rules pr
            JOIN users u ON pr.created_by = u.id
            ORDER BY pr.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// 规则详情（含创建人名称）
    pub async fn find_with_creator(&self, id: i64) -> Result<Option<RuleWithCreator>> {
        let rule = sqlx::query_as::<_, RuleWithCreator>(
            r#"
            SELECT pr.id, pr.rule_name, pr.rule_type, pr.action_type, pr.points,
                   pr.exchange_ratio, pr.validity_days, pr.description, pr.is_active,
                   pr.created_by, u.username AS created_by_name,
                   pr.created_at, pr.updated_at
            FROM point_rules pr
            JOIN users u ON pr.created_by = u.id
            WHERE pr.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// 整体更新规则，返回是否命中
    pub async fn update(&self, id: i64, rule: &UpdateRule) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE point_rules
            SET rule_name = $2, rule_type = $3, action_type = $4, points = $5,
                exchange_ratio = $6, validity_days = $7, description = $8,
                is_active = $9, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&rule.rule_name)
        .bind(rule.rule_type)
        .bind(&rule.action_type)
        .bind(rule.points)
        .bind(rule.exchange_ratio)
        .bind(rule.validity_days)
        .bind(&rule.description)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 启用/禁用规则，返回是否命中
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE point_rules SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
