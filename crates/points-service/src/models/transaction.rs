//! 积分账本实体定义
//!
//! 账本只追加，写入后从不修改或删除；查询侧使用仓储中的
//! `LedgerEntry` 投影（关联规则与操作人名称）。

use chrono::{DateTime, Utc};

use super::enums::TransactionType;

/// 待写入的账本记录
///
/// 结算引擎组装后交给仓储在事务内插入
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub rule_id: i64,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub description: Option<String>,
    pub operator_id: Option<i64>,
    pub expire_at: Option<DateTime<Utc>>,
}
