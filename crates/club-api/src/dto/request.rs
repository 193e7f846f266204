//! 请求参数和请求体结构

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use points_service::{ActivityStatus, RegistrationStatus, RuleType, TransactionType};
use points_service::stats::StatsPeriod;

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "用户名长度必须在3-50个字符之间"))]
    pub username: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 6, max = 72, message = "密码长度必须在6-72个字符之间"))]
    pub password: String,
}

/// 登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "用户名不能为空"))]
    pub username: String,
    #[validate(length(min = 1, message = "密码不能为空"))]
    pub password: String,
}

/// 创建积分规则请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[validate(length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"))]
    pub rule_name: String,
    pub rule_type: RuleType,
    #[validate(length(min = 1, max = 50, message = "行为类型长度必须在1-50个字符之间"))]
    pub action_type: String,
    #[validate(range(min = 1, message = "积分数量必须为正整数"))]
    pub points: i64,
    pub exchange_ratio: Option<f64>,
    #[validate(range(min = 1, message = "有效天数必须为正整数"))]
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    /// 缺省创建即生效
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// 更新积分规则请求（全量替换）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleRequest {
    #[validate(length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"))]
    pub rule_name: String,
    pub rule_type: RuleType,
    #[validate(length(min = 1, max = 50, message = "行为类型长度必须在1-50个字符之间"))]
    pub action_type: String,
    #[validate(range(min = 1, message = "积分数量必须为正整数"))]
    pub points: i64,
    pub exchange_ratio: Option<f64>,
    #[validate(range(min = 1, message = "有效天数必须为正整数"))]
    pub validity_days: Option<i32>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// 启用/禁用规则请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRuleActiveRequest {
    pub is_active: bool,
}

/// 创建活动请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, max = 200, message = "活动标题长度必须在1-200个字符之间"))]
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    #[validate(range(min = 1, message = "人数上限必须为正整数"))]
    pub max_participants: Option<i32>,
    pub club_id: Option<i64>,
}

/// 活动状态流转请求（发布/取消）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityStatusRequest {
    pub status: ActivityStatus,
}

/// 报名审核请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRegistrationRequest {
    pub status: RegistrationStatus,
}

/// 手动发放/扣除积分请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualPointsRequest {
    pub user_id: i64,
    pub rule_id: i64,
    /// 覆盖规则默认额度，缺省时使用规则定义的数量
    #[validate(range(min = 1, message = "积分数量必须为正整数"))]
    pub points: Option<i64>,
    pub description: Option<String>,
}

/// 分页参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationParams {
    /// 归一化为 (page, page_size, offset)，页码从 1 起
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(20).clamp(1, 100);
        (page, page_size, (page - 1) * page_size)
    }
}

/// 用户列表查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 活动列表查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListQuery {
    pub status: Option<ActivityStatus>,
}

/// 账本查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub transaction_type: Option<TransactionType>,
}

/// 统计查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub user_id: i64,
    /// 聚合周期，缺省按月
    #[serde(default)]
    pub period: StatsPeriod,
}

/// 排行榜查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl LeaderboardQuery {
    /// 归一化为 (limit, offset)
    pub fn normalize(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
