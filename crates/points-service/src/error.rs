//! 积分服务错误类型
//!
//! 定义领域层的业务错误和系统错误

use thiserror::Error;

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum PointsError {
    // === 资源不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    #[error("积分规则不存在: {0}")]
    RuleNotFound(i64),

    #[error("未找到行为类型对应的激活规则: {0}")]
    NoActiveRuleForAction(String),

    #[error("活动不存在: {0}")]
    ActivityNotFound(i64),

    #[error("报名记录不存在: {0}")]
    RegistrationNotFound(i64),

    // === 业务规则拒绝 ===
    #[error("积分规则未激活: {0}")]
    RuleInactive(i64),

    #[error("用户积分不足: 需要 {required}, 当前 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("用户名或邮箱已存在")]
    UserAlreadyExists,

    #[error("用户名或密码错误")]
    InvalidCredentials,

    #[error("已报名该活动: activity_id={0}")]
    AlreadyRegistered(i64),

    #[error("活动报名人数已满: activity_id={0}")]
    ActivityFull(i64),

    #[error("非法的活动状态变更: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("签到/签退条件不满足: {0}")]
    AttendanceNotAllowed(String),

    // === 验证错误 ===
    #[error("参数验证失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, PointsError>;
