//! 社团积分领域服务
//!
//! 包含积分系统的核心业务逻辑：
//!
//! - **规则解析器**：按行为类型或 ID 定位当前应适用的积分规则
//! - **账本结算引擎**：`point_transactions` 和 `users.total_points`
//!   的唯一写入方，负责活动完成批量发放和手动发放/扣除
//! - **仓储层**：用户、规则、账本、活动、报名的数据访问
//!
//! ## 模块结构
//!
//! - `models`: 实体模型和枚举
//! - `repository`: 数据访问层
//! - `service`: 规则解析与结算引擎
//! - `stats`: 统计周期分桶策略
//! - `error`: 错误类型定义

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod stats;

pub use error::{PointsError, Result};
pub use models::{
    Activity, ActivityStatus, LeaderboardEntry, PointRule, Registration,
    RegistrationStatus, Role, RuleType, TransactionType, User,
};
pub use service::{
    ACTION_ACTIVITY_PARTICIPATION, CompletionSummary, ManualSettlement, RuleResolver,
    SettlementEngine, SettlementOutcome,
};
pub use stats::{StatsBucket, StatsPeriod};
