//! 基础设施错误类型
//!
//! 业务错误由各服务自行定义，这里只收敛配置、数据库等基础设施层面的失败。

use thiserror::Error;

/// 基础设施错误
#[derive(Debug, Error)]
pub enum ClubError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("内部错误: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ClubError>;
