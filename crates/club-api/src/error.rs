//! HTTP 层错误类型定义
//!
//! 把领域层错误翻译成统一的 HTTP 响应：状态码 + 错误码 + 提示信息

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use points_service::PointsError;

/// HTTP API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 领域错误
    #[error(transparent)]
    Points(#[from] PointsError),

    // 系统错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Points(e) => match e {
                PointsError::UserNotFound(_)
                | PointsError::RuleNotFound(_)
                | PointsError::ActivityNotFound(_)
                | PointsError::RegistrationNotFound(_)
                | PointsError::NoActiveRuleForAction(_) => StatusCode::NOT_FOUND,

                PointsError::Validation(_) => StatusCode::BAD_REQUEST,

                PointsError::InvalidCredentials => StatusCode::UNAUTHORIZED,

                PointsError::UserAlreadyExists
                | PointsError::AlreadyRegistered(_)
                | PointsError::ActivityFull(_)
                | PointsError::RuleInactive(_)
                | PointsError::InsufficientPoints { .. }
                | PointsError::InvalidStatusTransition { .. }
                | PointsError::AttendanceNotAllowed(_) => StatusCode::CONFLICT,

                PointsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Points(e) => match e {
                PointsError::UserNotFound(_) => "USER_NOT_FOUND",
                PointsError::RuleNotFound(_) => "RULE_NOT_FOUND",
                PointsError::NoActiveRuleForAction(_) => "NO_ACTIVE_RULE",
                PointsError::ActivityNotFound(_) => "ACTIVITY_NOT_FOUND",
                PointsError::RegistrationNotFound(_) => "REGISTRATION_NOT_FOUND",
                PointsError::RuleInactive(_) => "RULE_INACTIVE",
                PointsError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
                PointsError::UserAlreadyExists => "USER_ALREADY_EXISTS",
                PointsError::InvalidCredentials => "INVALID_CREDENTIALS",
                PointsError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
                PointsError::ActivityFull(_) => "ACTIVITY_FULL",
                PointsError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
                PointsError::AttendanceNotAllowed(_) => "ATTENDANCE_NOT_ALLOWED",
                PointsError::Validation(_) => "VALIDATION_ERROR",
                PointsError::Database(_) => "DATABASE_ERROR",
            },
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Points(PointsError::Database(e)) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从 sqlx 错误转换（经由领域层错误）
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Points(PointsError::Database(err))
    }
}

/// 从 bcrypt 错误转换
impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Internal(format!("密码哈希错误: {}", err))
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
