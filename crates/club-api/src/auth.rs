//! 操作人身份提取
//!
//! 管理端接口通过 `x-operator-id` 请求头声明操作人身份，
//! 提取器查库确认用户存在并加载角色。网关层负责真正的认证，
//! 本服务只做身份解析和角色检查。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use points_service::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// 请求头名称
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// 已解析的操作人身份
#[derive(Debug, Clone)]
pub struct Operator {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Operator {
    /// 校验操作人具备管理员角色
    pub fn ensure_admin(&self) -> Result<(), ApiError> {
        if !self.role.is_admin() {
            return Err(ApiError::Forbidden("需要管理员权限".to_string()));
        }
        Ok(())
    }
}

/// 从请求头解析可选的操作人身份
///
/// 头缺失时返回 None（匿名访问）；头存在但指向不存在的用户仍然报错
pub async fn optional_operator(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<Option<Operator>, ApiError> {
    let Some(raw) = headers.get(OPERATOR_HEADER) else {
        return Ok(None);
    };

    let operator_id = raw
        .to_str()
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("非法的 {} 请求头", OPERATOR_HEADER)))?;

    let user = state
        .users()
        .find_by_id(operator_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(format!("操作人不存在: {}", operator_id)))?;

    Ok(Some(Operator {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let operator_id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("缺少或非法的 {} 请求头", OPERATOR_HEADER))
            })?;

        let user = state
            .users()
            .find_by_id(operator_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(format!("操作人不存在: {}", operator_id)))?;

        Ok(Operator {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}
