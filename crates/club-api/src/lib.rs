//! 社团积分系统 REST API
//!
//! 提供用户、积分规则、活动、报名和积分账本的 HTTP 接口。
//!
//! ## 核心功能
//!
//! - **用户**：注册、登录、查询和积分排行榜
//! - **积分规则**：规则的增改查与启用/禁用
//! - **活动**：创建、发布、取消和完成结算
//! - **报名**：报名、审核、签到/签退
//! - **积分**：账本查询、统计序列、手动发放/扣除
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义
//! - `auth`: 操作人身份提取
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::Operator;
pub use dto::{ApiResponse, PageResponse};
pub use error::{ApiError, Result};
pub use state::AppState;
