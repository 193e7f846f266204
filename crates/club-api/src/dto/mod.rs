//! 请求和响应的数据传输对象

mod request;
mod response;

pub use request::{
    ActivityListQuery, CreateActivityRequest, CreateRuleRequest, LeaderboardQuery, LedgerQuery,
    LoginRequest, ManualPointsRequest, PaginationParams, RegisterRequest,
    ReviewRegistrationRequest, SetRuleActiveRequest, StatsQuery, UpdateActivityStatusRequest,
    UpdateRuleRequest, UserListQuery,
};
pub use response::{ApiResponse, PageResponse, UserStatsResponse};
