//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use sqlx::PgPool;

use points_service::repository::{
    ActivityRepository, LedgerRepository, RegistrationRepository, RuleRepository, UserRepository,
};
use points_service::service::{RuleResolver, SettlementEngine};

/// Axum 应用共享状态
///
/// 持有数据库连接池和结算引擎；仓储按需从连接池构造，
/// 各自只是连接池的轻量句柄。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    /// 账本结算引擎
    pub settlement: SettlementEngine,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(pool: PgPool) -> Self {
        let settlement = SettlementEngine::new(pool.clone());
        Self { pool, settlement }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn rules(&self) -> RuleRepository {
        RuleRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn activities(&self) -> ActivityRepository {
        ActivityRepository::new(self.pool.clone())
    }

    pub fn registrations(&self) -> RegistrationRepository {
        RegistrationRepository::new(self.pool.clone())
    }

    pub fn resolver(&self) -> RuleResolver {
        RuleResolver::new(self.pool.clone())
    }
}
