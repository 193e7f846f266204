//! 数据访问层
//!
//! 每个实体一个仓储；事务性写入路径提供 `*_in_tx` 关联函数，
//! 由结算引擎在单个事务内组合调用。

mod activity_repo;
mod ledger_repo;
mod registration_repo;
mod rule_repo;
mod user_repo;

pub use activity_repo::{ActivityRepository, NewActivity};
pub use ledger_repo::{LedgerEntry, LedgerFilter, LedgerRepository};
pub use registration_repo::{RegistrationRepository, RegistrationRow};
pub use rule_repo::{NewRule, RuleRepository, RuleWithCreator, UpdateRule};
pub use user_repo::UserRepository;
