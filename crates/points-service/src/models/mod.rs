//! 实体模型定义

mod activity;
mod enums;
mod rule;
mod transaction;
mod user;

pub use activity::{Activity, Registration};
pub use enums::{ActivityStatus, RegistrationStatus, Role, RuleType, TransactionType};
pub use rule::PointRule;
pub use transaction::NewTransaction;
pub use user::{LeaderboardEntry, User};
