//! 领域服务层
//!
//! 规则解析器负责定位应适用的积分规则；
//! 结算引擎负责账本和余额的事务性写入。

mod rule_resolver;
mod settlement;

pub use rule_resolver::{ACTION_ACTIVITY_PARTICIPATION, RuleResolver};
pub use settlement::{CompletionSummary, ManualSettlement, SettlementEngine, SettlementOutcome};
