//! 日志初始化模块
//!
//! 基于 tracing-subscriber 提供结构化日志，支持 pretty（本地开发）
//! 和 json（生产环境日志采集）两种输出格式。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 日志资源守卫
///
/// 目前仅作为初始化完成的标记持有；保留守卫类型是为了让调用方
/// 将其绑定到 main 的生命周期，与后续可能的异步刷写器兼容。
pub struct ObservabilityGuard {
    _private: (),
}

/// 初始化日志订阅器
///
/// 环境变量 RUST_LOG 优先于配置文件中的 log_level。
pub fn init(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(ObservabilityGuard { _private: () })
}
