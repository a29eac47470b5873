//! 日本股票数据服务模块
//!
//! 数据源抽象、Yahoo Finance 实现、重试策略和指标计算

pub mod metrics;
pub mod provider;
pub mod retry;
pub mod yahoo;

#[cfg(test)]
pub mod fake;

pub use metrics::{compute_metrics, compute_snapshot};
pub use provider::MarketDataProvider;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use yahoo::YahooProvider;
