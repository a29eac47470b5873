//! 行情数据源抽象
//!
//! 服务层只依赖这里的 trait，真实实现见 `yahoo.rs`，测试中使用 `fake.rs`

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{HistoryWindow, Metadata, PriceBar};

/// 行情数据源
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 获取公司基本信息及财务字段
    async fn fetch_metadata(&self, ticker: &str) -> Result<Metadata, ProviderError>;

    /// 获取指定回溯区间的日K线，按日期升序，可能为空
    async fn fetch_history(
        &self,
        ticker: &str,
        window: HistoryWindow,
    ) -> Result<Vec<PriceBar>, ProviderError>;
}
