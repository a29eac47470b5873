//! 股票数据服务
//!
//! 负责把4位股票代码转换为 ticker，带重试/回退地获取行情，
//! 计算价格快照和财务指标并组装报告

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{ProviderError, StockError};
use crate::models::{
    get_tokyo_time, Diagnostics, HistoryWindow, Metadata, PeerComparison, PriceBar, StockCode,
    StockReport,
};
use crate::services::stock::metrics::metric_or_zero;
use crate::services::stock::retry::{
    fallback_history, fallback_schedule, primary_schedule, retry_history,
};
use crate::services::stock::{
    compute_metrics, compute_snapshot, MarketDataProvider, RetryPolicy, Sleeper,
};

/// 板块/行业缺失时的占位
const UNKNOWN: &str = "不明";

/// 诊断接口返回的字段名样本数量
const SAMPLE_FIELD_COUNT: usize = 10;

/// 同行业对比最多取的公司数
const MAX_PEERS: usize = 3;

/// 主要板块的代表公司
const SECTOR_PEERS: &[(&str, &[&str])] = &[
    ("Consumer Cyclical", &["7203", "7267", "9984"]),
    ("Technology", &["6758", "6861", "4689"]),
    ("Financial Services", &["8306", "8316", "8411"]),
    ("Industrials", &["6301", "7201", "6954"]),
];

/// 股票数据服务
///
/// 不持有任何请求间状态，可通过 `web::Data` 在 worker 间共享
pub struct StockDataService {
    provider: Arc<dyn MarketDataProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    market_suffix: String,
}

impl StockDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        market_suffix: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            sleeper,
            policy,
            market_suffix: market_suffix.into(),
        }
    }

    /// 获取股票综合报告
    ///
    /// 1年K线经重试仍为空时依次回退到 6个月/3个月/1个月/5天，
    /// 全部为空则返回 `DataUnavailable`
    pub async fn fetch_report(&self, code: &StockCode) -> Result<StockReport, StockError> {
        let ticker = code.ticker(&self.market_suffix);
        log::info!("获取股票数据: {}", ticker);

        let (metadata, mut bars) = self.fetch_with_retry(&ticker).await?;
        if bars.is_empty() {
            bars = self.fetch_fallback(&ticker).await;
        }
        if bars.is_empty() {
            return Err(StockError::DataUnavailable(code.to_string()));
        }

        let snapshot = compute_snapshot(&bars);
        let metrics = compute_metrics(&metadata, snapshot.current_price);

        let name = metadata
            .company_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("株式コード: {}", code));

        Ok(StockReport {
            stock_code: code.to_string(),
            name,
            price: snapshot.current_price,
            previous_price: snapshot.previous_price,
            change: snapshot.change,
            change_percent: snapshot.change_percent,
            volume: snapshot.volume,
            market_cap: metadata.market_cap.unwrap_or(0),
            per: metrics.per,
            pbr: metrics.pbr,
            roe: metrics.roe,
            dividend: metrics.dividend_yield,
            sector: metadata.sector.unwrap_or_else(|| UNKNOWN.to_string()),
            industry: metadata.industry.unwrap_or_else(|| UNKNOWN.to_string()),
            last_updated: get_tokyo_time(),
        })
    }

    /// 带指数退避重试地获取基本信息和1年K线
    pub async fn fetch_with_retry(
        &self,
        ticker: &str,
    ) -> Result<(Metadata, Vec<PriceBar>), ProviderError> {
        let attempts = primary_schedule(&self.policy, &mut rand::thread_rng());
        retry_history(self.provider.as_ref(), self.sleeper.as_ref(), ticker, &attempts).await
    }

    /// 依次尝试更短的回溯区间
    pub async fn fetch_fallback(&self, ticker: &str) -> Vec<PriceBar> {
        fallback_history(
            self.provider.as_ref(),
            self.sleeper.as_ref(),
            ticker,
            &fallback_schedule(),
        )
        .await
    }

    /// 数据源诊断：各调用一次，不重试，不返回错误
    pub async fn diagnostics(&self, code: &StockCode) -> Diagnostics {
        let ticker = code.ticker(&self.market_suffix);
        let window = HistoryWindow::FiveDays;

        let (metadata_available, metadata_error, fields) =
            match self.provider.fetch_metadata(&ticker).await {
                Ok(metadata) => (true, None, metadata.field_names()),
                Err(e) => (false, Some(e.to_string()), Vec::new()),
            };

        let (history_bars, history_error) =
            match self.provider.fetch_history(&ticker, window).await {
                Ok(bars) => (bars.len(), None),
                Err(e) => (0, Some(e.to_string())),
            };

        Diagnostics {
            stock_code: code.to_string(),
            ticker,
            metadata_available,
            metadata_error,
            field_count: fields.len(),
            sample_fields: fields
                .iter()
                .take(SAMPLE_FIELD_COUNT)
                .map(|f| f.to_string())
                .collect(),
            history_available: history_bars > 0,
            history_window: window,
            history_bars,
            history_error,
            checked_at: get_tokyo_time(),
        }
    }

    /// 同行业对比
    ///
    /// 取不到板块或板块不在预置表中时返回 `None`，单个公司失败直接跳过
    pub async fn sector_comparison(&self, code: &StockCode) -> Option<Vec<PeerComparison>> {
        let ticker = code.ticker(&self.market_suffix);
        let sector = match self.provider.fetch_metadata(&ticker).await {
            Ok(metadata) => metadata.sector?,
            Err(e) => {
                log::warn!("{} 板块信息获取失败: {}", ticker, e);
                return None;
            }
        };

        let peers = SECTOR_PEERS
            .iter()
            .find(|(name, _)| *name == sector)
            .map(|(_, codes)| *codes)
            .unwrap_or_default();

        let tasks = peers
            .iter()
            .take(MAX_PEERS)
            .map(|peer| self.fetch_peer(format!("{}{}", peer, self.market_suffix)));

        Some(join_all(tasks).await.into_iter().flatten().collect())
    }

    async fn fetch_peer(&self, ticker: String) -> Option<PeerComparison> {
        let metadata = match self.provider.fetch_metadata(&ticker).await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::debug!("对比公司 {} 基本信息获取失败: {}", ticker, e);
                return None;
            }
        };

        match self.provider.fetch_history(&ticker, HistoryWindow::OneDay).await {
            Ok(bars) if !bars.is_empty() => {}
            Ok(_) => return None,
            Err(e) => {
                log::debug!("对比公司 {} K线获取失败: {}", ticker, e);
                return None;
            }
        }

        Some(PeerComparison {
            name: metadata.long_name.clone().unwrap_or_else(|| ticker.clone()),
            per: metric_or_zero("per", metadata.trailing_pe),
            pbr: metric_or_zero("pbr", metadata.price_to_book),
            roe: metric_or_zero("roe", metadata.return_on_equity.map(|r| r * 100.0)),
            ticker,
        })
    }
}
