//! 测试用的确定性数据源和等待实现

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use super::provider::MarketDataProvider;
use super::retry::Sleeper;
use crate::error::ProviderError;
use crate::models::{HistoryWindow, Metadata, PriceBar};

type HistoryScript = VecDeque<Result<Vec<PriceBar>, ProviderError>>;

/// 按 ticker/区间预置返回值的数据源
///
/// 每个区间的脚本按顺序消费，最后一项会一直重复；未配置的返回空
#[derive(Default)]
pub struct FakeProvider {
    metadata: HashMap<String, Result<Metadata, ProviderError>>,
    history: Mutex<HashMap<(String, HistoryWindow), HistoryScript>>,
    metadata_calls: Mutex<Vec<String>>,
    history_calls: Mutex<Vec<(String, HistoryWindow)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, ticker: &str, result: Result<Metadata, ProviderError>) -> Self {
        self.metadata.insert(ticker.to_string(), result);
        self
    }

    pub fn with_history(
        self,
        ticker: &str,
        window: HistoryWindow,
        script: Vec<Result<Vec<PriceBar>, ProviderError>>,
    ) -> Self {
        self.history
            .lock()
            .unwrap()
            .insert((ticker.to_string(), window), script.into());
        self
    }

    pub fn metadata_calls(&self) -> Vec<String> {
        self.metadata_calls.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> Vec<(String, HistoryWindow)> {
        self.history_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn fetch_metadata(&self, ticker: &str) -> Result<Metadata, ProviderError> {
        self.metadata_calls.lock().unwrap().push(ticker.to_string());
        self.metadata
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| Ok(Metadata::default()))
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        window: HistoryWindow,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        self.history_calls
            .lock()
            .unwrap()
            .push((ticker.to_string(), window));

        let mut history = self.history.lock().unwrap();
        match history.get_mut(&(ticker.to_string(), window)) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap_or_else(|| Ok(Vec::new())),
            None => Ok(Vec::new()),
        }
    }
}

/// 只记录等待时长，不真正等待
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// 按收盘价序列构造连续交易日K线，成交量固定为 1000
pub fn bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 4, 6, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + ChronoDuration::days(i as i64),
            close,
            volume: Some(1000),
        })
        .collect()
}
