//! Yahoo Finance 数据源实现
//!
//! - K线: https://query1.finance.yahoo.com/v8/finance/chart/<ticker>
//! - 基本面: https://query2.finance.yahoo.com/v10/finance/quoteSummary/<ticker>
//!
//! 基本面接口需要 cookie + crumb，crumb 在客户端内缓存，401 时刷新一次

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

use super::provider::MarketDataProvider;
use crate::config::{ApiConfig, ProviderConfig};
use crate::error::ProviderError;
use crate::models::{HistoryWindow, Metadata, PriceBar};

/// 基本面接口请求的模块
const SUMMARY_MODULES: &str =
    "price,summaryProfile,summaryDetail,defaultKeyStatistics,financialData";

/// Yahoo Finance 行情数据源
pub struct YahooProvider {
    client: Client,
    chart_url: Url,
    summary_url: Url,
    crumb_url: Url,
    cookie_url: Url,
    crumb: RwLock<Option<String>>,
}

impl YahooProvider {
    /// 创建数据源，校验各接口地址并初始化带 cookie 的 HTTP 客户端
    pub fn new(provider: &ProviderConfig, api: &ApiConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&provider.user_agent).context("User-Agent 配置无效")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()
            .context("初始化 HTTP 客户端失败")?;

        Ok(Self {
            client,
            chart_url: parse_base_url("chart_url", &provider.chart_url)?,
            summary_url: parse_base_url("summary_url", &provider.summary_url)?,
            crumb_url: parse_base_url("crumb_url", &provider.crumb_url)?,
            cookie_url: parse_base_url("cookie_url", &provider.cookie_url)?,
            crumb: RwLock::new(None),
        })
    }

    /// 获取 crumb，优先使用缓存
    async fn crumb(&self) -> Result<String, ProviderError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        // 该地址通常返回 404，只用于写入 cookie
        if let Err(e) = self.client.get(self.cookie_url.clone()).send().await {
            log::debug!("获取 Yahoo cookie 失败: {}", e);
        }

        let response = self.client.get(self.crumb_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Http(response.status().as_u16()));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::Parse("无效的 crumb".to_string()));
        }

        log::debug!("获取 Yahoo crumb 成功");
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn request_summary(
        &self,
        ticker: &str,
        crumb: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = endpoint(&self.summary_url, ticker)?;
        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_metadata(&self, ticker: &str) -> Result<Metadata, ProviderError> {
        let mut response = self.request_summary(ticker, &self.crumb().await?).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::info!("Yahoo crumb 失效，重新获取");
            *self.crumb.write().await = None;
            response = self.request_summary(ticker, &self.crumb().await?).await?;
        }

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ProviderError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let summary: SummaryResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Parse(format!("quoteSummary: {}", e)))?;
        parse_summary(summary, ticker)
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        window: HistoryWindow,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let url = endpoint(&self.chart_url, ticker)?;
        log::debug!("请求K线数据: {} range={}", url, window);

        let response = self
            .client
            .get(url)
            .query(&[("range", window.as_range()), ("interval", "1d")])
            .send()
            .await?;

        // 无数据时 Yahoo 返回 404 + chart.error，需要解析响应体区分
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ProviderError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        match serde_json::from_str::<ChartResponse>(&body) {
            Ok(chart) => parse_chart(chart),
            Err(_) if !status.is_success() => Err(ProviderError::Http(status.as_u16())),
            Err(e) => Err(ProviderError::Parse(format!("chart: {}", e))),
        }
    }
}

fn parse_base_url(name: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("{} 不是有效的地址: {}", name, raw))?;
    if url.cannot_be_a_base() {
        bail!("{} 不能作为基础地址: {}", name, raw);
    }
    Ok(url)
}

/// 在基础地址后追加 ticker 路径段
fn endpoint(base: &Url, ticker: &str) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ProviderError::Parse(format!("无效的基础地址: {}", base)))?
        .pop_if_empty()
        .push(ticker);
    Ok(url)
}

// ==================== chart 接口 ====================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 解析 chart 响应，跳过收盘价为空的K线；`Not Found` 视为无数据
fn parse_chart(response: ChartResponse) -> Result<Vec<PriceBar>, ProviderError> {
    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Ok(Vec::new());
        }
        return Err(ProviderError::Parse(format!("{}: {}", err.code, err.description)));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = quote.close.get(i).copied().flatten().filter(|c| c.is_finite())?;
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            let volume = quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64);
            Some(PriceBar {
                timestamp,
                close,
                volume,
            })
        })
        .collect();

    Ok(bars)
}

// ==================== quoteSummary 接口 ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_profile: Option<ProfileModule>,
    #[serde(default)]
    summary_detail: Option<DetailModule>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatisticsModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
}

/// 数值字段格式: {"raw": 1.23, "fmt": "1.23"}，无值时为 {}
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    display_name: Option<String>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    trailing_eps: Option<RawValue>,
    price_to_book: Option<RawValue>,
    book_value: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    return_on_equity: Option<RawValue>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// 把 quoteSummary 各模块展平为 `Metadata`
fn parse_summary(response: SummaryResponse, ticker: &str) -> Result<Metadata, ProviderError> {
    if let Some(err) = response.quote_summary.error {
        if err.code == "Not Found" {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        return Err(ProviderError::Parse(format!("{}: {}", err.code, err.description)));
    }

    let result = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

    let price = result.price.unwrap_or_default();
    let profile = result.summary_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();

    let market_cap = raw(&price.market_cap)
        .or_else(|| raw(&detail.market_cap))
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64);

    Ok(Metadata {
        long_name: non_empty(price.long_name),
        short_name: non_empty(price.short_name),
        display_name: non_empty(price.display_name),
        sector: non_empty(profile.sector),
        industry: non_empty(profile.industry),
        market_cap,
        trailing_pe: raw(&detail.trailing_pe),
        trailing_eps: raw(&stats.trailing_eps),
        price_to_book: raw(&stats.price_to_book),
        book_value: raw(&stats.book_value),
        return_on_equity: raw(&financial.return_on_equity),
        dividend_yield: raw(&detail.dividend_yield),
    })
}
