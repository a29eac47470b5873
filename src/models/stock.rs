//! 股票数据模型
//!
//! 定义日本股票相关的数据结构

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockError;

/// 股票代码（东证4位数字代码）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCode(String);

impl StockCode {
    /// 校验并构造股票代码，必须是恰好4位 ASCII 数字
    pub fn parse(raw: &str) -> Result<Self, StockError> {
        if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(StockError::InvalidInput(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 拼接交易所后缀，得到行情源使用的 ticker（如 7203 -> 7203.T）
    pub fn ticker(&self, market_suffix: &str) -> String {
        format!("{}{}", self.0, market_suffix)
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 历史K线回溯区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HistoryWindow {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl HistoryWindow {
    /// Yahoo chart 接口的 range 参数
    pub fn as_range(&self) -> &'static str {
        match self {
            HistoryWindow::OneDay => "1d",
            HistoryWindow::FiveDays => "5d",
            HistoryWindow::OneMonth => "1mo",
            HistoryWindow::ThreeMonths => "3mo",
            HistoryWindow::SixMonths => "6mo",
            HistoryWindow::OneYear => "1y",
        }
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

/// 单日K线（只保留收盘价和成交量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 交易日时间戳
    pub timestamp: DateTime<Utc>,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: Option<u64>,
}

/// 公司基本信息及原始财务字段
///
/// 所有字段都可能缺失，比率类字段为小数形式（0.12 表示 12%）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub display_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub price_to_book: Option<f64>,
    pub book_value: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl Metadata {
    /// 已有值的字段名（使用上游字段命名），诊断接口使用
    pub fn field_names(&self) -> Vec<&'static str> {
        let fields = [
            ("longName", self.long_name.is_some()),
            ("shortName", self.short_name.is_some()),
            ("displayName", self.display_name.is_some()),
            ("sector", self.sector.is_some()),
            ("industry", self.industry.is_some()),
            ("marketCap", self.market_cap.is_some()),
            ("trailingPE", self.trailing_pe.is_some()),
            ("trailingEps", self.trailing_eps.is_some()),
            ("priceToBook", self.price_to_book.is_some()),
            ("bookValue", self.book_value.is_some()),
            ("returnOnEquity", self.return_on_equity.is_some()),
            ("dividendYield", self.dividend_yield.is_some()),
        ];
        fields
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| name)
            .collect()
    }

    /// 公司名称：依次尝试 longName、shortName、displayName，空字符串视为缺失
    pub fn company_name(&self) -> Option<&str> {
        [&self.long_name, &self.short_name, &self.display_name]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .map(str::trim)
            .find(|n| !n.is_empty())
    }
}

/// 最新价格快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub current_price: f64,
    pub previous_price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    pub volume: u64,
}

/// 财务指标，缺失时均为 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialMetrics {
    /// 市盈率
    pub per: f64,
    /// 市净率
    pub pbr: f64,
    /// 净资产收益率（百分比）
    pub roe: f64,
    /// 股息率（百分比）
    pub dividend_yield: f64,
}

/// 股票综合报告
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    /// 股票代码
    pub stock_code: String,
    /// 公司名称
    pub name: String,
    /// 当前价格
    pub price: f64,
    /// 前一交易日收盘价
    pub previous_price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 成交量
    pub volume: u64,
    /// 市值
    pub market_cap: u64,
    pub per: f64,
    pub pbr: f64,
    pub roe: f64,
    /// 股息率（百分比）
    pub dividend: f64,
    /// 板块
    pub sector: String,
    /// 行业
    pub industry: String,
    /// 生成时间（东京时间）
    pub last_updated: String,
}

/// 数据源诊断结果
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub stock_code: String,
    pub ticker: String,
    pub metadata_available: bool,
    pub metadata_error: Option<String>,
    pub field_count: usize,
    /// 部分可用字段名
    pub sample_fields: Vec<String>,
    pub history_available: bool,
    pub history_window: HistoryWindow,
    pub history_bars: usize,
    pub history_error: Option<String>,
    pub checked_at: String,
}

/// 同行业对比数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerComparison {
    pub ticker: String,
    pub name: String,
    pub per: f64,
    pub pbr: f64,
    pub roe: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_code_parse() {
        let code = StockCode::parse("7203").unwrap();
        assert_eq!(code.as_str(), "7203");
        assert_eq!(code.ticker(".T"), "7203.T");

        for bad in ["72a3", "720", "72030", "", "７２０３", " 720"] {
            assert!(
                matches!(StockCode::parse(bad), Err(StockError::InvalidInput(_))),
                "{:?} 应该被拒绝",
                bad
            );
        }
    }

    #[test]
    fn test_company_name_fallback_order() {
        let mut meta = Metadata {
            long_name: Some("  ".into()),
            short_name: Some("TOYOTA".into()),
            display_name: Some("Toyota".into()),
            ..Default::default()
        };
        assert_eq!(meta.company_name(), Some("TOYOTA"));

        meta.short_name = None;
        assert_eq!(meta.company_name(), Some("Toyota"));

        assert_eq!(Metadata::default().company_name(), None);
    }

    #[test]
    fn test_field_names_only_present() {
        let meta = Metadata {
            long_name: Some("Toyota Motor Corporation".into()),
            trailing_pe: Some(9.5),
            ..Default::default()
        };
        assert_eq!(meta.field_names(), vec!["longName", "trailingPE"]);
        assert!(Metadata::default().field_names().is_empty());
    }

    #[test]
    fn test_history_window_serializes_as_range() {
        let json = serde_json::to_string(&HistoryWindow::SixMonths).unwrap();
        assert_eq!(json, "\"6mo\"");
        assert_eq!(HistoryWindow::FiveDays.to_string(), "5d");
    }
}
