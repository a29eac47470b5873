//! 价格快照与财务指标计算

use crate::models::{FinancialMetrics, Metadata, PriceBar, PriceSnapshot};

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 指标取值：有限值保留两位小数，缺失或非有限值（计算失败）记为 0
pub fn metric_or_zero(name: &str, value: Option<f64>) -> f64 {
    match value.map(round2) {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            log::debug!("指标 {} 计算结果无效 ({})，记为 0", name, v);
            0.0
        }
        None => 0.0,
    }
}

/// 由最近两根K线计算价格快照
///
/// 只有一根K线时前收盘价等于当前价；空输入返回全 0
pub fn compute_snapshot(bars: &[PriceBar]) -> PriceSnapshot {
    let Some(latest) = bars.last() else {
        return PriceSnapshot::default();
    };
    let previous = bars.iter().rev().nth(1).unwrap_or(latest);

    let change = latest.close - previous.close;
    let change_percent = if previous.close != 0.0 {
        change / previous.close * 100.0
    } else {
        0.0
    };

    PriceSnapshot {
        current_price: round2(latest.close),
        previous_price: round2(previous.close),
        change: round2(change),
        change_percent: round2(change_percent),
        volume: latest.volume.unwrap_or(0),
    }
}

/// 直接提供的比率为正时优先使用，否则用 价格 / 分母 推算，分母须为正
fn price_ratio(direct: Option<f64>, price: f64, denominator: Option<f64>) -> Option<f64> {
    match direct {
        Some(v) if v > 0.0 => Some(v),
        _ => denominator.filter(|d| *d > 0.0).map(|d| price / d),
    }
}

/// 计算 PER / PBR / ROE / 股息率
///
/// 四个指标相互独立，任一项失败只影响该项
pub fn compute_metrics(metadata: &Metadata, current_price: f64) -> FinancialMetrics {
    FinancialMetrics {
        per: metric_or_zero(
            "per",
            price_ratio(metadata.trailing_pe, current_price, metadata.trailing_eps),
        ),
        pbr: metric_or_zero(
            "pbr",
            price_ratio(metadata.price_to_book, current_price, metadata.book_value),
        ),
        roe: metric_or_zero("roe", metadata.return_on_equity.map(|r| r * 100.0)),
        dividend_yield: metric_or_zero(
            "dividend_yield",
            metadata.dividend_yield.map(|d| d * 100.0),
        ),
    }
}
