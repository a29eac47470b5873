//! 重试与回退策略
//!
//! 策略本身是纯函数：`primary_schedule` / `fallback_schedule` 生成尝试序列，
//! `retry_history` / `fallback_history` 按序列执行，等待通过 `Sleeper` 注入。

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::provider::MarketDataProvider;
use crate::error::ProviderError;
use crate::models::{HistoryWindow, Metadata, PriceBar};

/// 主区间
pub const PRIMARY_WINDOW: HistoryWindow = HistoryWindow::OneYear;

/// 主区间无数据时依次尝试的区间
pub const FALLBACK_WINDOWS: [HistoryWindow; 4] = [
    HistoryWindow::SixMonths,
    HistoryWindow::ThreeMonths,
    HistoryWindow::OneMonth,
    HistoryWindow::FiveDays,
];

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 最大尝试次数
    pub max_attempts: u32,
    /// 退避基准时间
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// 单次尝试：查询的区间，以及本次未成功时进入下一次之前的等待时间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub window: HistoryWindow,
    pub backoff: Duration,
}

/// 第 `attempt` 次（从 0 开始）失败后的等待时间：`base * 2^attempt + jitter`
///
/// `jitter` 取值 [0, 1) 秒，超出范围会被截断
pub fn backoff_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    let jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
    let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = base.as_secs_f64() * 2f64.powi(exp) + jitter;
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// 主区间的尝试序列，最后一次不再等待
pub fn primary_schedule<R: Rng + ?Sized>(policy: &RetryPolicy, rng: &mut R) -> Vec<Attempt> {
    let attempts = policy.max_attempts.max(1);
    (0..attempts)
        .map(|i| Attempt {
            window: PRIMARY_WINDOW,
            backoff: if i + 1 < attempts {
                backoff_delay(policy.base_delay, i, rng.gen::<f64>())
            } else {
                Duration::ZERO
            },
        })
        .collect()
}

/// 回退区间的尝试序列，各区间之间不等待
pub fn fallback_schedule() -> Vec<Attempt> {
    FALLBACK_WINDOWS
        .iter()
        .map(|&window| Attempt {
            window,
            backoff: Duration::ZERO,
        })
        .collect()
}

/// 等待能力，测试中替换为只记录不等待的实现
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的实现
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 按尝试序列获取基本信息和K线
///
/// - 基本信息失败不致命，降级为空
/// - K线失败触发重试，最后一次失败时返回该错误
/// - 拿到非空K线立即返回；最后一次即使为空也直接返回
pub async fn retry_history(
    provider: &dyn MarketDataProvider,
    sleeper: &dyn Sleeper,
    ticker: &str,
    attempts: &[Attempt],
) -> Result<(Metadata, Vec<PriceBar>), ProviderError> {
    let total = attempts.len();

    for (i, attempt) in attempts.iter().enumerate() {
        let is_last = i + 1 == total;

        let metadata = match provider.fetch_metadata(ticker).await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("{} 基本信息获取失败，按空处理: {}", ticker, e);
                Metadata::default()
            }
        };

        match provider.fetch_history(ticker, attempt.window).await {
            Ok(bars) if !bars.is_empty() || is_last => return Ok((metadata, bars)),
            Ok(_) => {
                log::info!(
                    "{} 第 {}/{} 次获取 {} K线为空",
                    ticker,
                    i + 1,
                    total,
                    attempt.window
                );
            }
            Err(e) if is_last => {
                log::error!(
                    "{} 第 {}/{} 次获取K线失败，放弃: {}",
                    ticker,
                    i + 1,
                    total,
                    e
                );
                return Err(e);
            }
            Err(e) => {
                log::warn!("{} 第 {}/{} 次获取K线失败: {}", ticker, i + 1, total, e);
            }
        }

        log::debug!("{} 等待 {:?} 后重试", ticker, attempt.backoff);
        sleeper.sleep(attempt.backoff).await;
    }

    Ok((Metadata::default(), Vec::new()))
}

/// 依次尝试回退区间，返回第一个非空结果；全部失败返回空
pub async fn fallback_history(
    provider: &dyn MarketDataProvider,
    sleeper: &dyn Sleeper,
    ticker: &str,
    attempts: &[Attempt],
) -> Vec<PriceBar> {
    for attempt in attempts {
        match provider.fetch_history(ticker, attempt.window).await {
            Ok(bars) if !bars.is_empty() => {
                log::info!(
                    "{} 使用回退区间 {} 的K线 ({} 条)",
                    ticker,
                    attempt.window,
                    bars.len()
                );
                return bars;
            }
            Ok(_) => log::info!("{} 回退区间 {} 无数据", ticker, attempt.window),
            Err(e) => log::warn!("{} 回退区间 {} 获取失败: {}", ticker, attempt.window, e),
        }

        if !attempt.backoff.is_zero() {
            sleeper.sleep(attempt.backoff).await;
        }
    }

    Vec::new()
}
