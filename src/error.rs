//! 错误类型定义
//!
//! - `ProviderError`: 上游行情数据源调用失败
//! - `StockError`: 面向 API 调用方的业务错误

use actix_web::http::StatusCode;
use thiserror::Error;

/// 行情数据源错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// 网络请求失败（连接、超时等）
    #[error("网络请求失败: {0}")]
    Network(String),
    /// 上游返回非 2xx 状态码
    #[error("上游返回 HTTP {0}")]
    Http(u16),
    /// 响应解析失败
    #[error("响应解析失败: {0}")]
    Parse(String),
    /// 上游明确表示无此数据
    #[error("未找到数据: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::Http(status.as_u16())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// 股票数据服务错误
#[derive(Debug, Error)]
pub enum StockError {
    /// 股票代码格式不正确
    #[error("请输入正确的4位股票代码: {0}")]
    InvalidInput(String),
    /// 重试后仍然失败的数据源错误
    #[error("数据获取错误: {0}")]
    Provider(#[from] ProviderError),
    /// 重试及回退后仍无价格数据
    #[error("未找到股价数据: {0}")]
    DataUnavailable(String),
}

impl StockError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            StockError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StockError::Provider(_) | StockError::DataUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            StockError::InvalidInput("72a3".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StockError::DataUnavailable("0000".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StockError::from(ProviderError::Http(503)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_data_unavailable_names_code() {
        let msg = StockError::DataUnavailable("0000".into()).to_string();
        assert!(msg.contains("0000"));
    }
}
