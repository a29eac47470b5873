//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use serde::{Deserialize, Serialize};

/// 获取东京时间字符串（RFC 3339，带+09:00时区）
pub fn get_tokyo_time() -> String {
    Utc::now().with_timezone(&Tokyo).to_rfc3339()
}

/// 统一 API 响应结构
///
/// 所有接口返回统一格式，包含：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（东京时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: get_tokyo_time(),
        }
    }

    /// 创建错误响应
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            timestamp: get_tokyo_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokyo_time_offset() {
        assert!(get_tokyo_time().ends_with("+09:00"));
    }

    #[test]
    fn test_error_response_has_no_data() {
        let resp = ApiResponse::<()>::error("失败");
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.message, "失败");
    }
}
