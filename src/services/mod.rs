//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod stock;            // 数据源、重试策略、指标计算
pub mod stock_service;    // 股票数据服务
