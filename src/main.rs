//! 日本株分析后端服务
//!
//! 提供东证上市股票的股价及财务指标 RESTful API
//! 数据来源：Yahoo Finance

mod config;     // 配置加载
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::sync::Arc;

use actix_web::middleware::{Condition, Logger};
use actix_web::{web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::{cors_headers, ApiKeyMiddleware};
use crate::services::stock::{TokioSleeper, YahooProvider};
use crate::services::stock_service::StockDataService;

/// 应用程序入口
///
/// 加载配置后启动 HTTP 服务器，默认监听 0.0.0.0:5000
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = AppConfig::load()?;

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &source {
        Some(path) => log::info!("从 {} 加载配置成功", path),
        None => log::info!("未找到配置文件，使用默认配置"),
    }

    let provider = YahooProvider::new(&config.provider, &config.api)?;
    let service = web::Data::new(StockDataService::new(
        Arc::new(provider),
        Arc::new(TokioSleeper),
        config.retry.policy(),
        config.provider.market_suffix.clone(),
    ));

    let api_key = config.api.api_key.clone();
    if api_key.is_empty() {
        log::warn!("未设置 API Key，接口不做认证");
    }
    let cors = config.cors.clone();

    let bind_addr = config.bind_addr();
    log::info!("启动日本株分析服务: http://{}/api/health", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Condition::new(
                !api_key.is_empty(),
                ApiKeyMiddleware::new(api_key.clone()),
            ))
            .wrap(cors_headers(&cors))
            .wrap(Logger::default())  // 请求日志
            .configure(handlers::config)
            .default_service(web::to(handlers::not_found))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}
