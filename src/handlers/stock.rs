//! 股票接口处理器
//!
//! ## API 列表
//! - GET /stock/{code} - 股价及财务指标
//! - GET /stock/{code}/diagnostics - 数据源诊断
//! - GET /stock/{code}/comparison - 同行业对比

use actix_web::{web, HttpResponse, Result};

use crate::error::StockError;
use crate::models::{ApiResponse, StockCode};
use crate::services::stock_service::StockDataService;

/// 错误转换为统一响应，状态码由错误类型决定
fn error_response(e: &StockError) -> HttpResponse {
    HttpResponse::build(e.status_code()).json(ApiResponse::<()>::error(e.to_string()))
}

/// 获取股票综合报告
///
/// GET /api/stock/{code}
///
/// 报告包在统一响应的 `data` 中返回，而不是直接返回报告对象；
/// 失败时为 `success: false` 与 `message`，而不是 `{"error": ...}`
pub async fn get_stock_report(
    path: web::Path<String>,
    service: web::Data<StockDataService>,
) -> Result<HttpResponse> {
    let code = match StockCode::parse(&path.into_inner()) {
        Ok(code) => code,
        Err(e) => return Ok(error_response(&e)),
    };

    match service.fetch_report(&code).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => {
            log::error!("获取 {} 数据失败: {}", code, e);
            Ok(error_response(&e))
        }
    }
}

/// 数据源诊断
///
/// GET /api/stock/{code}/diagnostics
pub async fn get_stock_diagnostics(
    path: web::Path<String>,
    service: web::Data<StockDataService>,
) -> Result<HttpResponse> {
    let code = match StockCode::parse(&path.into_inner()) {
        Ok(code) => code,
        Err(e) => return Ok(error_response(&e)),
    };

    let diagnostics = service.diagnostics(&code).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(diagnostics)))
}

/// 同行业对比，板块未知时 data 为 null
///
/// GET /api/stock/{code}/comparison
pub async fn get_stock_comparison(
    path: web::Path<String>,
    service: web::Data<StockDataService>,
) -> Result<HttpResponse> {
    let code = match StockCode::parse(&path.into_inner()) {
        Ok(code) => code,
        Err(e) => return Ok(error_response(&e)),
    };

    let comparison = service.sector_comparison(&code).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(comparison)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stock")
            .route("/{code}", web::get().to(get_stock_report))
            .route("/{code}/diagnostics", web::get().to(get_stock_diagnostics))
            .route("/{code}/comparison", web::get().to(get_stock_comparison)),
    );
}
