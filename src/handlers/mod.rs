pub mod stock;
pub mod health;

use actix_web::{guard, web, HttpRequest, HttpResponse};

use crate::models::ApiResponse;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/{tail:.*}")
                    .guard(guard::Options())
                    .to(preflight),
            )
            .configure(health::config)
            .configure(stock::config),
    );
}

/// CORS 预检请求，跨域头由 DefaultHeaders 统一添加
async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// 未匹配的路由
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    let message = format!("接口不存在: {}", req.path());
    HttpResponse::NotFound().json(ApiResponse::<()>::error(message))
}
