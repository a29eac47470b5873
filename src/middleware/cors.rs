//! 跨域响应头
//!
//! `cors.allow_origin` 为空时不添加任何跨域头

use actix_web::middleware::{Condition, DefaultHeaders};

use crate::config::CorsConfig;

pub fn cors_headers(config: &CorsConfig) -> Condition<DefaultHeaders> {
    Condition::new(
        !config.allow_origin.is_empty(),
        DefaultHeaders::new()
            .add(("Access-Control-Allow-Origin", config.allow_origin.clone()))
            .add(("Access-Control-Allow-Methods", "GET, OPTIONS"))
            .add(("Access-Control-Allow-Headers", "Authorization, Content-Type")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{Method, StatusCode};
    use actix_web::{test, App};

    const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

    #[actix_web::test]
    async fn test_cors_headers_on_get_and_preflight() {
        let config = CorsConfig {
            allow_origin: "https://kabu.example.jp".to_string(),
        };
        let app = test::init_service(
            App::new()
                .wrap(cors_headers(&config))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(ALLOW_ORIGIN).unwrap(),
            "https://kabu.example.jp"
        );

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/stock/7203")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get(ALLOW_ORIGIN).unwrap(),
            "https://kabu.example.jp"
        );
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Methods").unwrap(),
            "GET, OPTIONS"
        );
    }

    #[actix_web::test]
    async fn test_cors_disabled_with_empty_origin() {
        let config = CorsConfig {
            allow_origin: String::new(),
        };
        let app = test::init_service(
            App::new()
                .wrap(cors_headers(&config))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(ALLOW_ORIGIN).is_none());
    }
}
