mod api_key;
mod cors;

pub use api_key::ApiKeyMiddleware;
pub use cors::cors_headers;
