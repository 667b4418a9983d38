//! Middleware for request logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Request log line:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent" elapsed
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The browser front-end is served from its own origin and sends a bearer token.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600)
}
