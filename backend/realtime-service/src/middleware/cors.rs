use crate::config::Config;
use actix_cors::Cors;
use actix_web::http::header;

/// Cross-origin policy for the browser client
///
/// Only `GET` and `POST` are allowed. A `*` origin allows any origin and turns
/// credentials off, since browsers reject that combination anyway.
pub fn build_cors(config: &Config) -> Cors {
    let mut cors = if config.cors_allowed_origin.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(config.cors_allowed_origin.trim())
    };

    cors = cors
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    if config.cors_allow_credentials && config.cors_allowed_origin.trim() != "*" {
        cors = cors.supports_credentials();
    }

    cors
}
