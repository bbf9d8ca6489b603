/// HTTP handlers for realtime-service
pub mod websocket;

use actix_web::web;

pub use websocket::register_routes as register_websocket;

/// Every route the service serves
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(|| async { "OK" }))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .route("/ws", web::get().to(websocket::ws_index));
    register_websocket(cfg);
}
