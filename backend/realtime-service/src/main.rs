use actix::Actor;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use realtime_service::{
    handlers, logging, metrics, middleware::build_cors, AppError, AppState, Config,
    NotificationHub,
};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!("Starting realtime-service");

    // One hub per process, shared by every worker.
    let hub = NotificationHub::new().start();
    let state = AppState::new(hub, config.session_settings());
    tracing::info!("Notification hub initialized");

    let bind_addr = config.bind_addr();
    let workers = config.app_workers;
    let cors_config = config.clone();

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(build_cors(&cors_config))
            .wrap(metrics::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    });
    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    tracing::info!("Starting HTTP server on {}", bind_addr);
    server
        .bind(&bind_addr)
        .map_err(|e| AppError::StartServer(format!("bind {bind_addr}: {e}")))?
        .run()
        .await
        .context("HTTP server exited with an error")?;

    tracing::info!("realtime-service stopped");
    Ok(())
}
