/// WebSocket endpoint and read-only connection status
///
/// Clients connect on `/ws` and send an `authenticate` event. Notifications are pushed
/// by the in-process dispatcher; no route here sends anything to a client.
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::websocket::hub::{ConnectedUsers, Lookup, Stats};
use crate::websocket::{UserId, WsSession};

/// Upgrade to a WebSocket session
///
/// Endpoint: GET /ws
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> std::result::Result<HttpResponse, Error> {
    let settings = state.session_settings;
    let session = WsSession::new(state.hub.clone(), settings);

    ws::WsResponseBuilder::new(session, &req, stream)
        .frame_size(settings.max_frame_size)
        .start()
}

/// Whether a user currently has a live session
///
/// Endpoint: GET /api/v1/ws/status/{user_id}
pub async fn ws_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = UserId::parse(path.into_inner())
        .ok_or_else(|| AppError::BadRequest("user id must not be empty".to_string()))?;

    let session_id = state
        .hub
        .send(Lookup {
            user_id: user_id.clone(),
        })
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "connected": session_id.is_some(),
        "session_id": session_id,
    })))
}

/// Connection counts
///
/// Endpoint: GET /api/v1/ws/metrics
pub async fn ws_metrics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = state.hub.send(Stats).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Users that currently have a registered session
///
/// Endpoint: GET /api/v1/ws/users
pub async fn list_connected_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let user_ids = state.hub.send(ConnectedUsers).await?;

    Ok(HttpResponse::Ok().json(json!({
        "count": user_ids.len(),
        "users": user_ids,
    })))
}

/// Register status routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/ws")
            .route("/status/{user_id}", web::get().to(ws_status))
            .route("/metrics", web::get().to(ws_metrics))
            .route("/users", web::get().to(list_connected_users)),
    );
}
