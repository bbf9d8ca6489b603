pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
pub use websocket::{
    ConnectionRegistry, NotificationDispatcher, NotificationHub, SessionId, UserId,
};
