use crate::error::{AppError, Result};
use crate::websocket::session::SessionSettings;
use actix_web::http::Uri;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub app_host: String,
    #[serde(default = "default_port")]
    pub app_port: u16,
    /// HTTP worker threads; actix picks one per physical core when unset
    #[serde(default)]
    pub app_workers: Option<usize>,
    #[serde(default = "default_cors_origin")]
    pub cors_allowed_origin: String,
    #[serde(default = "default_true")]
    pub cors_allow_credentials: bool,
    #[serde(default = "default_heartbeat_interval")]
    pub ws_heartbeat_interval_secs: u64,
    #[serde(default = "default_client_timeout")]
    pub ws_client_timeout_secs: u64,
    #[serde(default = "default_max_frame_size")]
    pub ws_max_frame_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_interval() -> u64 {
    5
}

fn default_client_timeout() -> u64 {
    30
}

fn default_max_frame_size() -> usize {
    256 * 1024
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from explicit key/value pairs, using the same names as the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config: Config =
            envy::from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app_port == 0 {
            return Err(AppError::Config("APP_PORT must be non-zero".into()));
        }
        if self.ws_heartbeat_interval_secs == 0 {
            return Err(AppError::Config(
                "WS_HEARTBEAT_INTERVAL_SECS must be non-zero".into(),
            ));
        }
        if self.ws_heartbeat_interval_secs >= self.ws_client_timeout_secs {
            return Err(AppError::Config(format!(
                "WS_HEARTBEAT_INTERVAL_SECS ({}) must be shorter than WS_CLIENT_TIMEOUT_SECS ({})",
                self.ws_heartbeat_interval_secs, self.ws_client_timeout_secs
            )));
        }
        if self.ws_max_frame_size == 0 {
            return Err(AppError::Config("WS_MAX_FRAME_SIZE must be non-zero".into()));
        }
        if self.app_workers == Some(0) {
            return Err(AppError::Config("APP_WORKERS must be non-zero".into()));
        }
        validate_origin(&self.cors_allowed_origin)?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            heartbeat_interval: Duration::from_secs(self.ws_heartbeat_interval_secs),
            client_timeout: Duration::from_secs(self.ws_client_timeout_secs),
            max_frame_size: self.ws_max_frame_size,
        }
    }
}

/// An allowed origin is `*` or `scheme://host[:port]`.
fn validate_origin(origin: &str) -> Result<()> {
    let origin = origin.trim();
    if origin == "*" {
        return Ok(());
    }

    let uri: Uri = origin.parse().map_err(|e| {
        AppError::Config(format!("CORS_ALLOWED_ORIGIN {origin:?} is not a valid URI: {e}"))
    })?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(AppError::Config(format!(
            "CORS_ALLOWED_ORIGIN {origin:?} must include a scheme and host"
        )));
    }
    Ok(())
}
