use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub broadcast_queue_size: usize,
    pub chat_api_base: String,
    pub pending_action_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            broadcast_queue_size: parse_or_default("BROADCAST_QUEUE_SIZE", 1024)?,
            chat_api_base: env::var("CHAT_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            pending_action_ttl_secs: parse_or_default("PENDING_ACTION_TTL_SECS", 3600)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
