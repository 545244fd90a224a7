use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::{AppErr, AppResult};

pub const DEFAULT_WELCOME: &str = "Welcome to the WebSocket server!";

/// Runtime knobs, read once at startup from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub host:        String,
    pub port:        u16,
    pub static_dir:  PathBuf,
    pub upload_dir:  PathBuf,
    pub body_limit:  usize,
    /// Depth of each connection's outbound queue.
    pub conn_buffer: usize,
    pub welcome:     String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host:        "0.0.0.0".into(),
            port:        8080,
            static_dir:  "public".into(),
            upload_dir:  "uploads".into(),
            body_limit:  100 * 1024 * 1024,
            conn_buffer: 256,
            welcome:     DEFAULT_WELCOME.into(),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their default.
    pub fn from_lookup<F>(get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let body_limit_mb: usize = parse_or(&get, "HUB_BODY_LIMIT_MB", d.body_limit / (1024 * 1024))?;
        let conn_buffer: usize = parse_or(&get, "HUB_CONN_BUFFER", d.conn_buffer)?;
        if conn_buffer == 0 {
            return Err(AppErr::Config("HUB_CONN_BUFFER must be at least 1".into()));
        }

        Ok(Self {
            host:        get("HUB_HOST").unwrap_or(d.host),
            port:        parse_or(&get, "HUB_PORT", d.port)?,
            static_dir:  get("HUB_STATIC_DIR").map(PathBuf::from).unwrap_or(d.static_dir),
            upload_dir:  get("HUB_UPLOAD_DIR").map(PathBuf::from).unwrap_or(d.upload_dir),
            body_limit:  body_limit_mb * 1024 * 1024,
            conn_buffer,
            welcome:     get("HUB_WELCOME").unwrap_or(d.welcome),
        })
    }

    pub fn bind_addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppErr::Config(format!("HUB_HOST/HUB_PORT: {e}")))
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppErr::Config(format!("{key}={raw:?}: {e}"))),
    }
}
