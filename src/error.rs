use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Bad request: {0}")]
    Bad(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config: {0}")]
    Config(String),

    #[error("Codec: {0}")]
    Codec(#[from] serde_json::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let (code, body) = match self {
            AppErr::Bad(msg) => (StatusCode::BAD_REQUEST, msg),
            AppErr::Codec(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            other            => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (code, body).into_response()
    }
}

/* ── helpers: wrap any error as Bad / Io ── */
pub fn bad<E: Display>(e: E) -> AppErr { AppErr::Bad(e.to_string()) }
pub fn io<E: Into<std::io::Error>>(e: E) -> AppErr {
    AppErr::Io(e.into())
}
