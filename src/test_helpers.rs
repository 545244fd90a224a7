use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tempfile::TempDir;

use crate::{config::Config, hub::Hub, routes};

pub const WELCOME: &str = "welcome aboard";

/// Router over scratch static/upload dirs. Keep the `TempDir` alive.
pub fn test_app() -> (Router, Hub, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let static_dir = tmp.path().join("public");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<h1>hub</h1>").unwrap();

    let cfg = Config {
        static_dir,
        upload_dir: tmp.path().join("uploads"),
        welcome: WELCOME.into(),
        ..Config::default()
    };
    let hub = Hub::new(cfg.conn_buffer);
    (routes::app(Arc::new(cfg), hub.clone()), hub, tmp)
}

/// Serves `app` on an ephemeral localhost port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

/// Single-part `multipart/form-data` body: (content-type header, body).
pub fn multipart(field: &str, filename: Option<&str>, mime: &str, data: &str) -> (String, String) {
    let boundary = "hubtestboundary";
    let disposition = match filename {
        Some(f) => format!("form-data; name=\"{field}\"; filename=\"{f}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let body = format!(
        "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: {mime}\r\n\r\n{data}\r\n--{boundary}--\r\n"
    );
    (format!("multipart/form-data; boundary={boundary}"), body)
}
