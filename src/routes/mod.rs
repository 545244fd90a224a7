use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::{config::Config, hub::Hub, storage::BlobStore};

pub mod upload;
pub mod ws;

/// Full HTTP surface: websocket hub, uploads, uploaded blobs and the static UI.
pub fn app(cfg: Arc<Config>, hub: Hub) -> Router {
    let store = BlobStore::new(&cfg.upload_dir);

    Router::new()
        .merge(ws::router())
        .merge(upload::router())
        .nest_service("/uploads", ServeDir::new(store.dir()))
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(Extension(hub))
        .layer(Extension(store))
        .layer(Extension(cfg.clone()))
        .layer(DefaultBodyLimit::max(cfg.body_limit))
        .layer(RequestBodyLimitLayer::new(cfg.body_limit))
}
