mod config;
mod error;
mod history;
mod hub;
mod message;
mod netaddr;
mod routes;
mod storage;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{config::Config, hub::Hub};
use error::AppErr;

#[tokio::main]
async fn main() -> Result<(), AppErr> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Arc::new(Config::from_env()?);
    let hub = Hub::new(cfg.conn_buffer);
    let app = routes::app(cfg.clone(), hub);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr()?).await?;
    tracing::info!("Server is listening on http://{}:{}", netaddr::local_ip(), cfg.port);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
