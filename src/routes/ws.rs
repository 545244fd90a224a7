use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message as WsMsg, WebSocket, WebSocketUpgrade},
        Extension, Request,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    hub::{ConnId, Connection, Hub},
    message::{Frame, Message},
};

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
}

/// Browsers open the socket on the page's own origin, so `/` is both the
/// UI entry point and the hub endpoint.
async fn root(
    ws: Option<WebSocketUpgrade>,
    Extension(hub): Extension<Hub>,
    Extension(cfg): Extension<Arc<Config>>,
    req: Request,
) -> Response {
    if let Some(ws) = ws {
        return upgrade(ws, hub, &cfg);
    }
    match ServeFile::new(cfg.static_dir.join("index.html")).oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<Hub>,
    Extension(cfg): Extension<Arc<Config>>,
) -> Response {
    upgrade(ws, hub, &cfg)
}

fn upgrade(ws: WebSocketUpgrade, hub: Hub, cfg: &Config) -> Response {
    let welcome = Message::text(cfg.welcome.as_str()).encode();
    match welcome {
        Ok(welcome) => ws.on_upgrade(move |s| user_ws(s, hub, welcome)),
        Err(e) => e.into_response(),
    }
}

/* ---------------- per client ---------------- */
async fn user_ws(sock: WebSocket, hub: Hub, welcome: Frame) {
    let (Connection { id, mut rx, live }, history) = hub.register().await;
    info!(conn = %id, live, replay = history.len(), "client connected");

    let (mut sink, mut stream) = sock.split();

    /* replay, then welcome, to this client only */
    let mut replayed = true;
    for frame in history.chain(std::iter::once(welcome)) {
        if sink.send(WsMsg::Text(frame.to_string())).await.is_err() {
            replayed = false;
            break;
        }
    }

    if replayed {
        let writer = async {
            while let Some(frame) = rx.recv().await {
                if sink.send(WsMsg::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
        };
        let reader = async {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    WsMsg::Text(raw) => relay(&hub, id, &raw).await,
                    WsMsg::Binary(bytes) => match String::from_utf8(bytes) {
                        Ok(raw) => relay(&hub, id, &raw).await,
                        Err(e) => warn!(conn = %id, error = %e, "dropping non-utf8 frame"),
                    },
                    WsMsg::Close(_) => break,
                    _ => {}
                }
            }
        };
        tokio::select! {
            _ = writer => {},
            _ = reader => {},
        }
    }

    let live = hub.unregister(id).await.unwrap_or_default();
    info!(conn = %id, live, "client disconnected");
}

/// Malformed payloads are dropped; the connection stays open.
async fn relay(hub: &Hub, id: ConnId, raw: &str) {
    debug!(conn = %id, "received: {raw}");
    match Message::parse(raw) {
        Ok(msg) => {
            if let Err(e) = hub.publish(&msg).await {
                warn!(conn = %id, error = %e, "publish failed");
            }
        }
        Err(e) => warn!(conn = %id, error = %e, "dropping malformed message"),
    }
}
