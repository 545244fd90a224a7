use axum::{extract::multipart::Multipart, routing::post, Extension, Router};
use tracing::{info, warn};

use crate::{
    error::{bad, AppResult},
    hub::Hub,
    message::Message,
    storage::{BlobStore, StoredBlob},
};

pub fn router() -> Router {
    Router::new().route("/upload", post(upload_file))
}

/// Stores the `file` part and announces it to every connected client.
/// The reply only reflects whether the file was stored.
pub async fn upload_file(
    Extension(hub): Extension<Hub>,
    Extension(store): Extension<BlobStore>,
    mut mp: Multipart,
) -> AppResult<&'static str> {
    while let Some(field) = mp.next_field().await.map_err(bad)? {
        if field.name() != Some("file") {
            continue;
        }
        // browsers send `filename=""` when nothing was picked
        let Some(originalname) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned) else {
            continue;
        };
        let mimetype = field
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| mime_guess::from_path(&originalname).first_or_octet_stream().to_string());

        let blob = store.store(&originalname, field).await?;
        info!(stored = %blob.filename, original = %originalname, size = blob.size, "file uploaded");

        notify(&hub, blob, originalname, mimetype).await;
        return Ok("File uploaded successfully.");
    }
    Err(bad("No file uploaded."))
}

/// Turns a stored upload into a `file` message on the normal publish path.
pub async fn notify(hub: &Hub, blob: StoredBlob, originalname: String, mimetype: String) {
    let msg = Message::File {
        filename: blob.filename,
        originalname,
        mimetype,
        size: blob.size,
        extra: Default::default(),
    };
    if let Err(e) = hub.publish(&msg).await {
        warn!(error = %e, "upload broadcast failed");
    }
}
