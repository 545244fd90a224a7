//! Wire model shared by replay, live broadcast and upload notices.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppResult;

/// A serialized message, encoded once and shared by every recipient.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        content: String,
        /// Any extra client fields, relayed untouched.
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    File {
        filename:     String,
        originalname: String,
        mimetype:     String,
        size:         u64,
        #[serde(flatten)]
        extra:        Map<String, Value>,
    },
}

impl Message {
    pub fn text(content: impl Into<String>) -> Self {
        Message::Text { content: content.into(), extra: Map::new() }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn encode(&self) -> AppResult<Frame> {
        Ok(serde_json::to_string(self)?.into())
    }
}
