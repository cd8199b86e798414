//! Telegram Bot API integration.
//!
//! Only the handful of Bot API methods the relay needs are implemented:
//! long polling for updates, text replies and audio uploads.

mod client;
mod dispatcher;

pub use client::TelegramClient;
pub use dispatcher::{handle_text, route, Dispatcher, Inbound, HELP_TEXT, INVALID_LINK_TEXT};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// An audio file to upload.
#[derive(Debug, Clone)]
pub struct AudioAttachment {
    /// File on disk.
    pub path: PathBuf,
    /// Name the recipient sees.
    pub file_name: String,
    pub caption: Option<String>,
}

/// Outbound side of a chat: everything the orchestrator sends back.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain-text message.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Upload an audio attachment.
    async fn send_audio(&self, chat_id: i64, audio: &AudioAttachment) -> Result<()>;
}
