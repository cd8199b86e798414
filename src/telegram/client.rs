//! Minimal HTTP client for the Telegram Bot API.

use super::{AudioAttachment, Messenger, Update, User};
use crate::config::Settings;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, instrument};

/// Extra time allowed on top of the long-poll timeout before the HTTP
/// request itself is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Upper bound for a single upload.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client for `token` against the Bot API at `api_url`.
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    /// Create a client from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let token = settings
            .token()
            .ok_or_else(|| RelayError::Config("Bot token not set".to_string()))?;
        Ok(Self::new(&settings.telegram.api_url, token))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Send a prepared request and unwrap the API envelope.
    ///
    /// The URL embeds the bot token, so it is stripped from transport errors.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| RelayError::Http(e.without_url()))?;
        let status = response.status();

        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            RelayError::Telegram(format!(
                "{} returned an unreadable response ({}): {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        if !body.ok {
            return Err(RelayError::Telegram(format!(
                "{} failed with code {}: {}",
                method,
                body.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                body.description.unwrap_or_else(|| "no description".to_string())
            )));
        }

        body.result
            .ok_or_else(|| RelayError::Telegram(format!("{} returned no result", method)))
    }

    /// Identify the bot. Used at startup to check the token.
    pub async fn get_me(&self) -> Result<User> {
        let request = self.client.post(self.method_url("getMe"));
        self.call("getMe", request).await
    }

    /// Long-poll for new updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let request = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + POLL_GRACE)
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }));

        self.call("getUpdates", request).await
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }));

        let _: serde_json::Value = self.call("sendMessage", request).await?;
        Ok(())
    }

    /// Build the multipart form for an audio upload.
    async fn build_audio_form(&self, chat_id: i64, audio: &AudioAttachment) -> Result<Form> {
        let file_bytes = fs::read(&audio.path).await?;

        let file_part = Part::bytes(file_bytes)
            .file_name(audio.file_name.clone())
            .mime_str(mime_type(&audio.path))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("audio", file_part);

        if let Some(caption) = &audio.caption {
            form = form.text("caption", caption.clone());
        }

        Ok(form)
    }

    /// Upload an audio file.
    #[instrument(skip(self, audio), fields(file = %audio.file_name))]
    pub async fn send_audio(&self, chat_id: i64, audio: &AudioAttachment) -> Result<()> {
        let form = self.build_audio_form(chat_id, audio).await?;

        debug!("Uploading {}", audio.path.display());

        let request = self
            .client
            .post(self.method_url("sendAudio"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form);

        let _: serde_json::Value = self.call("sendAudio", request).await?;
        Ok(())
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }

    async fn send_audio(&self, chat_id: i64, audio: &AudioAttachment) -> Result<()> {
        TelegramClient::send_audio(self, chat_id, audio).await
    }
}
