//! Tubecast - video links in, audio attachments out
//!
//! A Telegram bot that takes a YouTube link, downloads the audio with yt-dlp,
//! splits it into parts that fit under the upload limit and sends them back.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `audio_source` - Link recognition for inbound messages
//! - `audio` - yt-dlp, ffprobe and ffmpeg integration
//! - `segment` - Size-bounded segment planning
//! - `filename` - Filesystem-safe names from titles
//! - `telegram` - Bot API client and polling loop
//! - `orchestrator` - Per-request pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tubecast::audio_source::parse_request;
//! use tubecast::config::Settings;
//! use tubecast::orchestrator::Orchestrator;
//! use tubecast::telegram::TelegramClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Arc::new(Settings::load()?);
//!     let client = Arc::new(TelegramClient::from_settings(&settings)?);
//!     let orchestrator = Orchestrator::new(settings, client)?;
//!
//!     let request = parse_request("https://youtu.be/dQw4w9WgXcQ").unwrap();
//!     let report = orchestrator.process(123456789, &request).await;
//!     println!("Delivered parts: {:?}", report.delivered());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audio_source;
pub mod cli;
pub mod config;
pub mod error;
pub mod filename;
pub mod orchestrator;
pub mod segment;
pub mod telegram;

pub use error::{RelayError, Result};
