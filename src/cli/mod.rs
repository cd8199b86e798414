//! CLI module for Tubecast.

pub mod preflight;

use clap::Parser;

/// Tubecast - video links in, audio attachments out
///
/// Runs a Telegram bot in the foreground. Send it a YouTube link and it
/// replies with the audio, split into parts when it is too large for one
/// message.
#[derive(Parser, Debug)]
#[command(name = "tubecast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Cookie file passed to yt-dlp for sites that need a session
    #[arg(long, env = "YTDLP_COOKIES")]
    pub cookies: Option<String>,
}

impl Cli {
    /// Log filter directive derived from `-v` flags, falling back to the
    /// configured level when none are given.
    pub fn log_directive(&self, configured_level: &str) -> String {
        let level = match self.verbose {
            0 => configured_level,
            1 => "debug",
            _ => "trace",
        };
        format!("tubecast={}", level)
    }
}
