//! Long-polling loop that turns updates into relay requests.

use super::{Messenger, TelegramClient, Update};
use crate::audio_source::{parse_request, MediaRequest};
use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Reply to `/start` and `/help`.
pub const HELP_TEXT: &str =
    "Hi! Send me a link to a YouTube video and I will send the audio back to you.";

/// Reply to anything that is not a supported link.
pub const INVALID_LINK_TEXT: &str = "Please send a valid YouTube link.";

/// Pause before polling again after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// What an inbound text asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `/start` or `/help`.
    Help,
    /// Some other bot command.
    UnknownCommand,
    /// A supported link.
    Link(MediaRequest),
    /// Anything else.
    Invalid,
}

/// Classify an inbound message text.
pub fn route(text: &str) -> Inbound {
    let text = text.trim();

    if let Some(command) = text.strip_prefix('/') {
        // Commands may be addressed as `/start@bot_name`.
        let name = command
            .split(|c: char| c.is_whitespace() || c == '@')
            .next()
            .unwrap_or_default();
        return match name {
            "start" | "help" => Inbound::Help,
            _ => Inbound::UnknownCommand,
        };
    }

    match parse_request(text) {
        Some(request) => Inbound::Link(request),
        None => Inbound::Invalid,
    }
}

/// Polls Telegram for updates and hands each one to the orchestrator on its
/// own task.
pub struct Dispatcher {
    client: Arc<TelegramClient>,
    orchestrator: Arc<Orchestrator>,
    poll_timeout_secs: u64,
    limiter: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<TelegramClient>,
        orchestrator: Arc<Orchestrator>,
        settings: &Settings,
    ) -> Self {
        Self {
            client,
            orchestrator,
            poll_timeout_secs: settings.telegram.poll_timeout_secs,
            limiter: Arc::new(Semaphore::new(settings.telegram.max_concurrent_requests)),
        }
    }

    /// Run until Ctrl+C, then wait for in-flight requests to finish.
    pub async fn run(&self) -> Result<()> {
        let mut offset = 0;
        let mut tasks = JoinSet::new();

        info!("Polling for updates");

        loop {
            let polled = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
                polled = self.client.get_updates(offset, self.poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.spawn_update(&mut tasks, update);
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch updates: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }

            while tasks.try_join_next().is_some() {}
        }

        if !tasks.is_empty() {
            info!("Waiting for {} in-flight requests", tasks.len());
        }
        while tasks.join_next().await.is_some() {}

        Ok(())
    }

    fn spawn_update(&self, tasks: &mut JoinSet<()>, update: Update) {
        let Some(message) = update.message else {
            debug!("Ignoring update {} without a message", update.update_id);
            return;
        };
        let Some(text) = message.text else {
            debug!("Ignoring non-text message {}", message.message_id);
            return;
        };

        let chat_id = message.chat.id;
        let messenger: Arc<dyn Messenger> = self.client.clone();
        let orchestrator = self.orchestrator.clone();
        let limiter = self.limiter.clone();

        tasks.spawn(async move {
            handle_text(messenger.as_ref(), &orchestrator, &limiter, chat_id, &text).await;
        });
    }
}

/// Answer one inbound text.
#[instrument(skip(messenger, orchestrator, limiter, text), fields(chat_id = chat_id))]
pub async fn handle_text(
    messenger: &dyn Messenger,
    orchestrator: &Orchestrator,
    limiter: &Semaphore,
    chat_id: i64,
    text: &str,
) {
    let reply = match route(text) {
        Inbound::Help => HELP_TEXT,
        Inbound::UnknownCommand | Inbound::Invalid => INVALID_LINK_TEXT,
        Inbound::Link(request) => {
            let Ok(_permit) = limiter.acquire().await else {
                warn!("Request limiter closed, dropping request");
                return;
            };
            let report = orchestrator.process(chat_id, &request).await;
            debug!("Request finished: {:?}", report.stage);
            return;
        }
    };

    if let Err(e) = messenger.send_text(chat_id, reply).await {
        warn!("Failed to reply: {}", e);
    }
}
