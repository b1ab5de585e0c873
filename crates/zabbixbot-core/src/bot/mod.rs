//! Chat bot: command dispatch and the Telegram transport
//!
//! A [`Channel`] produces [`ChannelEvent`]s; [`serve`] hands each one to the
//! [`Dispatcher`] and sends the resulting messages back, one event at a time.

mod command;
mod dispatcher;
mod push;
mod telegram;

pub use command::BotCommand;
pub use dispatcher::{Dispatcher, GREETING};
pub use push::PushScheduler;
pub use telegram::{chunk_message, TelegramChannel, MAX_MESSAGE_LEN};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// An event received from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A regular text message
    Message {
        /// Chat the message was sent in
        chat_id: i64,
        /// Message ID, used for replies
        message_id: i64,
        /// Sender display name
        user_name: String,
        /// Message text
        text: String,
    },

    /// A slash command such as `/start`
    Command {
        /// Chat the command was sent in
        chat_id: i64,
        /// Message ID, used for replies
        message_id: i64,
        /// Sender display name
        user_name: String,
        /// Command name without the slash or `@botname` suffix
        command: String,
        /// Full original text
        text: String,
    },
}

impl ChannelEvent {
    /// Chat the event came from
    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Message { chat_id, .. } | Self::Command { chat_id, .. } => *chat_id,
        }
    }
}

/// A message to send through a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination chat
    pub chat_id: i64,
    /// Message body
    pub text: String,
    /// Message to reply to
    pub reply_to: Option<i64>,
    /// Ask the transport to interpret Markdown
    pub markdown: bool,
}

impl OutboundMessage {
    /// A Markdown message
    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            markdown: true,
        }
    }

    /// A plain-text message
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            markdown: false,
        }
    }

    /// A plain-text reply to `message_id`
    pub fn reply(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: Some(message_id),
            markdown: false,
        }
    }
}

/// Chat transport errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The chat API rejected the request
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ChannelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Trait for messaging channel integrations
///
/// Implementations run a receive loop that produces [`ChannelEvent`]s and
/// can send outbound messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Run the receive loop, sending events to `tx` until `cancel` fires
    async fn run(&self, tx: Sender<ChannelEvent>, cancel: CancellationToken);

    /// Send a message through this channel
    async fn send_message(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Receive events from `channel`, dispatch them and send the replies.
///
/// Returns once `cancel` fires or the channel's receive loop ends.
pub async fn serve(
    channel: Arc<dyn Channel>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    let (tx, mut rx) = mpsc::channel::<ChannelEvent>(64);

    let receiver = channel.clone();
    let receive_cancel = cancel.clone();
    let receive_handle = tokio::spawn(async move {
        receiver.run(tx, receive_cancel).await;
    });

    info!(channel = channel.name(), "Bot is started");

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        for message in dispatcher.handle(&event).await {
            if let Err(e) = channel.send_message(&message).await {
                error!(channel = channel.name(), chat_id = message.chat_id, error = %e, "Failed to send message");
            }
        }
    }

    cancel.cancel();
    let _ = receive_handle.await;
    info!(channel = channel.name(), "Bot stopped");
}
