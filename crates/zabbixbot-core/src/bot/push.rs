//! Scheduled push of problem reports

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{Channel, Dispatcher};

/// Periodically pushes problem reports to one chat
pub struct PushScheduler {
    dispatcher: Arc<Dispatcher>,
    channel: Arc<dyn Channel>,
    chat_id: i64,
    period: Duration,
}

impl PushScheduler {
    /// Create a scheduler pushing to `chat_id` every `period`
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        channel: Arc<dyn Channel>,
        chat_id: i64,
        period: Duration,
    ) -> Self {
        Self {
            dispatcher,
            channel,
            chat_id,
            period,
        }
    }

    /// Run until `cancel` fires. The first push happens immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(chat_id = self.chat_id, period = ?self.period, "Starting scheduled push");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let sent = self.push_once(Utc::now().timestamp()).await;
                    debug!(chat_id = self.chat_id, sent, "Scheduled push done");
                }
            }
        }

        info!(chat_id = self.chat_id, "Scheduled push stopped");
    }

    /// Push one report, returning the number of messages delivered
    pub async fn push_once(&self, now: i64) -> usize {
        let mut sent = 0;
        for message in self.dispatcher.scheduled_report(self.chat_id, now).await {
            match self.channel.send_message(&message).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!(chat_id = self.chat_id, error = %e, "Scheduled push failed");
                }
            }
        }
        sent
    }
}
