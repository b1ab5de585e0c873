//! Maps chat commands to problem reports

use chrono::Utc;
use tracing::{debug, error, info};

use super::command::BotCommand;
use super::{ChannelEvent, OutboundMessage};
use crate::aggregator::ProblemAggregator;
use crate::config::GroupsConfig;
use crate::formatter::{Formatter, NOTHING_TO_SHOW};
use crate::models::GroupId;

/// Reply to `/start`
pub const GREETING: &str = "zabbix query bot";

/// Turns inbound chat events into outbound messages
pub struct Dispatcher {
    aggregator: ProblemAggregator,
    groups: GroupsConfig,
}

impl Dispatcher {
    /// Create a dispatcher over an aggregator and the configured groups
    pub fn new(aggregator: ProblemAggregator, groups: GroupsConfig) -> Self {
        Self { aggregator, groups }
    }

    /// Handle an event using the current time
    pub async fn handle(&self, event: &ChannelEvent) -> Vec<OutboundMessage> {
        self.handle_at(event, Utc::now().timestamp()).await
    }

    /// Handle an event, computing problem ages against `now`
    pub async fn handle_at(&self, event: &ChannelEvent, now: i64) -> Vec<OutboundMessage> {
        match event {
            ChannelEvent::Message {
                chat_id,
                message_id,
                text,
                ..
            } => vec![OutboundMessage::reply(*chat_id, *message_id, text.clone())],
            ChannelEvent::Command {
                chat_id,
                message_id,
                user_name,
                command,
                text,
                ..
            } => match BotCommand::from_name(command) {
                Some(BotCommand::Start) => {
                    vec![OutboundMessage::reply(*chat_id, *message_id, GREETING)]
                }
                Some(BotCommand::IloProblems) => {
                    info!(chat_id, user = %user_name, command = %command, "Problem report requested");
                    self.command_report(*chat_id, &[self.groups.ilo_group], Formatter::new(), now)
                        .await
                }
                Some(BotCommand::AgentProblems) => {
                    info!(chat_id, user = %user_name, command = %command, "Problem report requested");
                    let formatter = Formatter::new().mark_disabled_triggers(true);
                    self.command_report(*chat_id, &self.groups.agent_groups, formatter, now)
                        .await
                }
                None => {
                    debug!(chat_id, command = %command, "Unknown command, echoing");
                    vec![OutboundMessage::reply(*chat_id, *message_id, text.clone())]
                }
            },
        }
    }

    /// Messages for a scheduled push of every configured group.
    ///
    /// Empty when nothing qualifies; no placeholder is pushed.
    pub async fn scheduled_report(&self, chat_id: i64, now: i64) -> Vec<OutboundMessage> {
        let mut messages = self
            .problem_messages(chat_id, &[self.groups.ilo_group], Formatter::new(), now)
            .await;
        messages.extend(
            self.problem_messages(
                chat_id,
                &self.groups.agent_groups,
                Formatter::new().mark_disabled_triggers(true),
                now,
            )
            .await,
        );
        messages
    }

    async fn command_report(
        &self,
        chat_id: i64,
        group_ids: &[GroupId],
        formatter: Formatter,
        now: i64,
    ) -> Vec<OutboundMessage> {
        let messages = self.problem_messages(chat_id, group_ids, formatter, now).await;
        if messages.is_empty() {
            return vec![OutboundMessage::markdown(chat_id, NOTHING_TO_SHOW)];
        }
        messages
    }

    /// One Markdown message per host with problems, plus a plain failure
    /// notice for every group that could not be queried or rendered.
    async fn problem_messages(
        &self,
        chat_id: i64,
        group_ids: &[GroupId],
        formatter: Formatter,
        now: i64,
    ) -> Vec<OutboundMessage> {
        let outcomes = self
            .aggregator
            .aggregate_groups(group_ids, self.groups.min_severity, now)
            .await;

        let mut messages = Vec::new();
        for (group_id, outcome) in outcomes {
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!(group_id, chat_id, error = %e, "Problem query failed");
                    messages.push(OutboundMessage::plain(chat_id, failure_notice(group_id, &e)));
                    continue;
                }
            };

            if result.is_empty() {
                continue;
            }

            match formatter.render_messages(&result) {
                Ok(bodies) => messages.extend(
                    bodies
                        .into_iter()
                        .map(|body| OutboundMessage::markdown(chat_id, body)),
                ),
                Err(e) => {
                    error!(group_id, chat_id, error = %e, "Problem rendering failed");
                    messages.push(OutboundMessage::plain(chat_id, failure_notice(group_id, &e)));
                }
            }
        }
        messages
    }
}

fn failure_notice(group_id: GroupId, err: &dyn std::fmt::Display) -> String {
    format!("⚠️ Could not get problems for group {group_id}: {err}")
}
