//! Problem aggregation
//!
//! Fetches the problems of a host group, keeps those at or above the minimum
//! severity, correlates each with its trigger and groups them by host.

mod duration;

pub use duration::format_duration;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::models::{AggregatedResult, GroupId, ProblemEvent, ProblemRecord, TriggerInfo};
use crate::zabbix::{
    JsonRpc, MalformedField, ProblemQuery, RawProblem, RawTrigger, RpcError, TriggerQuery,
    PROBLEM_GET, TRIGGER_GET,
};

/// Reason a group could not be aggregated
#[derive(Debug, thiserror::Error)]
pub enum SourceFault {
    /// The RPC call failed
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// `trigger.get` returned no trigger for an event
    #[error("no trigger returned for trigger id {0}")]
    MissingTrigger(String),

    /// A backend object carried an unusable field
    #[error(transparent)]
    Malformed(#[from] MalformedField),

    /// A result did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Aggregation errors
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// The backend could not provide the group's problems
    #[error("problem source unavailable for group {group_id}: {cause}")]
    SourceUnavailable {
        /// Group being aggregated
        group_id: GroupId,
        /// Underlying fault
        #[source]
        cause: SourceFault,
    },
}

impl AggregationError {
    fn unavailable(group_id: GroupId, cause: impl Into<SourceFault>) -> Self {
        Self::SourceUnavailable {
            group_id,
            cause: cause.into(),
        }
    }

    /// Group the failure belongs to
    pub fn group_id(&self) -> GroupId {
        match self {
            Self::SourceUnavailable { group_id, .. } => *group_id,
        }
    }
}

/// Outcome of aggregating one group out of several
pub type GroupOutcome = (GroupId, Result<AggregatedResult, AggregationError>);

/// Builds host-grouped problem lists from the Zabbix API
///
/// All calls are sequential: one `problem.get`, then one `trigger.get` per
/// qualifying event.
#[derive(Clone)]
pub struct ProblemAggregator {
    rpc: Arc<dyn JsonRpc>,
    auth_token: String,
}

impl ProblemAggregator {
    /// Create an aggregator over an RPC endpoint
    pub fn new(rpc: Arc<dyn JsonRpc>, auth_token: impl Into<String>) -> Self {
        Self {
            rpc,
            auth_token: auth_token.into(),
        }
    }

    /// Aggregate the problems of one group.
    ///
    /// `now` is a unix timestamp used for the age of each problem. Any
    /// failure aborts the whole group; partial results are never returned.
    pub async fn aggregate(
        &self,
        group_id: GroupId,
        min_severity: u8,
        now: i64,
    ) -> Result<AggregatedResult, AggregationError> {
        let events = self
            .fetch_events(group_id, min_severity)
            .await
            .map_err(|cause| AggregationError::unavailable(group_id, cause))?;

        debug!(group_id, count = events.len(), min_severity, "Qualifying problems");

        let mut result = AggregatedResult::new();
        for event in &events {
            let trigger = self
                .fetch_trigger(&event.trigger_id)
                .await
                .map_err(|cause| {
                    error!(group_id, trigger_id = %event.trigger_id, error = %cause, "Trigger lookup failed");
                    AggregationError::unavailable(group_id, cause)
                })?;

            let record = ProblemRecord {
                description: trigger.description,
                age_text: format_duration(now.abs_diff(event.opened_at)),
                resolved: event.is_resolved(),
                severity: event.severity,
                trigger_status: trigger.status,
            };
            result.append(&trigger.host_name, record);
        }

        info!(
            group_id,
            hosts = result.len(),
            problems = result.total_problems(),
            "Aggregated problems"
        );

        Ok(result)
    }

    /// Aggregate several groups in the given order.
    ///
    /// Each group succeeds or fails on its own.
    pub async fn aggregate_groups(
        &self,
        group_ids: &[GroupId],
        min_severity: u8,
        now: i64,
    ) -> Vec<GroupOutcome> {
        let mut outcomes = Vec::with_capacity(group_ids.len());
        for &group_id in group_ids {
            let outcome = self.aggregate(group_id, min_severity, now).await;
            outcomes.push((group_id, outcome));
        }
        outcomes
    }

    /// Raw `problem.get` result for a group
    pub async fn raw_problems(&self, group_id: GroupId) -> Result<Value, AggregationError> {
        self.problem_get(group_id)
            .await
            .map_err(|cause| AggregationError::unavailable(group_id, cause))
    }

    async fn problem_get(&self, group_id: GroupId) -> Result<Value, SourceFault> {
        let params = serde_json::to_value(ProblemQuery::for_group(group_id))?;
        let result = self.rpc.call(PROBLEM_GET, params, &self.auth_token).await?;
        Ok(result)
    }

    async fn fetch_events(
        &self,
        group_id: GroupId,
        min_severity: u8,
    ) -> Result<Vec<ProblemEvent>, SourceFault> {
        let raw: Vec<RawProblem> = serde_json::from_value(self.problem_get(group_id).await?)?;

        let mut events = Vec::new();
        for problem in raw {
            // Events below the threshold are dropped before the rest is read.
            if problem.severity()? < min_severity {
                continue;
            }
            events.push(ProblemEvent::try_from(problem)?);
        }
        Ok(events)
    }

    async fn fetch_trigger(&self, trigger_id: &str) -> Result<TriggerInfo, SourceFault> {
        let params = serde_json::to_value(TriggerQuery::for_trigger(trigger_id))?;
        let result = self.rpc.call(TRIGGER_GET, params, &self.auth_token).await?;

        let raw: Vec<RawTrigger> = serde_json::from_value(result)?;
        let trigger = raw
            .into_iter()
            .next()
            .ok_or_else(|| SourceFault::MissingTrigger(trigger_id.to_string()))?;

        Ok(TriggerInfo::try_from(trigger)?)
    }
}
