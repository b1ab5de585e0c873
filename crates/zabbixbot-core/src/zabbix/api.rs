//! Request parameters and result types for the Zabbix API methods used by the bot
//!
//! Zabbix encodes numeric fields as JSON strings; the raw types accept either
//! form and convert into the typed models.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{GroupId, ProblemEvent, TriggerInfo, TriggerStatus};

/// Method listing the problems of a host group
pub const PROBLEM_GET: &str = "problem.get";

/// Method returning trigger details
pub const TRIGGER_GET: &str = "trigger.get";

/// A field of a backend object could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {field}: {value:?}")]
pub struct MalformedField {
    /// Field name on the wire
    pub field: &'static str,
    /// Offending value
    pub value: String,
}

impl MalformedField {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Parameters of `problem.get` for one host group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    output: &'static str,
    select_acknowledges: &'static str,
    select_tags: &'static str,
    select_suppression_data: &'static str,
    groupids: GroupId,
    sortfield: [&'static str; 1],
    sortorder: &'static str,
}

impl ProblemQuery {
    /// Extended problems of `group_id`, newest event first
    pub fn for_group(group_id: GroupId) -> Self {
        Self {
            output: "extend",
            select_acknowledges: "extend",
            select_tags: "extend",
            select_suppression_data: "extend",
            groupids: group_id,
            sortfield: ["eventid"],
            sortorder: "DESC",
        }
    }
}

/// Parameters of `trigger.get` for a single trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerQuery {
    triggerids: String,
    output: [&'static str; 2],
    select_hosts: [&'static str; 2],
}

impl TriggerQuery {
    /// Description, status and hosts of `trigger_id`
    pub fn for_trigger(trigger_id: impl Into<String>) -> Self {
        Self {
            triggerids: trigger_id.into(),
            output: ["description", "status"],
            select_hosts: ["host", "hostid"],
        }
    }
}

/// Problem object as returned by `problem.get`
///
/// Only the fields the bot reads are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProblem {
    /// Event ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub eventid: String,
    /// Trigger ID
    #[serde(deserialize_with = "string_or_number")]
    pub objectid: String,
    /// Open time (unix seconds)
    #[serde(deserialize_with = "string_or_number")]
    pub clock: String,
    /// Recovery time, `"0"` while open
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub r_clock: String,
    /// Severity
    #[serde(deserialize_with = "string_or_number")]
    pub severity: String,
    /// Problem name
    #[serde(default)]
    pub name: String,
}

impl RawProblem {
    /// Parsed severity
    pub fn severity(&self) -> Result<u8, MalformedField> {
        self.severity
            .trim()
            .parse::<u8>()
            .map_err(|_| MalformedField::new("severity", &self.severity))
    }
}

impl TryFrom<RawProblem> for ProblemEvent {
    type Error = MalformedField;

    fn try_from(raw: RawProblem) -> Result<Self, Self::Error> {
        let severity = raw.severity()?;
        let opened_at = raw
            .clock
            .trim()
            .parse::<i64>()
            .map_err(|_| MalformedField::new("clock", &raw.clock))?;

        // Anything but "0" counts as recovered, even when unreadable.
        let r_clock = raw.r_clock.trim();
        let resolved = r_clock != "0";
        let resolved_at = if resolved { r_clock.parse::<i64>().ok() } else { None };

        Ok(ProblemEvent {
            event_id: raw.eventid,
            trigger_id: raw.objectid,
            opened_at,
            resolved,
            resolved_at,
            severity,
        })
    }
}

/// Host reference embedded in a trigger
#[derive(Debug, Clone, Deserialize)]
pub struct RawHost {
    /// Host ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub hostid: String,
    /// Technical host name
    pub host: String,
}

/// Trigger object as returned by `trigger.get`
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrigger {
    /// Trigger ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub triggerid: String,
    /// Trigger description
    #[serde(default)]
    pub description: String,
    /// `"0"` enabled, `"1"` disabled
    #[serde(deserialize_with = "string_or_number")]
    pub status: String,
    /// Hosts the trigger belongs to
    #[serde(default)]
    pub hosts: Vec<RawHost>,
}

impl TryFrom<RawTrigger> for TriggerInfo {
    type Error = MalformedField;

    fn try_from(raw: RawTrigger) -> Result<Self, Self::Error> {
        let status = TriggerStatus::from_wire(raw.status.trim())
            .ok_or_else(|| MalformedField::new("status", &raw.status))?;
        let host_name = raw
            .hosts
            .into_iter()
            .next()
            .map(|host| host.host)
            .ok_or_else(|| MalformedField::new("hosts", "[]"))?;

        Ok(TriggerInfo {
            description: raw.description,
            host_name,
            status,
        })
    }
}

fn zero() -> String {
    "0".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}
