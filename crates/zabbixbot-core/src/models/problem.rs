//! Problem data model

use serde::{Deserialize, Serialize};

/// Zabbix host group identifier
pub type GroupId = u64;

/// Highest severity Zabbix reports ("disaster")
pub const MAX_SEVERITY: u8 = 5;

/// Whether the trigger behind a problem is currently evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerStatus {
    /// Trigger is enabled (`"0"` on the wire)
    #[default]
    Enabled,
    /// Trigger is disabled (`"1"` on the wire)
    Disabled,
}

impl TriggerStatus {
    /// Parse the string-encoded status returned by `trigger.get`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "0" => Some(Self::Enabled),
            "1" => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Check whether the trigger is disabled
    pub fn is_disabled(self) -> bool {
        self == Self::Disabled
    }
}

/// A problem event as reported by `problem.get`
///
/// Only lives for the duration of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemEvent {
    /// Event ID (backend sort key)
    pub event_id: String,

    /// ID of the trigger that produced the problem
    pub trigger_id: String,

    /// Unix timestamp the problem was opened at
    pub opened_at: i64,

    /// Whether the backend reported a recovery (`r_clock` other than `"0"`)
    pub resolved: bool,

    /// Unix timestamp of recovery, when it could be read
    pub resolved_at: Option<i64>,

    /// Severity, 0 (not classified) to 5 (disaster)
    pub severity: u8,
}

impl ProblemEvent {
    /// Check whether the problem has recovered
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Trigger details fetched per problem event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInfo {
    /// Human-readable trigger description
    pub description: String,

    /// Technical name of the owning host
    pub host_name: String,

    /// Trigger status
    pub status: TriggerStatus,
}

/// A problem joined with its trigger, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    /// Trigger description
    pub description: String,

    /// Elapsed time since the problem opened, e.g. `"0d 1h 1m"`
    pub age_text: String,

    /// Whether the problem has recovered
    pub resolved: bool,

    /// Severity, 0 to 5
    pub severity: u8,

    /// Status of the trigger that raised the problem
    pub trigger_status: TriggerStatus,
}

/// Problems of one host, in event processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProblems {
    /// Host name exactly as returned by the backend
    pub host: String,

    /// Problems on this host
    pub problems: Vec<ProblemRecord>,
}

/// Problems grouped by host name
///
/// Hosts keep the order in which their first problem was appended. A host
/// without qualifying problems is absent rather than present with an empty
/// list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedResult {
    hosts: Vec<HostProblems>,
}

impl AggregatedResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the host's list, creating the entry on first sight
    pub fn append(&mut self, host: &str, record: ProblemRecord) {
        match self.hosts.iter_mut().find(|entry| entry.host == host) {
            Some(entry) => entry.problems.push(record),
            None => self.hosts.push(HostProblems {
                host: host.to_string(),
                problems: vec![record],
            }),
        }
    }

    /// Get the problems recorded for a host
    pub fn get(&self, host: &str) -> Option<&[ProblemRecord]> {
        self.hosts
            .iter()
            .find(|entry| entry.host == host)
            .map(|entry| entry.problems.as_slice())
    }

    /// Host names in insertion order
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|entry| entry.host.as_str())
    }

    /// Iterate over hosts and their problems in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &HostProblems> {
        self.hosts.iter()
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// True when no host holds a problem
    pub fn is_empty(&self) -> bool {
        self.hosts.iter().all(|entry| entry.problems.is_empty())
    }

    /// Total number of problems across all hosts
    pub fn total_problems(&self) -> usize {
        self.hosts.iter().map(|entry| entry.problems.len()).sum()
    }
}

impl<'a> IntoIterator for &'a AggregatedResult {
    type Item = &'a HostProblems;
    type IntoIter = std::slice::Iter<'a, HostProblems>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str) -> ProblemRecord {
        ProblemRecord {
            description: description.to_string(),
            age_text: "0d 0h 5m".to_string(),
            resolved: false,
            severity: 3,
            trigger_status: TriggerStatus::Enabled,
        }
    }

    #[test]
    fn test_append_groups_by_host_in_insertion_order() {
        let mut result = AggregatedResult::new();
        result.append("srv2", record("disk full"));
        result.append("srv1", record("CPU high"));
        result.append("srv2", record("swap low"));

        let hosts: Vec<&str> = result.hosts().collect();
        assert_eq!(hosts, vec!["srv2", "srv1"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_problems(), 3);

        let srv2 = result.get("srv2").unwrap();
        assert_eq!(srv2[0].description, "disk full");
        assert_eq!(srv2[1].description, "swap low");
    }

    #[test]
    fn test_host_names_are_case_sensitive() {
        let mut result = AggregatedResult::new();
        result.append("SRV1", record("a"));
        result.append("srv1", record("b"));

        assert_eq!(result.len(), 2);
        assert!(result.get("Srv1").is_none());
    }

    #[test]
    fn test_empty_result() {
        let result = AggregatedResult::new();
        assert!(result.is_empty());
        assert_eq!(result.hosts().count(), 0);
    }

    #[test]
    fn test_trigger_status_from_wire() {
        assert_eq!(TriggerStatus::from_wire("0"), Some(TriggerStatus::Enabled));
        assert_eq!(TriggerStatus::from_wire("1"), Some(TriggerStatus::Disabled));
        assert_eq!(TriggerStatus::from_wire("2"), None);
        assert!(TriggerStatus::Disabled.is_disabled());
    }

    #[test]
    fn test_serializes_as_host_list() {
        let mut result = AggregatedResult::new();
        result.append("srv1", record("CPU high"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json[0]["host"], "srv1");
        assert_eq!(json[0]["problems"][0]["trigger_status"], "enabled");
    }
}
