//! Alert document model
//!
//! Defines the alert record shape shared by the repository, the dispatcher
//! and the notifier, plus the status/severity enums and the aggregate count
//! structures returned by list requests.
//!
//! Alerts carry an open-ended set of domain fields (host, resource, event,
//! ...) on top of the attributes the core reasons about, so the model keeps
//! a flattened map for everything it does not interpret.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Alert lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Open,
    Ack,
    Closed,
    /// Anything else found in a stored document
    Unknown,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "OPEN",
            AlertStatus::Ack => "ACK",
            AlertStatus::Closed => "CLOSED",
            AlertStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(AlertStatus::Open),
            "ACK" => Some(AlertStatus::Ack),
            "CLOSED" => Some(AlertStatus::Closed),
            _ => None,
        }
    }
}

impl Serialize for AlertStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AlertStatus::from_str(&s).unwrap_or(AlertStatus::Unknown))
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Critical,
    Major,
    Minor,
    Warning,
    Normal,
    Inform,
    Debug,
    /// Anything else found in a stored document
    Unknown,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "CRITICAL",
            AlertSeverity::Major => "MAJOR",
            AlertSeverity::Minor => "MINOR",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Normal => "NORMAL",
            AlertSeverity::Inform => "INFORM",
            AlertSeverity::Debug => "DEBUG",
            AlertSeverity::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Some(AlertSeverity::Critical),
            "MAJOR" => Some(AlertSeverity::Major),
            "MINOR" => Some(AlertSeverity::Minor),
            "WARNING" => Some(AlertSeverity::Warning),
            "NORMAL" => Some(AlertSeverity::Normal),
            "INFORM" => Some(AlertSeverity::Inform),
            "DEBUG" => Some(AlertSeverity::Debug),
            _ => None,
        }
    }
}

impl Serialize for AlertSeverity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertSeverity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AlertSeverity::from_str(&s).unwrap_or(AlertSeverity::Unknown))
    }
}

// ============================================================================
// Timestamp serialization
// ============================================================================

/// ISO-8601 with millisecond precision and a "Z" suffix, e.g.
/// `2024-05-01T12:30:45.123Z`. This is the wire format for every timestamp
/// the API emits.
pub mod iso_millis {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn to_string(dt: &DateTime<Utc>) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
            .ok()
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_string(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}

/// `Option` wrapper around [`iso_millis`]
pub mod iso_millis_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => super::iso_millis::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            Some(s) => super::iso_millis::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Main models
// ============================================================================

/// One entry in an alert's append-only status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: AlertStatus,
    #[serde(rename = "updateTime", with = "iso_millis")]
    pub update_time: DateTime<Utc>,
}

/// An alert record
///
/// `id` is the store's primary key, renamed from the internal identifier on
/// the way out so clients never see the storage field name. `history` only
/// ever grows via atomic appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub alert_type: Option<String>,
    pub status: AlertStatus,
    pub severity: AlertSeverity,
    #[serde(
        rename = "createTime",
        default,
        with = "iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "receiveTime",
        default,
        with = "iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub receive_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "lastReceiveTime",
        default,
        with = "iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_receive_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Domain fields the core does not interpret (host, resource, event, ...)
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Aggregate counts
// ============================================================================

/// Alert counts by status over a listed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: i64,
    pub ack: i64,
    pub closed: i64,
}

/// Alert counts by severity, restricted to OPEN alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: i64,
    pub major: i64,
    pub minor: i64,
    pub warning: i64,
    pub normal: i64,
    pub inform: i64,
    pub debug: i64,
}

/// Compute status and severity tallies in one pass over a result sequence.
///
/// Only OPEN alerts contribute to the severity counts; unrecognized
/// severities are not counted at all.
pub fn tally_counts(alerts: &[Alert]) -> (StatusCounts, SeverityCounts) {
    let mut status = StatusCounts::default();
    let mut severity = SeverityCounts::default();

    for alert in alerts {
        match alert.status {
            AlertStatus::Open => status.open += 1,
            AlertStatus::Ack => status.ack += 1,
            AlertStatus::Closed => status.closed += 1,
            AlertStatus::Unknown => {}
        }

        if alert.status != AlertStatus::Open {
            continue;
        }
        match alert.severity {
            AlertSeverity::Critical => severity.critical += 1,
            AlertSeverity::Major => severity.major += 1,
            AlertSeverity::Minor => severity.minor += 1,
            AlertSeverity::Warning => severity.warning += 1,
            AlertSeverity::Normal => severity.normal += 1,
            AlertSeverity::Inform => severity.inform += 1,
            AlertSeverity::Debug => severity.debug += 1,
            AlertSeverity::Unknown => {}
        }
    }

    (status, severity)
}
