//! Resources owned by the backend, as the console receives them.
//!
//! The backend is the sole owner of these records and their lifecycle.
//! Decoding is deliberately tolerant: unknown enum values map to an
//! `Unknown` variant and unrecognised fields are kept in `extra`.

use std::str::FromStr;

use derive_more::{Display, From};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, IntoStaticStr};

/// Backend identifier; the API returns either integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(untagged)]
pub enum ResourceId {
    #[display("{_0}")]
    Int(i64),
    #[display("{_0}")]
    Text(String),
}

impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    /// Text is an integer id only if it reads back unchanged, so `007`
    /// or `+7` stay strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Ok(Self::Int(n)),
            _ => Ok(Self::Text(s.to_owned())),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

/// Outcome of the most recent backend connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionTestStatus {
    #[serde(alias = "ok", alias = "passed")]
    Success,
    #[serde(alias = "failure", alias = "error")]
    Failed,
    #[serde(alias = "pending", alias = "never")]
    Untested,
    #[serde(other)]
    Unknown,
}

/// A saved connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ResourceId,
    pub name: String,
    #[serde(default, alias = "type", alias = "engine")]
    pub connection_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ssl_enabled: bool,
    #[serde(default)]
    pub last_test_status: Option<ConnectionTestStatus>,
    #[serde(default, with = "lenient_timestamp")]
    pub last_tested_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
    /// Engine-specific fields echoed back by the backend (account, region, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Connection {
    /// Returns an engine-specific string field from `extra`.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Status shown in lists, `untested` when the backend has none.
    pub fn test_status(&self) -> ConnectionTestStatus {
        self.last_test_status.unwrap_or(ConnectionTestStatus::Untested)
    }
}

/// Result body of a connection test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl ConnectionTestResult {
    /// A failed result carrying a display message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the backend reported a successful test.
    pub fn passed(&self) -> bool {
        self.success
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }

    /// Message to display, with a generic fallback per outcome.
    pub fn display_message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_owned(),
            _ if self.passed() => "Connection successful".to_owned(),
            _ => "Connection test failed".to_owned(),
        }
    }
}

/// Lifecycle state of an ETL pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    Draft,
    Active,
    Running,
    Paused,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A backend-defined ETL pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlPipeline {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PipelineStatus,
    #[serde(default)]
    pub source_connection_id: Option<ResourceId>,
    #[serde(default)]
    pub target_connection_id: Option<ResourceId>,
    #[serde(default, alias = "schedule_cron")]
    pub schedule: Option<String>,
    #[serde(default, with = "lenient_timestamp")]
    pub last_run_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp")]
    pub next_run_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
}

/// Body of a pipeline create or update request. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_connection_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_connection_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl PipelineDraft {
    /// Sets the pipeline name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the source and target connections.
    pub fn with_endpoints(mut self, source: ResourceId, target: ResourceId) -> Self {
        self.source_connection_id = Some(source);
        self.target_connection_id = Some(target);
        self
    }

    /// Sets the cron schedule.
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A pipeline schedule as exposed by the backend scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ResourceId,
    #[serde(default)]
    pub pipeline_id: Option<ResourceId>,
    #[serde(default, alias = "cron_expression")]
    pub cron: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, with = "lenient_timestamp")]
    pub next_run_at: Option<Timestamp>,
}

const fn enabled_by_default() -> bool {
    true
}

/// Optional timestamps that accept RFC 3339 or naive datetimes taken as UTC.
mod lenient_timestamp {
    use jiff::Timestamp;
    use jiff::civil::DateTime;
    use jiff::tz::TimeZone;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        if let Ok(ts) = raw.parse::<Timestamp>() {
            return Ok(Some(ts));
        }

        raw.parse::<DateTime>()
            .and_then(|dt| dt.to_zoned(TimeZone::UTC))
            .map(|zoned| Some(zoned.timestamp()))
            .map_err(serde::de::Error::custom)
    }
}
