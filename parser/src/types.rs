use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker written into every field of a sentinel record
pub const ERROR_MARKER: &str = "error";

pub const DEFAULT_APP: &str = "main";
pub const UNKNOWN_REVISION: &str = "unknown";

/// Deployment stage encoded in a stream or group name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Dev,
    Staging,
    Canary,
    Prod,
    /// Value taken verbatim from a structured stream path
    Unlisted(String),
}

impl Environment {
    pub const KNOWN: [Environment; 4] = [
        Environment::Dev,
        Environment::Staging,
        Environment::Canary,
        Environment::Prod,
    ];

    /// Older prod task definitions don't name their environment
    pub fn legacy_default() -> Self {
        Environment::Prod
    }

    /// Matches a single token against the known stages only
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "dev" => Some(Environment::Dev),
            "staging" => Some(Environment::Staging),
            "canary" => Some(Environment::Canary),
            "prod" => Some(Environment::Prod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Canary => "canary",
            Environment::Prod => "prod",
            Environment::Unlisted(other) => other,
        }
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        Environment::from_token(value).unwrap_or_else(|| Environment::Unlisted(value.to_string()))
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Environment::from(value.as_str())
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functional role of a deployed unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskRole {
    Web,
    Worker,
    Migrate,
    Unlisted(String),
}

impl TaskRole {
    pub const KNOWN: [TaskRole; 3] = [TaskRole::Web, TaskRole::Worker, TaskRole::Migrate];

    /// Older web task definitions don't name their task type
    pub fn legacy_default() -> Self {
        TaskRole::Web
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "web" => Some(TaskRole::Web),
            "worker" => Some(TaskRole::Worker),
            "migrate" => Some(TaskRole::Migrate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskRole::Web => "web",
            TaskRole::Worker => "worker",
            TaskRole::Migrate => "migrate",
            TaskRole::Unlisted(other) => other,
        }
    }
}

impl From<&str> for TaskRole {
    fn from(value: &str) -> Self {
        TaskRole::from_token(value).unwrap_or_else(|| TaskRole::Unlisted(value.to_string()))
    }
}

impl From<String> for TaskRole {
    fn from(value: String) -> Self {
        TaskRole::from(value.as_str())
    }
}

impl From<TaskRole> for String {
    fn from(value: TaskRole) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment identity recovered from a stream id or its group name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamIdentity {
    pub platform: String,
    pub environment: Environment,
    pub project: String,
    pub app: String,
    pub task: TaskRole,
    pub revision: String,
}

/// Result of running the registry over a `(stream_id, group_name)` pair
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(StreamIdentity),
    Unparseable {
        raw_stream_id: String,
        raw_group_name: String,
        reason: String,
    },
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn identity(&self) -> Option<&StreamIdentity> {
        match self {
            ParseOutcome::Parsed(identity) => Some(identity),
            ParseOutcome::Unparseable { .. } => None,
        }
    }

    /// Flattens the outcome into the string record shipped with every event.
    /// Unparseable input keeps the raw stream id in `project` and the raw
    /// group name in `app`.
    pub fn components(&self) -> StreamComponents {
        match self {
            ParseOutcome::Parsed(identity) => StreamComponents {
                platform: identity.platform.clone(),
                environment: identity.environment.to_string(),
                project: identity.project.clone(),
                app: identity.app.clone(),
                task: identity.task.to_string(),
                revision: identity.revision.clone(),
            },
            ParseOutcome::Unparseable {
                raw_stream_id,
                raw_group_name,
                ..
            } => StreamComponents {
                platform: ERROR_MARKER.to_string(),
                environment: ERROR_MARKER.to_string(),
                project: raw_stream_id.clone(),
                app: raw_group_name.clone(),
                task: ERROR_MARKER.to_string(),
                revision: ERROR_MARKER.to_string(),
            },
        }
    }
}

/// Wire form of a stream identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamComponents {
    pub platform: String,
    pub environment: String,
    pub project: String,
    pub app: String,
    pub task: String,
    pub revision: String,
}

/// Decoded CloudWatch Logs subscription batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogData {
    pub message_type: String,
    #[serde(default)]
    pub owner: String,
    pub log_group: String,
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

impl LogData {
    pub fn is_control_message(&self) -> bool {
        self.message_type == "CONTROL_MESSAGE"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Empty segment {position} in stream id '{stream_id}'")]
    EmptySegment { stream_id: String, position: usize },
    #[error("No project name left in group '{0}'")]
    EmptyProject(String),
    #[error("No naming scheme matched")]
    NoMatchingScheme,
}
