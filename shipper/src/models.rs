use chrono::{DateTime, Utc};
use parser::StreamComponents;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body POSTed to the ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPayload {
    pub e: String,
    pub ls: Vec<IngestLine>,
}

impl IngestPayload {
    pub fn new(lines: &[IngestLine]) -> Self {
        Self {
            e: "ls".to_string(),
            ls: lines.to_vec(),
        }
    }
}

/// One log line in the `ls` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLine {
    pub timestamp: i64,
    pub app: String,
    pub file: String,
    /// Already serialized; either a JSON document or a plain prefixed message
    pub line: String,
    pub meta: LineMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineMeta {
    pub owner: String,
    pub filters: Vec<String>,
    #[serde(flatten)]
    pub metadata: EventMetadata,
    #[serde(rename = "rawLine")]
    pub raw_line: String,
}

/// Event and log descriptors shared by `line` and `meta`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event: EventInfo,
    pub log: LogInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    #[serde(rename = "type")]
    pub message_type: String,
    pub id: String,
    pub tags: Vec<String>,
    pub components: StreamComponents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInfo {
    pub group: String,
    pub stream: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub request_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub lines: usize,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityQuery {
    #[serde(default)]
    pub stream: String,
    #[serde(default)]
    pub group: String,
}
