use crate::config::Config;
use crate::models::{EventInfo, EventMetadata, IngestLine, LineMeta, LogInfo};
use parser::{parse_stream_identity, LogData, LogEvent, StreamComponents};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const TRUNCATED_SUFFIX: &str = " (truncated)";

#[derive(Debug, Clone, Copy)]
pub struct TransformOptions {
    pub log_raw_event: bool,
    pub max_line_length: usize,
}

impl From<&Config> for TransformOptions {
    fn from(config: &Config) -> Self {
        Self {
            log_raw_event: config.log_raw_event,
            max_line_length: config.max_line_length,
        }
    }
}

/// Default line body: the message plus its event/log descriptors
#[derive(Serialize)]
struct LineBody<'a> {
    message: &'a str,
    #[serde(flatten)]
    metadata: &'a EventMetadata,
}

/// Turn a decoded batch into ingestion lines. The stream identity is
/// resolved once and shared by every event of the batch.
pub fn prepare_logs(log_data: &LogData, options: &TransformOptions) -> Vec<IngestLine> {
    let outcome = parse_stream_identity(&log_data.log_stream, &log_data.log_group);
    let components = outcome.components();
    if !outcome.is_parsed() {
        warn!(
            "Shipping {} events from '{}' with an unparseable identity",
            log_data.log_events.len(),
            log_data.log_stream
        );
    }

    debug!(
        "Preparing {} events for project '{}' ({})",
        log_data.log_events.len(),
        components.project,
        components.environment
    );

    log_data
        .log_events
        .iter()
        .map(|event| prepare_line(log_data, event, &components, options))
        .collect()
}

fn prepare_line(
    log_data: &LogData,
    event: &LogEvent,
    components: &StreamComponents,
    options: &TransformOptions,
) -> IngestLine {
    let message = sanitize_message(&event.message, options.max_line_length);

    let metadata = EventMetadata {
        event: EventInfo {
            message_type: log_data.message_type.clone(),
            id: event.id.clone(),
            tags: vec![components.environment.clone()],
            components: components.clone(),
        },
        log: LogInfo {
            group: components.project.clone(),
            stream: log_data.log_stream.clone(),
        },
    };

    let line = if options.log_raw_event {
        raw_event_line(&message, &components.environment)
    } else {
        let body = LineBody {
            message: &message,
            metadata: &metadata,
        };
        serde_json::to_string(&body).unwrap_or_else(|_| message.clone())
    };

    IngestLine {
        timestamp: event.timestamp,
        app: format!("{}-{}", components.app, components.task),
        file: log_data.log_stream.clone(),
        line,
        meta: LineMeta {
            owner: components.project.clone(),
            filters: log_data.subscription_filters.clone(),
            metadata,
            raw_line: message,
        },
    }
}

/// Prefix the message with its environment, lifting JSON messages into an
/// object whose `message` field carries the prefixed text
pub fn raw_event_line(message: &str, environment: &str) -> String {
    if !message.starts_with('{') {
        return format!("[{}] {}", environment, message);
    }

    let mut object = match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(object)) => object,
        _ => return format!("[{}] [log-parsing-failed] {}", environment, message),
    };

    let text = take_string(&mut object, "msg")
        .or_else(|| object.get("message").and_then(Value::as_str).map(String::from))
        .or_else(|| take_string(&mut object, "event"));

    let prefixed = match text {
        Some(text) => format!("[{}] {}", environment, text),
        None => format!("[{}] [expand-to-see-details]", environment),
    };
    object.insert("message".to_string(), Value::String(prefixed));

    Value::Object(object).to_string()
}

/// Removes `key` only when it holds a string
fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !matches!(object.get(key), Some(Value::String(_))) {
        return None;
    }
    match object.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

pub fn sanitize_message(message: &str, max_line_length: usize) -> String {
    match message.char_indices().nth(max_line_length) {
        Some((cut, _)) => format!("{}{}", &message[..cut], TRUNCATED_SUFFIX),
        None => message.to_string(),
    }
}
