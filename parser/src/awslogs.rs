use crate::{LogData, ParseError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{debug, error};

/// Envelope CloudWatch Logs delivers to a subscription target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub awslogs: AwsLogs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsLogs {
    /// Base64 encoded, gzip compressed `LogData` JSON
    pub data: String,
}

impl SubscriptionEvent {
    pub fn decode(&self) -> Result<LogData, ParseError> {
        decode_awslogs(&self.awslogs.data)
    }
}

/// Decode the `awslogs.data` field of a subscription event
pub fn decode_awslogs(data: &str) -> Result<LogData, ParseError> {
    let compressed = STANDARD.decode(data.trim())?;
    debug!("Decoded {} bytes of compressed log data", compressed.len());

    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut buffer = Vec::new();
    if let Err(e) = decoder.read_to_end(&mut buffer) {
        error!("Failed to decompress log data: {}", e);
        return Err(e.into());
    }

    match serde_json::from_slice::<LogData>(&buffer) {
        Ok(log_data) => {
            debug!(
                "Decoded {} events from group '{}' stream '{}'",
                log_data.log_events.len(),
                log_data.log_group,
                log_data.log_stream
            );
            Ok(log_data)
        }
        Err(e) => {
            error!("Failed to parse log data JSON: {}", e);
            Err(e.into())
        }
    }
}
