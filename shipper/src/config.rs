use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_INGEST_URL: &str = "https://logs.logdna.com/logs/ingest";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_FREE_SOCKET_TIMEOUT_MS: u64 = 300_000;
const DEFAULT_MAX_REQUEST_RETRIES: u32 = 5;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 100;
const DEFAULT_MAX_LINE_LENGTH: usize = 32_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}': {1}")]
    ListenAddr(String, std::net::AddrParseError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub key: Option<String>,
    pub hostname: Option<String>,
    pub tags: Vec<String>,
    pub log_raw_event: bool,
    pub ingest_url: String,
    pub request_timeout: Duration,
    pub free_socket_timeout: Duration,
    pub max_request_retries: u32,
    pub retry_interval: Duration,
    pub max_line_length: usize,
    pub listen_addr: SocketAddr,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen = lookup("SHIPPER_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ListenAddr(listen.clone(), e))?;

        Ok(Config {
            key: lookup("LOGDNA_KEY").filter(|v| !v.is_empty()),
            hostname: lookup("LOGDNA_HOSTNAME").filter(|v| !v.is_empty()),
            tags: lookup("LOGDNA_TAGS").map(|v| parse_tags(&v)).unwrap_or_default(),
            log_raw_event: lookup("LOG_RAW_EVENT")
                .map(|v| matches!(v.to_lowercase().as_str(), "yes" | "true"))
                .unwrap_or(false),
            ingest_url: lookup("LOGDNA_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_INGEST_URL.to_string()),
            request_timeout: Duration::from_millis(number_or(
                lookup("LOGDNA_MAX_REQUEST_TIMEOUT"),
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            free_socket_timeout: Duration::from_millis(number_or(
                lookup("LOGDNA_FREE_SOCKET_TIMEOUT"),
                DEFAULT_FREE_SOCKET_TIMEOUT_MS,
            )),
            max_request_retries: number_or(
                lookup("LOGDNA_MAX_REQUEST_RETRIES"),
                DEFAULT_MAX_REQUEST_RETRIES,
            ),
            retry_interval: Duration::from_millis(number_or(
                lookup("LOGDNA_REQUEST_RETRY_INTERVAL"),
                DEFAULT_RETRY_INTERVAL_MS,
            )),
            max_line_length: number_or(lookup("LOGDNA_MAX_LINE_LENGTH"), DEFAULT_MAX_LINE_LENGTH),
            listen_addr,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        })
    }
}

fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Unparseable or zero values fall back to the default
fn number_or<T>(value: Option<String>, default: T) -> T
where
    T: FromStr + PartialEq + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert!(config.key.is_none());
        assert!(config.hostname.is_none());
        assert!(config.tags.is_empty());
        assert!(!config.log_raw_event);
        assert_eq!(config.ingest_url, DEFAULT_INGEST_URL);
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert_eq!(config.free_socket_timeout, Duration::from_millis(300_000));
        assert_eq!(config.max_request_retries, 5);
        assert_eq!(config.retry_interval, Duration::from_millis(100));
        assert_eq!(config.max_line_length, 32_000);
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert!(config.user_agent.starts_with("shipper/"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LOGDNA_KEY", "secret"),
            ("LOGDNA_HOSTNAME", "shipper-host"),
            ("LOGDNA_TAGS", " aws , cloudwatch,, "),
            ("LOG_RAW_EVENT", "YES"),
            ("LOGDNA_MAX_REQUEST_RETRIES", "2"),
            ("LOGDNA_REQUEST_RETRY_INTERVAL", "10"),
            ("SHIPPER_LISTEN_ADDR", "0.0.0.0:9000"),
        ])
        .unwrap();

        assert_eq!(config.key.as_deref(), Some("secret"));
        assert_eq!(config.hostname.as_deref(), Some("shipper-host"));
        assert_eq!(config.tags, vec!["aws", "cloudwatch"]);
        assert!(config.log_raw_event);
        assert_eq!(config.max_request_retries, 2);
        assert_eq!(config.retry_interval, Duration::from_millis(10));
        assert_eq!(config.listen_addr.port(), 9000);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[
            ("LOGDNA_MAX_REQUEST_RETRIES", "many"),
            ("LOGDNA_MAX_LINE_LENGTH", "0"),
            ("LOG_RAW_EVENT", "no"),
        ])
        .unwrap();

        assert_eq!(config.max_request_retries, 5);
        assert_eq!(config.max_line_length, 32_000);
        assert!(!config.log_raw_event);
    }

    #[test]
    fn test_bad_listen_addr() {
        let err = config_from(&[("SHIPPER_LISTEN_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::ListenAddr(addr, _) if addr == "localhost"));
    }
}
