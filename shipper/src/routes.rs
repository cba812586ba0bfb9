use axum::{
    Router,
    routing::{get, post},
    response::IntoResponse,
    http::StatusCode,
    extract::{Query, State},
    Json,
};
use crate::config::Config;
use crate::delivery::{DeliveryError, Shipper};
use crate::models::{IdentityQuery, IngestResponse};
use crate::transform::{prepare_logs, TransformOptions};
use chrono::Utc;
use parser::{parse_stream_identity, StreamComponents, SubscriptionEvent};
use std::sync::Arc;
use tracing::{field, info, debug, error, instrument, Span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub shipper: Shipper,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ingest", post(ingest))
        .route("/identity", get(identity))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Receives one CloudWatch Logs subscription event and ships its batch
#[instrument(skip(state, event), fields(request_id))]
async fn ingest(
    State(state): State<AppState>,
    Json(event): Json<SubscriptionEvent>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    Span::current().record("request_id", field::display(request_id));
    let received_at = Utc::now();

    let log_data = event.decode()
        .map_err(|e| {
            error!("Failed to decode subscription event: {}", e);
            (StatusCode::BAD_REQUEST, format!("Decode error: {}", e))
        })?;

    if log_data.is_control_message() {
        info!("Acknowledging control message without delivery");
        return Ok(Json(IngestResponse {
            request_id,
            received_at,
            lines: 0,
            status: "control message skipped".to_string(),
        }));
    }

    info!(
        "Received {} events from group '{}' stream '{}'",
        log_data.log_events.len(),
        log_data.log_group,
        log_data.log_stream
    );

    let lines = prepare_logs(&log_data, &TransformOptions::from(state.config.as_ref()));
    debug!("Prepared {} lines", lines.len());

    let status = state.shipper.send_lines(&lines).await
        .map_err(|e| {
            error!("Delivery failed: {}", e);
            (delivery_status(&e), format!("Delivery failed: {}", e))
        })?;

    Ok(Json(IngestResponse {
        request_id,
        received_at,
        lines: lines.len(),
        status,
    }))
}

fn delivery_status(e: &DeliveryError) -> StatusCode {
    match e {
        DeliveryError::MissingKey | DeliveryError::Client(_) | DeliveryError::Serialize(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        DeliveryError::Request(_)
        | DeliveryError::Rejected { .. }
        | DeliveryError::RetriesExhausted { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Shows how a stream / group pair would be tagged
async fn identity(Query(query): Query<IdentityQuery>) -> Json<StreamComponents> {
    Json(parse_stream_identity(&query.stream, &query.group).components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(config: Config) -> Router {
        let config = Arc::new(config);
        let shipper = Shipper::new(Arc::clone(&config)).unwrap();
        create_routes(AppState { config, shipper })
    }

    fn base_config() -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.retry_interval = Duration::from_millis(1);
        config.max_request_retries = 2;
        config
    }

    fn subscription_event(log_data: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(log_data.as_bytes()).unwrap();
        let data = STANDARD.encode(encoder.finish().unwrap());
        serde_json::json!({ "awslogs": { "data": data } }).to_string()
    }

    fn post_ingest(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ingest")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    const DATA_MESSAGE: &str = r#"{"messageType":"DATA_MESSAGE","owner":"123456789012","logGroup":"/ecs/alta-customer-manager-worker-staging-td","logStream":"ecs","subscriptionFilters":["ship"],"logEvents":[{"id":"1","timestamp":1700000000000,"message":"job done"}]}"#;

    #[tokio::test]
    async fn test_health() {
        let resp = app(base_config())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_identity_endpoint() {
        let resp = app(base_config())
            .oneshot(
                Request::builder()
                    .uri("/identity?stream=ecs&group=%2Fecs%2Fveritas-dev-td")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let components: StreamComponents = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(components.environment, "dev");
        assert_eq!(components.project, "veritas");
        assert_eq!(components.revision, "unknown");
    }

    #[tokio::test]
    async fn test_ingest_rejects_undecodable_payload() {
        let body = serde_json::json!({ "awslogs": { "data": "%%%" } }).to_string();
        let resp = app(base_config()).oneshot(post_ingest(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_skips_control_message() {
        let body = subscription_event(
            r#"{"messageType":"CONTROL_MESSAGE","owner":"CloudwatchLogs","logGroup":"","logStream":"","subscriptionFilters":[],"logEvents":[]}"#,
        );
        let resp = app(base_config()).oneshot(post_ingest(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let response: IngestResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response.lines, 0);
    }

    #[tokio::test]
    async fn test_ingest_without_key() {
        let resp = app(base_config())
            .oneshot(post_ingest(subscription_event(DATA_MESSAGE)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ingest_delivers_batch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/logs/ingest")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tags".into(), "staging".into()),
                Matcher::UrlEncoded("hostname".into(), "alta-customer-manager".into()),
            ]))
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({ "e": "ls" })),
                Matcher::Regex(r#""app":"main-worker""#.to_string()),
                Matcher::Regex(r#""owner":"alta-customer-manager""#.to_string()),
            ]))
            .with_status(200)
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let mut config = base_config();
        config.key = Some("secret".to_string());
        config.ingest_url = format!("{}/logs/ingest", server.url());

        let resp = app(config)
            .oneshot(post_ingest(subscription_event(DATA_MESSAGE)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let response: IngestResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response.lines, 1);
        assert_eq!(response.status, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ingest_reports_bad_gateway() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/logs/ingest")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let mut config = base_config();
        config.key = Some("secret".to_string());
        config.ingest_url = format!("{}/logs/ingest", server.url());

        let resp = app(config)
            .oneshot(post_ingest(subscription_event(DATA_MESSAGE)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        mock.assert_async().await;
    }
}
