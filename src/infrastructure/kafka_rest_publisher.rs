// Kafka REST Proxy publisher
use crate::application::panel_publisher::{PanelPublisher, PublishError};
use crate::domain::record::OutgoingRecord;
use crate::infrastructure::config::KafkaSettings;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BINARY_V2: &str = "application/vnd.kafka.binary.v2+json";
const ACCEPT_V2: &str = "application/vnd.kafka.v2+json";

#[derive(Debug, Serialize)]
struct ProduceRequest {
    records: Vec<BinaryRecord>,
}

#[derive(Debug, Serialize)]
struct BinaryRecord {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<ProduceOffset>,
}

#[derive(Debug, Deserialize)]
struct ProduceOffset {
    partition: Option<i32>,
    offset: Option<i64>,
    error_code: Option<i32>,
    error: Option<String>,
}

/// Produces records to a single topic through the REST proxy's v2 API,
/// using the binary embedded format.
#[derive(Debug, Clone)]
pub struct KafkaRestPublisher {
    client: reqwest::Client,
    topic_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl KafkaRestPublisher {
    pub fn new(settings: &KafkaSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            topic_url: format!(
                "{}/topics/{}",
                settings.rest_proxy_url.trim_end_matches('/'),
                urlencoding::encode(&settings.topic)
            ),
            credentials: settings
                .username
                .clone()
                .map(|user| (user, settings.password.clone())),
        })
    }
}

#[async_trait]
impl PanelPublisher for KafkaRestPublisher {
    async fn publish(&self, record: OutgoingRecord) -> Result<(), PublishError> {
        let body = ProduceRequest {
            records: vec![BinaryRecord {
                key: STANDARD.encode(record.key.as_bytes()),
                value: STANDARD.encode(&record.payload),
            }],
        };
        let body = serde_json::to_vec(&body).map_err(|e| PublishError::Transport(e.into()))?;

        let mut request = self
            .client
            .post(&self.topic_url)
            .header(CONTENT_TYPE, BINARY_V2)
            .header(ACCEPT, ACCEPT_V2)
            .body(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let produced = response
            .json::<ProduceResponse>()
            .await
            .map_err(|e| PublishError::Transport(e.into()))?;

        for offset in produced.offsets {
            if let Some(code) = offset.error_code {
                return Err(PublishError::Rejected {
                    status: status.as_u16(),
                    message: offset
                        .error
                        .unwrap_or_else(|| format!("error_code {}", code)),
                });
            }
            tracing::debug!(
                key = %record.key,
                partition = offset.partition,
                offset = offset.offset,
                "record produced"
            );
        }

        Ok(())
    }
}
