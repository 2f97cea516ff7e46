// Publisher trait for handing records to the message stream
use crate::domain::outcome::BoxError;
use crate::domain::record::OutgoingRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not reach the stream: {0}")]
    Transport(#[source] BoxError),

    #[error("stream rejected the record ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PanelPublisher: Send + Sync {
    async fn publish(&self, record: OutgoingRecord) -> Result<(), PublishError>;
}
