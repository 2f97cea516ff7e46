// Outgoing stream record
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRecord {
    pub key: String,
    pub payload: Bytes,
}

impl OutgoingRecord {
    pub fn new(dashboard_id: &str, panel_name: &str, payload: Bytes) -> Self {
        Self {
            key: format!("{}:{}", dashboard_id, panel_name),
            payload,
        }
    }
}
