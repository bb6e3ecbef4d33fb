//! Push transport port

use async_trait::async_trait;
use thiserror::Error;

use harbor_core::Snowflake;

/// Transport-level delivery failure
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The transport could not take the payload right now; retry later
    #[error("transport rejected delivery (retryable): {0}")]
    Retryable(String),

    /// The transport will never accept this payload; dead-letter it
    #[error("transport rejected delivery (fatal): {0}")]
    Fatal(String),
}

impl DispatchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Downstream delivery channel for push notifications
///
/// `deliver` returning `Ok(())` means the transport has accepted the
/// payload; the dispatcher then marks the entry delivered. Duplicate
/// deliveries are possible and the transport must tolerate them.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(&self, user_id: Snowflake, payload: &serde_json::Value)
        -> Result<(), DispatchError>;
}
