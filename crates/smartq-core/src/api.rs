//! Backend contract consumed by the kiosk.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    DisplayStatus, JoinQueueRequest, JoinQueueResponse, Organization, OrganizationId, Service,
};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}

/// Client-facing queue endpoints.
///
/// `join_queue` reports business rejections inside the response body
/// (`success: false`); only failures to obtain a usable body are errors.
#[async_trait]
pub trait QueueApi: Send + Sync {
    async fn organizations(&self) -> Result<Vec<Organization>, ApiError>;

    async fn services(&self, org: OrganizationId) -> Result<Vec<Service>, ApiError>;

    async fn join_queue(&self, request: &JoinQueueRequest) -> Result<JoinQueueResponse, ApiError>;

    async fn display_status(&self, org: OrganizationId) -> Result<Vec<DisplayStatus>, ApiError>;
}
