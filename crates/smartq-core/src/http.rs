use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{ApiError, QueueApi};
use crate::model::{
    DisplayStatus, JoinQueueRequest, JoinQueueResponse, Organization, OrganizationId, Service,
};

const ORGANIZATIONS: &str = "/client/api/organizations";
const SERVICES: &str = "/client/api/services";
const JOIN_QUEUE: &str = "/client/api/join-queue";
const DISPLAY_STATUS: &str = "/client/api/display-status";

/// [`QueueApi`] over JSON/HTTP.
#[derive(Clone, Debug)]
pub struct HttpQueueApi {
    http: Client,
    base_url: String,
}

impl HttpQueueApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, i64)],
    ) -> Result<T, ApiError> {
        debug!(endpoint, "GET");
        let response = self
            .http
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| transport(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        decode(endpoint, response).await
    }
}

#[async_trait]
impl QueueApi for HttpQueueApi {
    async fn organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.get_json(ORGANIZATIONS, &[]).await
    }

    async fn services(&self, org: OrganizationId) -> Result<Vec<Service>, ApiError> {
        self.get_json(SERVICES, &[("org_id", org.0)]).await
    }

    async fn join_queue(&self, request: &JoinQueueRequest) -> Result<JoinQueueResponse, ApiError> {
        debug!(endpoint = JOIN_QUEUE, service_id = %request.service_id, "POST");
        let response = self
            .http
            .post(self.url(JOIN_QUEUE))
            .json(request)
            .send()
            .await
            .map_err(|e| transport(JOIN_QUEUE, &e))?;

        let status = response.status();
        if status.is_success() {
            return decode(JOIN_QUEUE, response).await;
        }

        // Validation failures come back as 4xx with an `{error}` body.
        let body = response
            .bytes()
            .await
            .map_err(|e| transport(JOIN_QUEUE, &e))?;
        match serde_json::from_slice::<JoinQueueResponse>(&body) {
            Ok(rejection) if rejection.error.is_some() => {
                warn!(status = status.as_u16(), error = ?rejection.error, "join-queue rejected");
                Ok(JoinQueueResponse {
                    success: false,
                    ..rejection
                })
            }
            _ => Err(ApiError::Status {
                endpoint: JOIN_QUEUE.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn display_status(&self, org: OrganizationId) -> Result<Vec<DisplayStatus>, ApiError> {
        self.get_json(DISPLAY_STATUS, &[("org_id", org.0)]).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
    response.json().await.map_err(|e| {
        if e.is_decode() {
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        } else {
            transport(endpoint, &e)
        }
    })
}

fn transport(endpoint: &str, error: &reqwest::Error) -> ApiError {
    ApiError::Transport {
        endpoint: endpoint.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let api = HttpQueueApi::new("http://kiosk.local:5000/");
        assert_eq!(api.base_url(), "http://kiosk.local:5000");
        assert_eq!(
            api.url(ORGANIZATIONS),
            "http://kiosk.local:5000/client/api/organizations"
        );
    }
}
