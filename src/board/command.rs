use std::sync::Arc;

use async_trait::async_trait;
use smartq_core::QueueApi;
use smartq_core::model::OrganizationId;
use tokio::sync::mpsc::UnboundedSender;

use crate::board::service::BoardMsg;
use crate::commands::Command;

/// Fetch the current board rows for one organization.
pub struct FetchDisplayStatusCmd {
    api: Arc<dyn QueueApi>,
    org: OrganizationId,
    tx: UnboundedSender<BoardMsg>,
}

impl FetchDisplayStatusCmd {
    pub fn new(api: Arc<dyn QueueApi>, org: OrganizationId, tx: UnboundedSender<BoardMsg>) -> Self {
        Self { api, org, tx }
    }
}

#[async_trait]
impl Command for FetchDisplayStatusCmd {
    fn name(&self) -> String {
        format!("Refreshing board for organization {}", self.org)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let msg = match self.api.display_status(self.org).await {
            Ok(rows) => BoardMsg::Loaded(rows),
            Err(e) => BoardMsg::Failed(e.to_string()),
        };
        let _ = self.tx.send(msg);
        Ok(())
    }
}
