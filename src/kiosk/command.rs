//! Commands that drive the join flow over the network.
//!
//! Each command owns the flow for as long as its request runs and sends it
//! back through [`KioskMsg::FlowReturned`].

use async_trait::async_trait;
use smartq_core::QueueJoinFlow;
use smartq_core::model::OrganizationId;
use tokio::sync::mpsc::UnboundedSender;

use crate::commands::Command;
use crate::kiosk::message::{FlowOp, KioskMsg};

pub struct LoadOrganizationsCmd {
    flow: Box<QueueJoinFlow>,
    tx: UnboundedSender<KioskMsg>,
}

impl LoadOrganizationsCmd {
    pub const fn new(flow: Box<QueueJoinFlow>, tx: UnboundedSender<KioskMsg>) -> Self {
        Self { flow, tx }
    }
}

#[async_trait]
impl Command for LoadOrganizationsCmd {
    fn name(&self) -> String {
        "Loading organizations".to_string()
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { mut flow, tx } = *self;
        let result = flow.load_organizations().await.map(|_| ());
        let _ = tx.send(KioskMsg::FlowReturned {
            flow,
            op: FlowOp::LoadOrganizations,
            result,
        });
        Ok(())
    }
}

pub struct ChooseOrganizationCmd {
    flow: Box<QueueJoinFlow>,
    org: OrganizationId,
    tx: UnboundedSender<KioskMsg>,
}

impl ChooseOrganizationCmd {
    pub const fn new(
        flow: Box<QueueJoinFlow>,
        org: OrganizationId,
        tx: UnboundedSender<KioskMsg>,
    ) -> Self {
        Self { flow, org, tx }
    }
}

#[async_trait]
impl Command for ChooseOrganizationCmd {
    fn name(&self) -> String {
        format!("Loading services for organization {}", self.org)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { mut flow, org, tx } = *self;
        let result = flow.choose_organization(org).await;
        let _ = tx.send(KioskMsg::FlowReturned {
            flow,
            op: FlowOp::ChooseOrganization(org),
            result,
        });
        Ok(())
    }
}

pub struct SubmitPhoneCmd {
    flow: Box<QueueJoinFlow>,
    phone: String,
    tx: UnboundedSender<KioskMsg>,
}

impl SubmitPhoneCmd {
    pub const fn new(flow: Box<QueueJoinFlow>, phone: String, tx: UnboundedSender<KioskMsg>) -> Self {
        Self { flow, phone, tx }
    }
}

#[async_trait]
impl Command for SubmitPhoneCmd {
    fn name(&self) -> String {
        "Joining queue".to_string()
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { mut flow, phone, tx } = *self;
        let result = flow.submit_phone(&phone).await.map(|_| ());
        let _ = tx.send(KioskMsg::FlowReturned {
            flow,
            op: FlowOp::SubmitPhone,
            result,
        });
        Ok(())
    }
}
