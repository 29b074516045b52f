use smartq_core::model::{OrganizationId, ServiceId};
use smartq_core::{FlowError, QueueJoinFlow};

/// Which async transition a returning flow went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOp {
    LoadOrganizations,
    ChooseOrganization(OrganizationId),
    SubmitPhone,
}

/// Everything that can happen to the kiosk, from keys and from commands.
#[derive(Debug)]
pub enum KioskMsg {
    // === User actions ===
    LoadOrganizations,
    OrganizationChosen(OrganizationId),
    ServiceChosen(ServiceId),
    PhoneSubmitted(String),
    Back,
    Reset,

    // === Command results ===
    /// A command hands the flow back together with the outcome of its transition.
    FlowReturned {
        flow: Box<QueueJoinFlow>,
        op: FlowOp,
        result: Result<(), FlowError>,
    },
}
