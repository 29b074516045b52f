//! Queue join flow: organization → service → phone → ticket.
//!
//! [`QueueJoinFlow`] owns every piece of transient state the kiosk needs and
//! exposes one method per transition. Methods that reach the backend are
//! `async` and take `&mut self`, so a controller can only ever have one
//! transition in flight.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiError, QueueApi};
use crate::model::{
    JoinOutcome, JoinQueueRequest, Organization, OrganizationId, PhoneNumber, Service, ServiceId,
    Ticket,
};

/// Alert shown when a join fails without a server-provided reason.
pub const GENERIC_JOIN_FAILURE: &str = "Failed to join queue";
pub const INVALID_PHONE: &str = "Please enter a valid phone number";

/// Screen the client is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    OrgSelect,
    ServiceSelect,
    PhoneEntry,
    TicketDisplay,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrgSelect => "organization selection",
            Self::ServiceSelect => "service selection",
            Self::PhoneEntry => "phone entry",
            Self::TicketDisplay => "ticket display",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    OrgSelect,
    ServiceSelect,
    PhoneEntry,
    TicketDisplay(Ticket),
}

impl FlowState {
    pub const fn step(&self) -> Step {
        match self {
            Self::OrgSelect => Step::OrgSelect,
            Self::ServiceSelect => Step::ServiceSelect,
            Self::PhoneEntry => Step::PhoneEntry,
            Self::TicketDisplay(_) => Step::TicketDisplay,
        }
    }
}

/// The client's current choices.
///
/// A service is only ever recorded on top of an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    organization: Option<OrganizationId>,
    service: Option<ServiceId>,
}

impl Selection {
    pub const fn organization(&self) -> Option<OrganizationId> {
        self.organization
    }

    pub const fn service(&self) -> Option<ServiceId> {
        self.service
    }

    pub const fn is_empty(&self) -> bool {
        self.organization.is_none() && self.service.is_none()
    }

    const fn choose_organization(&mut self, id: OrganizationId) {
        self.organization = Some(id);
        self.service = None;
    }

    const fn choose_service(&mut self, id: ServiceId) -> bool {
        if self.organization.is_none() {
            return false;
        }
        self.service = Some(id);
        true
    }

    const fn clear_service(&mut self) {
        self.service = None;
    }

    const fn clear(&mut self) {
        self.organization = None;
        self.service = None;
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Please enter a valid phone number")]
    InvalidPhone,
    /// The backend refused the join. Holds the text to show the client.
    #[error("{0}")]
    Rejected(String),
    #[error("failed to load organizations")]
    OrganizationsUnavailable(#[source] ApiError),
    #[error("failed to load services for organization {org}")]
    ServicesUnavailable {
        org: OrganizationId,
        #[source]
        source: ApiError,
    },
    #[error("Failed to join queue")]
    JoinFailed(#[source] ApiError),
    #[error("service {0} is not offered here")]
    UnknownService(ServiceId),
    #[error("cannot {action} during {step}")]
    InvalidTransition { step: Step, action: &'static str },
}

impl FlowError {
    /// Text for the client-facing alert, or `None` for failures that are only logged.
    pub fn alert(&self) -> Option<String> {
        match self {
            Self::InvalidPhone | Self::Rejected(_) | Self::JoinFailed(_) => Some(self.to_string()),
            Self::OrganizationsUnavailable(_)
            | Self::ServicesUnavailable { .. }
            | Self::UnknownService(_)
            | Self::InvalidTransition { .. } => None,
        }
    }
}

pub struct QueueJoinFlow {
    api: Arc<dyn QueueApi>,
    state: FlowState,
    selection: Selection,
    organizations: Vec<Organization>,
    services: Vec<Service>,
}

impl fmt::Debug for QueueJoinFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueJoinFlow")
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("organizations", &self.organizations.len())
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}

impl QueueJoinFlow {
    pub fn new(api: Arc<dyn QueueApi>) -> Self {
        Self {
            api,
            state: FlowState::OrgSelect,
            selection: Selection::default(),
            organizations: Vec::new(),
            services: Vec::new(),
        }
    }

    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    pub const fn step(&self) -> Step {
        self.state.step()
    }

    pub const fn selection(&self) -> Selection {
        self.selection
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    /// Services of the selected organization. Empty until one is chosen.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected_organization(&self) -> Option<&Organization> {
        let id = self.selection.organization()?;
        self.organizations.iter().find(|o| o.id == id)
    }

    pub fn selected_service(&self) -> Option<&Service> {
        let id = self.selection.service()?;
        self.services.iter().find(|s| s.id == id)
    }

    fn expect_step(&self, step: Step, action: &'static str) -> Result<(), FlowError> {
        let current = self.state.step();
        if current == step {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                step: current,
                action,
            })
        }
    }

    /// Refresh the organization list shown on the first screen.
    pub async fn load_organizations(&mut self) -> Result<&[Organization], FlowError> {
        self.expect_step(Step::OrgSelect, "load organizations")?;
        match self.api.organizations().await {
            Ok(organizations) => {
                info!(count = organizations.len(), "Loaded organizations");
                self.organizations = organizations;
                Ok(&self.organizations)
            }
            Err(e) => {
                error!(error = %e, "Error loading organizations");
                Err(FlowError::OrganizationsUnavailable(e))
            }
        }
    }

    /// Fetch the organization's services and move to service selection.
    ///
    /// On failure nothing changes.
    pub async fn choose_organization(&mut self, org: OrganizationId) -> Result<(), FlowError> {
        self.expect_step(Step::OrgSelect, "choose an organization")?;
        match self.api.services(org).await {
            Ok(services) => {
                info!(%org, count = services.len(), "Loaded services");
                self.selection.choose_organization(org);
                self.services = services;
                self.state = FlowState::ServiceSelect;
                Ok(())
            }
            Err(e) => {
                error!(%org, error = %e, "Error loading services");
                Err(FlowError::ServicesUnavailable { org, source: e })
            }
        }
    }

    pub fn choose_service(&mut self, service: ServiceId) -> Result<(), FlowError> {
        self.expect_step(Step::ServiceSelect, "choose a service")?;
        if !self.services.iter().any(|s| s.id == service) {
            return Err(FlowError::UnknownService(service));
        }
        if !self.selection.choose_service(service) {
            return Err(FlowError::InvalidTransition {
                step: Step::ServiceSelect,
                action: "choose a service without an organization",
            });
        }
        self.state = FlowState::PhoneEntry;
        Ok(())
    }

    /// Step back one screen, forgetting the choice that led here.
    pub fn back(&mut self) -> Result<Step, FlowError> {
        match self.state {
            FlowState::ServiceSelect => {
                self.selection.clear();
                self.services.clear();
                self.state = FlowState::OrgSelect;
            }
            FlowState::PhoneEntry => {
                self.selection.clear_service();
                self.state = FlowState::ServiceSelect;
            }
            FlowState::OrgSelect | FlowState::TicketDisplay(_) => {
                return Err(FlowError::InvalidTransition {
                    step: self.state.step(),
                    action: "go back",
                });
            }
        }
        Ok(self.state.step())
    }

    /// Validate the phone number and join the selected service's queue.
    ///
    /// The request is only sent once the phone passes validation.
    pub async fn submit_phone(&mut self, input: &str) -> Result<Ticket, FlowError> {
        self.expect_step(Step::PhoneEntry, "join a queue")?;
        let phone_number = PhoneNumber::parse(input).ok_or(FlowError::InvalidPhone)?;
        let service_id = self
            .selection
            .service()
            .ok_or(FlowError::InvalidTransition {
                step: Step::PhoneEntry,
                action: "join a queue without a service",
            })?;

        let request = JoinQueueRequest {
            service_id,
            phone_number,
        };
        let response = self.api.join_queue(&request).await.map_err(|e| {
            error!(%service_id, error = %e, "Error joining queue");
            FlowError::JoinFailed(e)
        })?;

        match response.into_outcome() {
            JoinOutcome::Joined(ticket) => {
                info!(
                    %service_id,
                    queue_number = %ticket.queue_number,
                    position = ticket.position,
                    "Joined queue"
                );
                self.state = FlowState::TicketDisplay(ticket.clone());
                Ok(ticket)
            }
            JoinOutcome::Rejected(reason) => {
                warn!(%service_id, ?reason, "Join rejected");
                Err(FlowError::Rejected(
                    reason.unwrap_or_else(|| GENERIC_JOIN_FAILURE.to_string()),
                ))
            }
        }
    }

    /// Start over from organization selection. Allowed from any screen.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.services.clear();
        self.state = FlowState::OrgSelect;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{DisplayStatus, JoinQueueResponse};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Organizations,
        Services(OrganizationId),
        Join(JoinQueueRequest),
    }

    struct MockApi {
        organizations: Vec<Organization>,
        services: Vec<Service>,
        join: Mutex<Option<Result<JoinQueueResponse, ApiError>>>,
        fail_services: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl MockApi {
        fn new() -> Self {
            Self {
                organizations: vec![Organization::new(1, "City Hall")],
                services: vec![Service::new(5, "Billing")],
                join: Mutex::new(None),
                fail_services: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn joining(self, response: Result<JoinQueueResponse, ApiError>) -> Self {
            *self.join.lock().unwrap() = Some(response);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn join_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Join(_)))
                .count()
        }
    }

    fn offline(endpoint: &str) -> ApiError {
        ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl QueueApi for MockApi {
        async fn organizations(&self) -> Result<Vec<Organization>, ApiError> {
            self.calls.lock().unwrap().push(Call::Organizations);
            Ok(self.organizations.clone())
        }

        async fn services(&self, org: OrganizationId) -> Result<Vec<Service>, ApiError> {
            self.calls.lock().unwrap().push(Call::Services(org));
            if self.fail_services {
                return Err(offline("/client/api/services"));
            }
            Ok(self.services.clone())
        }

        async fn join_queue(
            &self,
            request: &JoinQueueRequest,
        ) -> Result<JoinQueueResponse, ApiError> {
            self.calls.lock().unwrap().push(Call::Join(request.clone()));
            self.join
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(offline("/client/api/join-queue")))
        }

        async fn display_status(
            &self,
            _org: OrganizationId,
        ) -> Result<Vec<DisplayStatus>, ApiError> {
            Ok(Vec::new())
        }
    }

    async fn at_phone_entry(api: &Arc<MockApi>) -> QueueJoinFlow {
        let mut flow = QueueJoinFlow::new(api.clone());
        flow.choose_organization(OrganizationId(1)).await.unwrap();
        flow.choose_service(ServiceId(5)).unwrap();
        flow
    }

    #[tokio::test]
    async fn test_successful_join_shows_ticket() {
        let api = Arc::new(MockApi::new().joining(Ok(JoinQueueResponse {
            success: true,
            queue_number: Some("A1".to_string()),
            counter: Some("2".to_string()),
            position: Some(3),
            estimated_wait: Some(15),
            error: None,
        })));
        let mut flow = QueueJoinFlow::new(api.clone());

        flow.choose_organization(OrganizationId(1)).await.unwrap();
        assert_eq!(flow.step(), Step::ServiceSelect);
        assert_eq!(flow.services(), &[Service::new(5, "Billing")]);

        flow.choose_service(ServiceId(5)).unwrap();
        assert_eq!(flow.step(), Step::PhoneEntry);

        let ticket = flow.submit_phone("5551234567").await.unwrap();
        assert_eq!(
            ticket,
            Ticket {
                queue_number: "A1".to_string(),
                counter: "2".to_string(),
                position: 3,
                estimated_wait: 15,
            }
        );
        assert_eq!(flow.state(), &FlowState::TicketDisplay(ticket));
        assert_eq!(
            api.calls().last(),
            Some(&Call::Join(JoinQueueRequest {
                service_id: ServiceId(5),
                phone_number: PhoneNumber::parse("5551234567").unwrap(),
            }))
        );
    }

    #[tokio::test]
    async fn test_rejection_stays_on_phone_entry_with_server_message() {
        let api = Arc::new(MockApi::new().joining(Ok(JoinQueueResponse {
            success: false,
            error: Some("Service closed".to_string()),
            ..JoinQueueResponse::default()
        })));
        let mut flow = at_phone_entry(&api).await;

        let err = flow.submit_phone("5551234567").await.unwrap_err();
        assert_eq!(err.alert().as_deref(), Some("Service closed"));
        assert_eq!(flow.step(), Step::PhoneEntry);
        assert_eq!(flow.selection().service(), Some(ServiceId(5)));
    }

    #[tokio::test]
    async fn test_rejection_without_message_uses_fallback() {
        let api = Arc::new(MockApi::new().joining(Ok(JoinQueueResponse::default())));
        let mut flow = at_phone_entry(&api).await;

        let err = flow.submit_phone("5551234567").await.unwrap_err();
        assert_eq!(err.alert().as_deref(), Some(GENERIC_JOIN_FAILURE));
    }

    #[tokio::test]
    async fn test_empty_rejection_message_uses_fallback() {
        let api = Arc::new(MockApi::new().joining(Ok(JoinQueueResponse {
            success: false,
            error: Some(String::new()),
            ..JoinQueueResponse::default()
        })));
        let mut flow = at_phone_entry(&api).await;

        let err = flow.submit_phone("5551234567").await.unwrap_err();
        assert_eq!(err.alert().as_deref(), Some(GENERIC_JOIN_FAILURE));
        assert_eq!(flow.step(), Step::PhoneEntry);
    }

    #[tokio::test]
    async fn test_join_transport_failure_alerts_generic_message() {
        let api = Arc::new(MockApi::new());
        let mut flow = at_phone_entry(&api).await;

        let err = flow.submit_phone("5551234567").await.unwrap_err();
        assert!(matches!(err, FlowError::JoinFailed(_)));
        assert_eq!(err.alert().as_deref(), Some(GENERIC_JOIN_FAILURE));
        assert_eq!(flow.step(), Step::PhoneEntry);
    }

    #[tokio::test]
    async fn test_short_phone_never_reaches_backend() {
        let api = Arc::new(MockApi::new());
        let mut flow = at_phone_entry(&api).await;

        for phone in ["", "5", "555123456", "  555-1234 "] {
            let err = flow.submit_phone(phone).await.unwrap_err();
            assert!(matches!(err, FlowError::InvalidPhone));
            assert_eq!(err.alert().as_deref(), Some(INVALID_PHONE));
        }
        assert_eq!(api.join_calls(), 0);
        assert_eq!(flow.step(), Step::PhoneEntry);
    }

    #[tokio::test]
    async fn test_services_failure_leaves_org_select_untouched() {
        let api = Arc::new(MockApi {
            fail_services: true,
            ..MockApi::new()
        });
        let mut flow = QueueJoinFlow::new(api.clone());

        let err = flow.choose_organization(OrganizationId(1)).await.unwrap_err();
        assert!(err.alert().is_none());
        assert_eq!(flow.step(), Step::OrgSelect);
        assert!(flow.selection().is_empty());
    }

    #[tokio::test]
    async fn test_back_clears_only_what_it_should() {
        let api = Arc::new(MockApi::new());
        let mut flow = at_phone_entry(&api).await;

        assert_eq!(flow.back().unwrap(), Step::ServiceSelect);
        assert_eq!(flow.selection().organization(), Some(OrganizationId(1)));
        assert_eq!(flow.selection().service(), None);

        assert_eq!(flow.back().unwrap(), Step::OrgSelect);
        assert!(flow.selection().is_empty());
        assert!(flow.services().is_empty());

        assert!(matches!(
            flow.back(),
            Err(FlowError::InvalidTransition { step: Step::OrgSelect, .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_selection_from_ticket() {
        let api = Arc::new(MockApi::new().joining(Ok(JoinQueueResponse {
            success: true,
            queue_number: Some("BIL001".to_string()),
            ..JoinQueueResponse::default()
        })));
        let mut flow = at_phone_entry(&api).await;
        flow.submit_phone("0788123456").await.unwrap();

        flow.reset();
        assert_eq!(flow.step(), Step::OrgSelect);
        assert_eq!(flow.selection().organization(), None);
        assert_eq!(flow.selection().service(), None);
    }

    #[test]
    fn test_service_cannot_be_chosen_before_organization() {
        let mut flow = QueueJoinFlow::new(Arc::new(MockApi::new()));
        let err = flow.choose_service(ServiceId(5)).unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidTransition { step: Step::OrgSelect, .. }
        ));
        assert!(flow.selection().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service_is_refused() {
        let api = Arc::new(MockApi::new());
        let mut flow = QueueJoinFlow::new(api.clone());
        flow.choose_organization(OrganizationId(1)).await.unwrap();

        let err = flow.choose_service(ServiceId(99)).unwrap_err();
        assert!(matches!(err, FlowError::UnknownService(ServiceId(99))));
        assert_eq!(flow.step(), Step::ServiceSelect);
        assert_eq!(flow.selection().service(), None);
    }

    #[tokio::test]
    async fn test_load_organizations_only_from_first_screen() {
        let api = Arc::new(MockApi::new());
        let mut flow = QueueJoinFlow::new(api.clone());
        assert_eq!(flow.load_organizations().await.unwrap().len(), 1);

        flow.choose_organization(OrganizationId(1)).await.unwrap();
        assert_eq!(
            flow.selected_organization().map(|o| o.name.as_str()),
            Some("City Hall")
        );
        assert!(flow.load_organizations().await.is_err());
        assert_eq!(
            api.calls(),
            vec![Call::Organizations, Call::Services(OrganizationId(1))]
        );
    }
}
