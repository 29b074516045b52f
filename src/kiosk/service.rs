use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use smartq_core::model::{OrganizationId, PhoneNumber, ServiceId};
use smartq_core::{FlowError, FlowState, QueueApi, QueueJoinFlow, Step};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Theme;
use crate::config::{KeyResolver, KioskAction};
use crate::kiosk::command::{ChooseOrganizationCmd, LoadOrganizationsCmd, SubmitPhoneCmd};
use crate::kiosk::message::{FlowOp, KioskMsg};
use crate::kiosk::view::{OrganizationsScreen, PhoneScreen, ServicesScreen, TicketScreen};
use crate::service::{Service, ServiceMsg};
use crate::ui::{Component, EventResult, Keybinding, Screen, Spinner};

enum View {
    Organizations(OrganizationsScreen),
    Services(ServicesScreen),
    Phone(PhoneScreen),
    Ticket(TicketScreen),
}

impl View {
    fn screen(&mut self) -> &mut dyn Screen<Output = KioskMsg> {
        match self {
            Self::Organizations(v) => v,
            Self::Services(v) => v,
            Self::Phone(v) => v,
            Self::Ticket(v) => v,
        }
    }

    fn screen_ref(&self) -> &dyn Screen<Output = KioskMsg> {
        match self {
            Self::Organizations(v) => v,
            Self::Services(v) => v,
            Self::Phone(v) => v,
            Self::Ticket(v) => v,
        }
    }
}

/// Walk-up kiosk driving a [`QueueJoinFlow`].
///
/// The flow lives here between transitions. Async transitions move it into a
/// command, so while one is running `flow` is `None` and every further
/// transition is refused.
pub struct KioskService {
    flow: Option<Box<QueueJoinFlow>>,
    view: View,
    /// Label of the transition in flight.
    busy: Option<&'static str>,
    spinner: Spinner,
    /// Organization to open as soon as the list is loaded.
    preselect: Option<OrganizationId>,
    resolver: Arc<KeyResolver>,
    msg_tx: UnboundedSender<KioskMsg>,
    msg_rx: UnboundedReceiver<KioskMsg>,
}

impl KioskService {
    pub fn new(
        api: Arc<dyn QueueApi>,
        preselect: Option<OrganizationId>,
        resolver: Arc<KeyResolver>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            flow: Some(Box::new(QueueJoinFlow::new(api))),
            view: View::Organizations(OrganizationsScreen::new(&[], resolver.clone())),
            busy: None,
            spinner: Spinner::default(),
            preselect,
            resolver,
            msg_tx,
            msg_rx,
        }
    }

    fn queue(&self, msg: KioskMsg) {
        let _ = self.msg_tx.send(msg);
    }

    /// Hand the flow to an async transition, or `None` if one is already running.
    fn take_flow(&mut self, label: &'static str) -> Option<Box<QueueJoinFlow>> {
        let flow = self.flow.take();
        if flow.is_some() {
            self.busy = Some(label);
            self.spinner.set_label(label);
        } else {
            debug!(label, "Ignoring transition while another is in flight");
        }
        flow
    }

    /// Rebuild the screen for the flow's current step.
    fn sync_view(&mut self) {
        let Some(flow) = &self.flow else {
            return;
        };
        let resolver = self.resolver.clone();
        let organization = flow
            .selected_organization()
            .map_or("", |o| o.name.as_str());
        let service = flow.selected_service().map_or("", |s| s.name.as_str());

        self.view = match flow.state() {
            FlowState::OrgSelect => {
                View::Organizations(OrganizationsScreen::new(flow.organizations(), resolver))
            }
            FlowState::ServiceSelect => {
                View::Services(ServicesScreen::new(organization, flow.services(), resolver))
            }
            FlowState::PhoneEntry => View::Phone(PhoneScreen::new(organization, service, resolver)),
            FlowState::TicketDisplay(ticket) => View::Ticket(TicketScreen::new(
                ticket.clone(),
                organization,
                service,
                resolver,
            )),
        };
    }

    fn process_message(&mut self, msg: KioskMsg) -> ServiceMsg {
        match msg {
            KioskMsg::LoadOrganizations => self.load_organizations(),
            KioskMsg::OrganizationChosen(org) => self.choose_organization(org),
            KioskMsg::ServiceChosen(service) => self.choose_service(service),
            KioskMsg::PhoneSubmitted(phone) => self.submit_phone(phone),
            KioskMsg::Back => self.with_flow(|flow| match flow.back() {
                Ok(step) => debug!(%step, "Went back"),
                Err(e) => debug!(error = %e, "Back ignored"),
            }),
            KioskMsg::Reset => self.with_flow(|flow| {
                info!("Starting over");
                flow.reset();
            }),
            KioskMsg::FlowReturned { flow, op, result } => self.flow_returned(flow, op, result),
        }
    }

    /// Run a synchronous transition and show its result.
    fn with_flow(&mut self, f: impl FnOnce(&mut QueueJoinFlow)) -> ServiceMsg {
        if let Some(flow) = self.flow.as_mut() {
            f(flow);
            self.sync_view();
        }
        ServiceMsg::Idle
    }

    fn load_organizations(&mut self) -> ServiceMsg {
        if self.flow.as_ref().is_some_and(|f| f.step() != Step::OrgSelect) {
            debug!("Organizations are only reloaded from the first screen");
            return ServiceMsg::Idle;
        }
        self.take_flow("Loading organizations...")
            .map_or(ServiceMsg::Idle, |flow| {
                LoadOrganizationsCmd::new(flow, self.msg_tx.clone()).into()
            })
    }

    fn choose_organization(&mut self, org: OrganizationId) -> ServiceMsg {
        self.take_flow("Loading services...")
            .map_or(ServiceMsg::Idle, |flow| {
                ChooseOrganizationCmd::new(flow, org, self.msg_tx.clone()).into()
            })
    }

    fn choose_service(&mut self, service: ServiceId) -> ServiceMsg {
        let Some(flow) = self.flow.as_mut() else {
            return ServiceMsg::Idle;
        };
        if let Err(e) = flow.choose_service(service) {
            warn!(%service, error = %e, "Cannot choose service");
            return ServiceMsg::Idle;
        }
        self.sync_view();
        ServiceMsg::Idle
    }

    fn submit_phone(&mut self, phone: String) -> ServiceMsg {
        // Checked here as well so an invalid number never occupies the flow.
        if PhoneNumber::parse(&phone).is_none() {
            return ServiceMsg::Alert(FlowError::InvalidPhone.to_string());
        }
        self.take_flow("Joining queue...")
            .map_or(ServiceMsg::Idle, |flow| {
                SubmitPhoneCmd::new(flow, phone, self.msg_tx.clone()).into()
            })
    }

    fn flow_returned(
        &mut self,
        flow: Box<QueueJoinFlow>,
        op: FlowOp,
        result: Result<(), FlowError>,
    ) -> ServiceMsg {
        self.flow = Some(flow);
        self.busy = None;

        match result {
            Ok(()) => {
                self.sync_view();
                if op == FlowOp::LoadOrganizations {
                    self.open_preselected();
                }
                ServiceMsg::Idle
            }
            Err(e) => {
                if op == FlowOp::LoadOrganizations {
                    // Show the empty list rather than a stale screen.
                    self.sync_view();
                    self.preselect = None;
                }
                e.alert().map_or_else(
                    || {
                        debug!(?op, error = %e, "Transition failed without alert");
                        ServiceMsg::Idle
                    },
                    ServiceMsg::Alert,
                )
            }
        }
    }

    fn open_preselected(&mut self) {
        let Some(org) = self.preselect.take() else {
            return;
        };
        let known = self
            .flow
            .as_ref()
            .is_some_and(|f| f.organizations().iter().any(|o| o.id == org));
        if known {
            info!(%org, "Opening preselected organization");
            self.queue(KioskMsg::OrganizationChosen(org));
        } else {
            warn!(%org, "Preselected organization not found");
        }
    }
}

impl Service for KioskService {
    fn init(&mut self) {
        self.queue(KioskMsg::LoadOrganizations);
    }

    fn handle_tick(&mut self) {
        if self.busy.is_some() {
            self.spinner.handle_tick();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
        if self.busy.is_some() {
            return EventResult::Ignored;
        }

        // Checked before the screen so text input cannot swallow it.
        if self.resolver.matches_kiosk(&key, KioskAction::Reset) {
            self.queue(KioskMsg::Reset);
            return EventResult::Consumed;
        }

        match self.view.screen().handle_key(key) {
            Ok(EventResult::Event(msg)) => {
                self.queue(msg);
                EventResult::Consumed
            }
            Ok(EventResult::Consumed) => EventResult::Consumed,
            Ok(EventResult::Ignored) => EventResult::Ignored,
            Err(e) => {
                warn!(error = %e, "Screen failed to handle key");
                EventResult::Consumed
            }
        }
    }

    fn update(&mut self) -> Result<ServiceMsg> {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match self.process_message(msg) {
                ServiceMsg::Idle => {}
                // The App calls again until idle, so nothing queued is lost.
                other => return Ok(other),
            }
        }
        Ok(ServiceMsg::Idle)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.busy.is_some() {
            self.spinner.render(frame, area, theme);
        } else {
            self.view.screen().render(frame, area, theme);
        }
    }

    fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = vec!["Kiosk".to_string()];
        crumbs.extend(self.view.screen_ref().breadcrumbs());
        crumbs
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let mut keybindings = self.view.screen_ref().keybindings();
        keybindings.push(Keybinding::new(
            self.resolver.display_kiosk(KioskAction::Reset),
            "Start over",
        ));
        keybindings
    }

    fn status(&self) -> Vec<(&'static str, String)> {
        let Some(flow) = &self.flow else {
            return vec![("step", self.busy.unwrap_or_default().to_string())];
        };
        let mut status = vec![("step", flow.step().to_string())];
        if let Some(org) = flow.selected_organization() {
            status.push(("org", org.name.clone()));
        }
        if let Some(service) = flow.selected_service() {
            status.push(("service", service.name.clone()));
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};
    use smartq_core::ApiError;
    use smartq_core::model::{
        DisplayStatus, JoinQueueRequest, JoinQueueResponse, Organization, Service as QueueService,
    };

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    #[derive(Default)]
    struct FakeBackend {
        join_response: Mutex<Option<JoinQueueResponse>>,
        joins: Mutex<Vec<JoinQueueRequest>>,
    }

    #[async_trait]
    impl QueueApi for FakeBackend {
        async fn organizations(&self) -> Result<Vec<Organization>, ApiError> {
            Ok(vec![
                Organization::new(1, "City Hall"),
                Organization::new(2, "Central Clinic"),
            ])
        }

        async fn services(&self, org: OrganizationId) -> Result<Vec<QueueService>, ApiError> {
            match org.0 {
                1 => Ok(vec![QueueService::new(5, "Billing")]),
                _ => Err(ApiError::Transport {
                    endpoint: "/client/api/services".to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }

        async fn join_queue(&self, request: &JoinQueueRequest) -> Result<JoinQueueResponse, ApiError> {
            self.joins.lock().unwrap().push(request.clone());
            Ok(self.join_response.lock().unwrap().clone().unwrap_or_default())
        }

        async fn display_status(&self, _org: OrganizationId) -> Result<Vec<DisplayStatus>, ApiError> {
            Ok(vec![])
        }
    }

    fn kiosk(backend: &Arc<FakeBackend>, preselect: Option<i64>) -> KioskService {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        KioskService::new(backend.clone(), preselect.map(OrganizationId), resolver)
    }

    /// Drive `update()` the way the App does, running commands to completion.
    async fn settle(kiosk: &mut KioskService) -> Vec<String> {
        let mut alerts = Vec::new();
        loop {
            match kiosk.update().unwrap() {
                ServiceMsg::Idle => break,
                ServiceMsg::Run(commands) => {
                    for command in commands {
                        command.execute().await.unwrap();
                    }
                }
                ServiceMsg::Alert(text) => alerts.push(text),
                ServiceMsg::Close => panic!("kiosk never closes"),
            }
        }
        alerts
    }

    fn press(kiosk: &mut KioskService, code: KeyCode) {
        kiosk.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(kiosk: &mut KioskService, s: &str) {
        for c in s.chars() {
            press(kiosk, KeyCode::Char(c));
        }
    }

    fn step(kiosk: &KioskService) -> Step {
        kiosk.flow.as_ref().map(|f| f.step()).unwrap()
    }

    #[tokio::test]
    async fn test_walk_through_to_ticket() {
        let backend = Arc::new(FakeBackend::default());
        *backend.join_response.lock().unwrap() = Some(JoinQueueResponse {
            success: true,
            queue_number: Some("A1".to_string()),
            counter: Some("2".to_string()),
            position: Some(3),
            estimated_wait: Some(15),
            error: None,
        });
        let mut kiosk = kiosk(&backend, None);
        kiosk.init();
        settle(&mut kiosk).await;

        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::ServiceSelect);

        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::PhoneEntry);

        type_str(&mut kiosk, "5551234567");
        press(&mut kiosk, KeyCode::Enter);
        assert!(settle(&mut kiosk).await.is_empty());

        let View::Ticket(_) = kiosk.view else {
            panic!("expected the ticket screen");
        };
        assert_eq!(
            kiosk.breadcrumbs(),
            vec!["Kiosk", "City Hall", "Billing", "Ticket A1"]
        );

        // Enter on the ticket starts over.
        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::OrgSelect);
        assert!(kiosk.flow.as_ref().unwrap().selection().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_keeps_phone_screen_and_input() {
        let backend = Arc::new(FakeBackend::default());
        *backend.join_response.lock().unwrap() = Some(JoinQueueResponse {
            success: false,
            error: Some("Service closed".to_string()),
            ..JoinQueueResponse::default()
        });
        let mut kiosk = kiosk(&backend, Some(1));
        kiosk.init();
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::ServiceSelect);

        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        type_str(&mut kiosk, "5551234567");
        press(&mut kiosk, KeyCode::Enter);

        assert_eq!(settle(&mut kiosk).await, vec!["Service closed"]);
        assert_eq!(step(&kiosk), Step::PhoneEntry);
        let View::Phone(screen) = &kiosk.view else {
            panic!("expected the phone screen");
        };
        assert_eq!(screen.value(), "5551234567");
    }

    #[tokio::test]
    async fn test_short_phone_alerts_without_request() {
        let backend = Arc::new(FakeBackend::default());
        let mut kiosk = kiosk(&backend, Some(1));
        kiosk.init();
        settle(&mut kiosk).await;
        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;

        type_str(&mut kiosk, "12345");
        press(&mut kiosk, KeyCode::Enter);
        assert_eq!(
            settle(&mut kiosk).await,
            vec!["Please enter a valid phone number"]
        );
        assert!(backend.joins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_services_failure_stays_silent() {
        let backend = Arc::new(FakeBackend::default());
        let mut kiosk = kiosk(&backend, None);
        kiosk.init();
        settle(&mut kiosk).await;

        press(&mut kiosk, KeyCode::Down);
        press(&mut kiosk, KeyCode::Enter);
        assert!(settle(&mut kiosk).await.is_empty());
        assert_eq!(step(&kiosk), Step::OrgSelect);
    }

    #[tokio::test]
    async fn test_keys_are_ignored_while_busy() {
        let backend = Arc::new(FakeBackend::default());
        let mut kiosk = kiosk(&backend, None);
        kiosk.init();

        let ServiceMsg::Run(commands) = kiosk.update().unwrap() else {
            panic!("expected the organization load");
        };
        assert!(kiosk.flow.is_none());
        assert_eq!(
            kiosk.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            EventResult::Ignored
        );

        for command in commands {
            command.execute().await.unwrap();
        }
        settle(&mut kiosk).await;
        assert!(kiosk.flow.is_some());
        assert!(kiosk.busy.is_none());
    }

    #[tokio::test]
    async fn test_ctrl_r_starts_over_from_any_screen() {
        let backend = Arc::new(FakeBackend::default());
        let mut kiosk = kiosk(&backend, Some(1));
        kiosk.init();
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::ServiceSelect);

        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(kiosk.handle_key(ctrl_r), EventResult::Consumed);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::OrgSelect);

        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        type_str(&mut kiosk, "555");
        assert_eq!(step(&kiosk), Step::PhoneEntry);

        assert_eq!(kiosk.handle_key(ctrl_r), EventResult::Consumed);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::OrgSelect);
        assert!(kiosk.flow.as_ref().unwrap().selection().is_empty());
        let View::Organizations(_) = kiosk.view else {
            panic!("expected the organization list");
        };
    }

    #[tokio::test]
    async fn test_esc_walks_back() {
        let backend = Arc::new(FakeBackend::default());
        let mut kiosk = kiosk(&backend, Some(1));
        kiosk.init();
        settle(&mut kiosk).await;
        press(&mut kiosk, KeyCode::Enter);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::PhoneEntry);

        press(&mut kiosk, KeyCode::Esc);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::ServiceSelect);

        press(&mut kiosk, KeyCode::Esc);
        settle(&mut kiosk).await;
        assert_eq!(step(&kiosk), Step::OrgSelect);
    }
}
