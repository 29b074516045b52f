//! Domain types exchanged with the SmartQ backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Minimum number of characters a phone number must have.
pub const MIN_PHONE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub i64);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub i64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant that owns services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl Organization {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: OrganizationId(id),
            name: name.into(),
            location: None,
            contact: None,
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A queue-able offering within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub counter_number: Option<String>,
    /// Average minutes spent per client.
    #[serde(default)]
    pub avg_service_time: Option<u32>,
}

impl Service {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ServiceId(id),
            name: name.into(),
            counter_number: None,
            avg_service_time: None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Phone number accepted by the join guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Trims the input and rejects anything shorter than [`MIN_PHONE_LEN`] characters.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        (trimmed.chars().count() >= MIN_PHONE_LEN).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinQueueRequest {
    pub service_id: ServiceId,
    pub phone_number: PhoneNumber,
}

/// Raw body of `POST /client/api/join-queue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinQueueResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub queue_number: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub counter: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub estimated_wait: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What a join attempt amounted to once the body is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(Ticket),
    /// The server refused; carries its message when one was sent.
    Rejected(Option<String>),
}

impl JoinQueueResponse {
    pub fn into_outcome(self) -> JoinOutcome {
        if !self.success {
            // A blank message counts as no message.
            return JoinOutcome::Rejected(self.error.filter(|e| !e.trim().is_empty()));
        }
        JoinOutcome::Joined(Ticket {
            queue_number: self.queue_number.unwrap_or_default(),
            counter: self.counter.unwrap_or_default(),
            position: self.position.unwrap_or_default(),
            estimated_wait: self.estimated_wait.unwrap_or_default(),
        })
    }
}

/// Record issued to a client upon joining a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub queue_number: String,
    pub counter: String,
    pub position: u32,
    /// Minutes.
    pub estimated_wait: u32,
}

/// One row of the "now serving" board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayStatus {
    pub service_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub counter: Option<String>,
    #[serde(default)]
    pub now_serving: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub waiting: u32,
}

/// Counter labels are strings server-side but some deployments send plain numbers.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_shorter_than_ten_is_rejected() {
        assert!(PhoneNumber::parse("").is_none());
        assert!(PhoneNumber::parse("555123456").is_none());
        assert!(PhoneNumber::parse("   555123456   ").is_none());
    }

    #[test]
    fn test_phone_is_trimmed() {
        let phone = PhoneNumber::parse(" 5551234567 ").unwrap();
        assert_eq!(phone.as_str(), "5551234567");
    }

    #[test]
    fn test_counter_accepts_number_or_text() {
        let numeric: JoinQueueResponse =
            serde_json::from_str(r#"{"success":true,"counter":2}"#).unwrap();
        assert_eq!(numeric.counter.as_deref(), Some("2"));

        let text: JoinQueueResponse =
            serde_json::from_str(r#"{"success":true,"counter":"B"}"#).unwrap();
        assert_eq!(text.counter.as_deref(), Some("B"));

        let null: JoinQueueResponse =
            serde_json::from_str(r#"{"success":true,"counter":null}"#).unwrap();
        assert_eq!(null.counter, None);
    }

    #[test]
    fn test_error_only_body_is_rejection() {
        let response: JoinQueueResponse =
            serde_json::from_str(r#"{"error":"Service not found"}"#).unwrap();
        assert_eq!(
            response.into_outcome(),
            JoinOutcome::Rejected(Some("Service not found".to_string()))
        );
    }

    #[test]
    fn test_blank_error_is_dropped() {
        let response: JoinQueueResponse =
            serde_json::from_str(r#"{"success":false,"error":"  "}"#).unwrap();
        assert_eq!(response.into_outcome(), JoinOutcome::Rejected(None));
    }

    #[test]
    fn test_success_body_becomes_ticket() {
        let response: JoinQueueResponse = serde_json::from_str(
            r#"{"success":true,"queue_number":"BIL004","counter":"3","position":4,"estimated_wait":30}"#,
        )
        .unwrap();
        let JoinOutcome::Joined(ticket) = response.into_outcome() else {
            panic!("expected a ticket");
        };
        assert_eq!(ticket.queue_number, "BIL004");
        assert_eq!(ticket.counter, "3");
        assert_eq!(ticket.position, 4);
        assert_eq!(ticket.estimated_wait, 30);
    }

    #[test]
    fn test_service_ignores_unknown_fields() {
        let service: Service = serde_json::from_str(
            r#"{"id":5,"name":"Billing","organization_id":1,"is_active":true,"counter_number":"2","avg_service_time":10}"#,
        )
        .unwrap();
        assert_eq!(service.id, ServiceId(5));
        assert_eq!(service.counter_number.as_deref(), Some("2"));
        assert_eq!(service.avg_service_time, Some(10));
    }
}
