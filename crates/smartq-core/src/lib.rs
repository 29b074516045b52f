//! Client side of the SmartQ queue system.
//!
//! - [`model`] - types exchanged with the backend
//! - [`api`] - the [`QueueApi`] contract and its error type
//! - [`http`] - [`HttpQueueApi`], the JSON/HTTP implementation
//! - [`flow`] - [`QueueJoinFlow`], the organization → service → phone → ticket controller

pub mod api;
pub mod flow;
pub mod http;
pub mod model;

pub use api::{ApiError, QueueApi};
pub use flow::{FlowError, FlowState, QueueJoinFlow, Selection, Step};
pub use http::HttpQueueApi;
