//! Self-service kiosk: organization → service → phone → ticket.

mod command;
mod message;
mod service;
mod view;

pub use service::KioskService;
