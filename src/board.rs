//! "Now serving" display board for waiting areas.

mod command;
mod service;
mod view;

pub use service::BoardService;
