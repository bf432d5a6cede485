//! QA Control - Chat adapter for the QA knowledge engine
//!
//! Command grammar, authorization, reply rendering and switch persistence
//! around `qa_common::QaEngine`.

pub mod auth;
pub mod bot;
pub mod command;
pub mod render;
pub mod switch_file;

pub use auth::{AuthorizationPolicy, RolePolicy};
pub use bot::{Bot, Message};
pub use switch_file::JsonSwitchGate;
