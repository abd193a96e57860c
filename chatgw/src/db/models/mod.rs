//! Database row types and store request payloads.

pub mod ai_models;
pub mod change_log;
pub mod chats;
pub mod plans;
pub mod users;
