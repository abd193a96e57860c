//! Route handlers.
//!
//! Handlers are thin: a gate extractor, wire-format validation, one or
//! two store/provider calls, and the response envelope. Anything with
//! real logic lives behind the `AppState` trait objects.

pub mod auth;
pub mod changelog;
pub mod chats;
pub mod drive;
pub mod models;
pub mod payments;
pub mod subscriptions;
pub mod uploads;
pub mod users;
