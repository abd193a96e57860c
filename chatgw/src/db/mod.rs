//! Persistence layer: store traits, their Postgres implementations, and the
//! row types they exchange. Wire-facing types live in `api::models`.

pub mod errors;
pub mod handlers;
pub mod models;
