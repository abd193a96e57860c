//! Store traits and their Postgres implementations.
//!
//! Each store is a narrow data-access trait consumed by the HTTP layer
//! through `Arc<dyn ...>` in `AppState`. Handlers never see SQL; tests
//! substitute in-memory implementations that record their invocations.

pub mod ai_models;
pub mod change_log;
pub mod chats;
pub mod plans;
pub mod users;

pub use ai_models::{ModelCatalog, PgModelCatalog};
pub use change_log::{ChangeLogStore, PgChangeLog};
pub use chats::{ChatStore, PgChats};
pub use plans::{PgPlans, PlanStore};
pub use users::{PgUsers, UserStore};
