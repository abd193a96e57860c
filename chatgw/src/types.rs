//! Shared identifier aliases.

use uuid::Uuid;

pub type UserId = Uuid;
pub type PlanId = Uuid;
pub type PlanHistoryId = Uuid;
pub type ChatSessionId = Uuid;
pub type ModelId = Uuid;
pub type ChangeLogId = Uuid;
