use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{PlanHistoryId, PlanId, UserId};

/// A subscription plan row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub price: Decimal,
    /// Payment-provider price lookup key
    pub price_id: Option<String>,
    pub points: i32,
    pub is_yearly_plan: bool,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Billing label recorded when the user requests this plan,
    /// e.g. "Pro - Annual".
    pub fn history_label(&self) -> String {
        let cadence = if self.is_yearly_plan { "Annual" } else { "Monthly" };
        format!("{} - {}", self.name, cadence)
    }
}

/// A plan change recorded against a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlanHistory {
    pub id: PlanHistoryId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub price: Decimal,
    pub label: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a plan change.
#[derive(Debug, Clone)]
pub struct PlanHistoryCreateDBRequest {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub price: Decimal,
    pub label: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str, yearly: bool) -> Plan {
        Plan {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::new(2900, 2),
            price_id: None,
            points: 1000,
            is_yearly_plan: yearly,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_label_uses_yearly_flag() {
        assert_eq!(plan("Pro", true).history_label(), "Pro - Annual");
        assert_eq!(plan("Pro", false).history_label(), "Pro - Monthly");
    }
}
