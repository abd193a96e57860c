//! Billing route wire types.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::types::PlanId;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdateBody {
    #[schema(value_type = Option<uuid::Uuid>, format = Uuid)]
    pub plan_id: Option<PlanId>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentMethodBody {
    pub payment_method_id: Option<String>,
}
