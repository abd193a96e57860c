//! Card collection routes forwarded to the payment provider.
//!
//! These gate on the session and then resolve the account themselves:
//! a valid session whose user row is gone gets 404 "User not found",
//! unlike chat routes where the distinction is hidden.

use axum::{Json, extract::State};
use tracing::{instrument, warn};

use crate::{
    AppState,
    api::models::{ApiSuccess, subscriptions::UpdatePaymentMethodBody},
    auth::{Session, session::SessionClaims},
    db::models::users::User,
    errors::{Error, Result},
    payment_providers::SetupIntent,
};

async fn resolve_user(state: &AppState, claims: &SessionClaims) -> Result<User> {
    state
        .users
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::UserNotFound)
}

fn require_customer_id(user: &User) -> Result<&str> {
    user.stripe_customer_id.as_deref().ok_or_else(|| Error::BadRequest {
        message: "No Stripe customer found".to_string(),
    })
}

/// Create a setup intent so the client can collect a card.
#[utoipa::path(
    post,
    path = "/stripe/setup-intent",
    tag = "billing",
    responses(
        (status = 200, description = "Client secret for the card form"),
        (status = 400, description = "No Stripe customer found"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User not found"),
    )
)]
#[instrument(skip_all)]
pub async fn create_setup_intent(
    Session(claims): Session,
    State(state): State<AppState>,
) -> Result<ApiSuccess<SetupIntent>> {
    let user = resolve_user(&state, &claims).await?;
    let customer_id = require_customer_id(&user)?;

    let intent = state
        .payments
        .create_setup_intent(customer_id)
        .await
        .map_err(|e| {
            warn!("setup intent creation failed: {e}");
            Error::Internal {
                operation: "create setup intent".to_string(),
            }
        })?;
    Ok(ApiSuccess(intent))
}

/// Make a collected payment method the account default.
#[utoipa::path(
    post,
    path = "/stripe/update-payment-method",
    tag = "billing",
    request_body = UpdatePaymentMethodBody,
    responses(
        (status = 200, description = "Default payment method updated"),
        (status = 400, description = "Missing payment method or customer"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User not found"),
    )
)]
#[instrument(skip_all)]
pub async fn update_payment_method(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(request): Json<UpdatePaymentMethodBody>,
) -> Result<ApiSuccess<User>> {
    let payment_method_id = match request.payment_method_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(Error::MissingField {
                field: "Payment method ID".to_string(),
            });
        }
    };

    let user = resolve_user(&state, &claims).await?;
    let customer_id = require_customer_id(&user)?;

    state
        .payments
        .update_default_payment_method(customer_id, user.subscription_id.as_deref(), &payment_method_id)
        .await
        .map_err(|e| {
            warn!("payment method update failed: {e}");
            Error::Internal {
                operation: "update payment method".to_string(),
            }
        })?;

    let user = state
        .users
        .set_default_payment_method(user.id, &payment_method_id)
        .await?;
    Ok(ApiSuccess(user))
}
