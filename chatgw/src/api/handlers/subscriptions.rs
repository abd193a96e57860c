//! Subscription plan listing and plan changes.
//!
//! Plan changes come in two shapes: `requestUpdate` records an intent
//! (with its pending history entry) that the user may still abandon,
//! while `upgrade`/`downgrade` move the live subscription onto the new
//! price at the provider and take effect immediately.

use axum::{Json, extract::State};
use tracing::{info, instrument, warn};

use crate::{
    AppState,
    api::models::{ApiSuccess, subscriptions::RequestUpdateBody},
    auth::{Session, session::SessionClaims},
    db::models::{
        plans::{Plan, PlanHistory, PlanHistoryCreateDBRequest},
        users::User,
    },
    errors::{Error, Result},
};

async fn resolve_user(state: &AppState, claims: &SessionClaims) -> Result<User> {
    state
        .users
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::UserNotFound)
}

/// Shared gate for the immediate plan-switch routes: the plan must exist
/// and differ from the user's current one.
async fn resolve_plan_switch(
    state: &AppState,
    claims: &SessionClaims,
    request: RequestUpdateBody,
) -> Result<(User, Plan)> {
    let Some(plan_id) = request.plan_id else {
        return Err(Error::MissingField {
            field: "Plan ID".to_string(),
        });
    };

    let user = resolve_user(state, claims).await?;
    let plan = state
        .plans
        .get_by_id(plan_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "plan".to_string(),
        })?;
    if user.current_plan_id == Some(plan.id) {
        return Err(Error::BadRequest {
            message: "User already on this plan".to_string(),
        });
    }
    Ok((user, plan))
}

fn require_subscription(user: &User) -> Result<&str> {
    user.subscription_id.as_deref().ok_or_else(|| Error::BadRequest {
        message: "No active subscription found".to_string(),
    })
}

fn require_price_id(plan: &Plan) -> Result<&str> {
    // A paid plan without a provider price is a data fault, not a caller error
    plan.price_id.as_deref().ok_or_else(|| Error::Internal {
        operation: "update subscription".to_string(),
    })
}

/// List all plans. Public: the pricing page renders from this.
#[utoipa::path(
    get,
    path = "/user/subscription",
    tag = "billing",
    responses((status = 200, description = "Plans, cheapest first"))
)]
#[instrument(skip_all)]
pub async fn list_plans(State(state): State<AppState>) -> Result<ApiSuccess<Vec<Plan>>> {
    let plans = state.plans.list().await.map_err(|e| {
        tracing::error!("plan listing failed: {e:#}");
        Error::Internal {
            operation: "fetch plans".to_string(),
        }
    })?;
    Ok(ApiSuccess(plans))
}

/// Request a plan change, to apply at the next billing boundary.
#[utoipa::path(
    post,
    path = "/user/subscription/requestUpdate",
    tag = "billing",
    request_body = RequestUpdateBody,
    responses(
        (status = 200, description = "Change recorded"),
        (status = 400, description = "Plan ID is required"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User or plan not found"),
    )
)]
#[instrument(skip_all)]
pub async fn request_update(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(request): Json<RequestUpdateBody>,
) -> Result<ApiSuccess<User>> {
    let Some(plan_id) = request.plan_id else {
        return Err(Error::MissingField {
            field: "Plan ID".to_string(),
        });
    };

    let user = resolve_user(&state, &claims).await?;
    let plan = state
        .plans
        .get_by_id(plan_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "plan".to_string(),
        })?;

    let updated = state.users.set_request_plan(user.id, Some(plan.id)).await?;

    // Re-requesting the current plan is a no-op for billing history
    if user.current_plan_id != Some(plan.id) {
        state
            .plans
            .record_history(&PlanHistoryCreateDBRequest {
                user_id: user.id,
                plan_id: plan.id,
                price: plan.price,
                label: plan.history_label(),
                status: "pending".to_string(),
            })
            .await?;
    }
    info!(user_id = %user.id, plan = %plan.name, "plan change requested");

    Ok(ApiSuccess(updated))
}

/// Request cancellation: the subscription lapses at period end.
#[utoipa::path(
    get,
    path = "/user/subscription/requestCancel",
    tag = "billing",
    responses(
        (status = 200, description = "Cancellation requested"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User not found"),
    )
)]
#[instrument(skip_all)]
pub async fn request_cancel(
    Session(claims): Session,
    State(state): State<AppState>,
) -> Result<ApiSuccess<User>> {
    let user = resolve_user(&state, &claims).await?;

    if let Some(subscription_id) = &user.subscription_id {
        state
            .payments
            .set_cancel_at_period_end(subscription_id, true)
            .await
            .map_err(|e| {
                warn!("cancellation request failed: {e}");
                Error::Internal {
                    operation: "request cancellation".to_string(),
                }
            })?;
    }

    // Cancellation supersedes any pending plan change
    let updated = state.users.set_request_plan(user.id, None).await?;
    info!(user_id = %user.id, "subscription cancellation requested");
    Ok(ApiSuccess(updated))
}

/// Abandon a pending plan change before it applies.
#[utoipa::path(
    post,
    path = "/user/subscription/cancelPending",
    tag = "billing",
    responses(
        (status = 200, description = "Pending change abandoned"),
        (status = 400, description = "No pending subscription changes found"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User not found"),
    )
)]
#[instrument(skip_all)]
pub async fn cancel_pending(
    Session(claims): Session,
    State(state): State<AppState>,
) -> Result<ApiSuccess<User>> {
    let user = resolve_user(&state, &claims).await?;
    let Some(pending_plan_id) = user.request_plan_id else {
        return Err(Error::BadRequest {
            message: "No pending subscription changes found".to_string(),
        });
    };

    if let Some(subscription_id) = &user.subscription_id {
        state
            .payments
            .set_cancel_at_period_end(subscription_id, false)
            .await
            .map_err(|e| {
                warn!("pending change revert failed: {e}");
                Error::Internal {
                    operation: "cancel pending changes".to_string(),
                }
            })?;
    }

    state
        .plans
        .update_history_status(user.id, pending_plan_id, "failed")
        .await?;
    let updated = state.users.set_request_plan(user.id, None).await?;
    info!(user_id = %user.id, "pending plan change abandoned");
    Ok(ApiSuccess(updated))
}

/// Move the subscription to a pricier plan now; the billing cycle
/// restarts immediately without proration.
#[utoipa::path(
    post,
    path = "/user/subscription/upgrade",
    tag = "billing",
    request_body = RequestUpdateBody,
    responses(
        (status = 200, description = "Subscription moved to the new plan"),
        (status = 400, description = "Missing plan, same plan, or no subscription"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User or plan not found"),
    )
)]
#[instrument(skip_all)]
pub async fn upgrade(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(request): Json<RequestUpdateBody>,
) -> Result<ApiSuccess<User>> {
    let (user, plan) = resolve_plan_switch(&state, &claims, request).await?;
    let subscription_id = require_subscription(&user)?;
    let price_id = require_price_id(&plan)?;

    state
        .payments
        .update_subscription_price(subscription_id, price_id, true)
        .await
        .map_err(|e| {
            warn!("subscription upgrade failed: {e}");
            Error::Internal {
                operation: "update subscription".to_string(),
            }
        })?;

    let updated = state.users.set_request_plan(user.id, Some(plan.id)).await?;
    info!(user_id = %user.id, plan = %plan.name, "subscription upgraded");
    Ok(ApiSuccess(updated))
}

/// Move the subscription to a cheaper plan. The free plan cancels at
/// period end; a paid plan takes its price over the current cycle.
#[utoipa::path(
    post,
    path = "/user/subscription/downgrade",
    tag = "billing",
    request_body = RequestUpdateBody,
    responses(
        (status = 200, description = "Downgrade applied"),
        (status = 400, description = "Missing plan, same plan, or no subscription"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User or plan not found"),
    )
)]
#[instrument(skip_all)]
pub async fn downgrade(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(request): Json<RequestUpdateBody>,
) -> Result<ApiSuccess<User>> {
    let (user, plan) = resolve_plan_switch(&state, &claims, request).await?;

    if plan.price.is_zero() {
        if let Some(subscription_id) = &user.subscription_id {
            state
                .payments
                .set_cancel_at_period_end(subscription_id, true)
                .await
                .map_err(|e| {
                    warn!("free-plan downgrade failed: {e}");
                    Error::Internal {
                        operation: "update subscription".to_string(),
                    }
                })?;
        }
        info!(user_id = %user.id, "subscription lapses at period end");
        return Ok(ApiSuccess(user));
    }

    let subscription_id = require_subscription(&user)?;
    let price_id = require_price_id(&plan)?;
    state
        .payments
        .update_subscription_price(subscription_id, price_id, false)
        .await
        .map_err(|e| {
            warn!("subscription downgrade failed: {e}");
            Error::Internal {
                operation: "update subscription".to_string(),
            }
        })?;

    let updated = state.users.set_request_plan(user.id, Some(plan.id)).await?;
    info!(user_id = %user.id, plan = %plan.name, "subscription downgraded");
    Ok(ApiSuccess(updated))
}

/// The caller's billing history, newest first.
#[utoipa::path(
    get,
    path = "/user/billingHistory",
    tag = "billing",
    responses(
        (status = 200, description = "History entries"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User not found"),
    )
)]
#[instrument(skip_all)]
pub async fn billing_history(
    Session(claims): Session,
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<PlanHistory>>> {
    let user = resolve_user(&state, &claims).await?;
    let history = state.plans.history_for_user(user.id).await?;
    Ok(ApiSuccess(history))
}
