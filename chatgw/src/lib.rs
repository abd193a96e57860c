//! chatgw: the API gateway for the chat web app.
//!
//! Sits between the browser and everything the chat product talks to:
//! the Postgres store, Google Drive, the payment provider, and upload
//! storage. Every request passes a session gate, is forwarded to the
//! right delegate, and comes back in one response envelope.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod drive;
pub mod errors;
pub mod payment_providers;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use bon::Builder;
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::handlers,
    config::{Config, CorsConfig},
    db::handlers::{
        ChangeLogStore, ChatStore, ModelCatalog, PgChangeLog, PgChats, PgModelCatalog, PgPlans,
        PgUsers, PlanStore, UserStore,
    },
    drive::DriveClient,
    payment_providers::{PaymentProvider, create_provider},
    storage::{UploadStorage, create_storage},
};

/// Embedded migrations, applied on startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Shared application state: configuration plus every delegate the
/// handlers talk to, behind trait objects so tests can substitute them.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
    pub plans: Arc<dyn PlanStore>,
    pub models: Arc<dyn ModelCatalog>,
    pub changelog: Arc<dyn ChangeLogStore>,
    pub storage: Arc<dyn UploadStorage>,
    pub payments: Arc<dyn PaymentProvider>,
    pub drive: Arc<DriveClient>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::models::list_models,
        handlers::chats::chat_log,
        handlers::chats::chat_history,
        handlers::chats::delete_chat,
        handlers::chats::rename_chat,
        handlers::uploads::upload,
        handlers::drive::google_auth,
        handlers::drive::google_callback,
        handlers::drive::google_refresh,
        handlers::drive::google_status,
        handlers::drive::list_drive_files,
        handlers::drive::get_drive_file,
        handlers::drive::list_drive_folder,
        handlers::drive::picker_token,
        handlers::payments::create_setup_intent,
        handlers::payments::update_payment_method,
        handlers::subscriptions::list_plans,
        handlers::subscriptions::request_update,
        handlers::subscriptions::request_cancel,
        handlers::subscriptions::cancel_pending,
        handlers::subscriptions::upgrade,
        handlers::subscriptions::downgrade,
        handlers::subscriptions::billing_history,
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::changelog::list_change_log,
    ),
    servers((url = "/api"))
)]
pub struct ApiDoc;

async fn healthz() -> &'static str {
    "ok"
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(&origin.origin().ascii_serialization()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(config.allow_credentials)
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/chat/aiModel", get(handlers::models::list_models))
        .route("/chat/log", get(handlers::chats::chat_log))
        .route(
            "/chat/history",
            get(handlers::chats::chat_history)
                .delete(handlers::chats::delete_chat)
                .put(handlers::chats::rename_chat),
        )
        .route("/chat/upload", post(handlers::uploads::upload))
        .route("/google/auth", get(handlers::drive::google_auth))
        .route("/google/callback", get(handlers::drive::google_callback))
        .route("/google/refresh", post(handlers::drive::google_refresh))
        .route("/google/status", get(handlers::drive::google_status))
        .route("/google/files", get(handlers::drive::list_drive_files))
        .route("/google/files/{file_id}", get(handlers::drive::get_drive_file))
        .route(
            "/google/folders/{folder_id}",
            get(handlers::drive::list_drive_folder),
        )
        .route("/google/picker-token", get(handlers::drive::picker_token))
        .route("/stripe/setup-intent", post(handlers::payments::create_setup_intent))
        .route(
            "/stripe/update-payment-method",
            post(handlers::payments::update_payment_method),
        )
        .route("/user/subscription", get(handlers::subscriptions::list_plans))
        .route(
            "/user/subscription/requestUpdate",
            post(handlers::subscriptions::request_update),
        )
        .route(
            "/user/subscription/requestCancel",
            get(handlers::subscriptions::request_cancel),
        )
        .route(
            "/user/subscription/cancelPending",
            post(handlers::subscriptions::cancel_pending),
        )
        .route(
            "/user/subscription/upgrade",
            post(handlers::subscriptions::upgrade),
        )
        .route(
            "/user/subscription/downgrade",
            post(handlers::subscriptions::downgrade),
        )
        .route("/user/billingHistory", get(handlers::subscriptions::billing_history))
        .route(
            "/user/profile",
            get(handlers::users::get_profile).put(handlers::users::update_profile),
        )
        .route("/user/changeLog", get(handlers::changelog::list_change_log))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/healthz", get(healthz))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer(&state.config.cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Connect to Postgres, run migrations, and assemble the app state.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool.max_connections)
        .min_connections(config.database.pool.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.pool.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;
    MIGRATOR.run(&pool).await?;

    let storage = create_storage(&config.storage).await;
    let payments = create_provider(&config.payment);
    let drive = Arc::new(DriveClient::new(config.google.clone()));

    Ok(AppState::builder()
        .config(config)
        .users(Arc::new(PgUsers::new(pool.clone())))
        .chats(Arc::new(PgChats::new(pool.clone())))
        .plans(Arc::new(PgPlans::new(pool.clone())))
        .models(Arc::new(PgModelCatalog::new(pool.clone())))
        .changelog(Arc::new(PgChangeLog::new(pool)))
        .storage(storage)
        .payments(payments)
        .drive(drive)
        .build())
}

/// Run the server until the shutdown future resolves.
pub async fn serve(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = build_state(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
