//! In-memory test doubles and fixtures.
//!
//! Every delegate behind `AppState` has a memory-backed stand-in here,
//! instrumented with call counters so tests can assert that gated routes
//! never reach a delegate when the gate rejects.

use std::{
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::{
    AppState,
    auth::session,
    config::{Config, DummyConfig, GoogleConfig},
    db::{
        errors::{DbError, Result as DbResult},
        handlers::{ChangeLogStore, ChatStore, ModelCatalog, PlanStore, UserStore},
        models::{
            ai_models::AiModel,
            change_log::ChangeLogEntry,
            chats::{ChatMessage, ChatSession},
            plans::{Plan, PlanHistory, PlanHistoryCreateDBRequest},
            users::{User, UserCreateDBRequest, UserProfileUpdateDBRequest},
        },
    },
    drive::DriveClient,
    payment_providers::DummyProvider,
    storage::{StorageError, UploadStorage},
    types::{PlanId, UserId},
};

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Default::default()
    }
}

/// Cookie header value carrying a fresh session token.
pub fn session_cookie_for(user_id: UserId, email: &str, config: &Config) -> String {
    let token = session::create_session_token(user_id, email, config).unwrap();
    format!("{}={}", config.auth.native.session.cookie_name, token)
}

// ---------------------------------------------------------------------------
// Memory-backed stores

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

impl MemoryUsers {
    pub fn insert(&self, user: User) {
        self.rows.lock().unwrap().push(user);
    }

    fn update<F: FnOnce(&mut User)>(&self, id: UserId, apply: F) -> DbResult<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DbError::NotFound)?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn create(&self, request: &UserCreateDBRequest) -> DbResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == request.email) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users_email_key".to_string()),
                table: Some("users".to_string()),
            });
        }
        let user = User {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            username: request.username.clone(),
            password_hash: request.password_hash.clone(),
            avatar_url: request.avatar_url.clone(),
            chat_points: 0,
            points_used: 0,
            points_reset_date: None,
            stripe_customer_id: None,
            subscription_id: None,
            subscription_status: None,
            default_payment_method: None,
            current_plan_id: None,
            request_plan_id: None,
            plan_start_date: None,
            plan_end_date: None,
            created_at: Utc::now(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: UserId, request: &UserProfileUpdateDBRequest) -> DbResult<User> {
        self.update(id, |user| {
            if let Some(username) = &request.username {
                user.username = username.clone();
            }
            if let Some(avatar_url) = &request.avatar_url {
                user.avatar_url = Some(avatar_url.clone());
            }
        })
    }

    async fn set_request_plan(&self, id: UserId, plan_id: Option<PlanId>) -> DbResult<User> {
        self.update(id, |user| user.request_plan_id = plan_id)
    }

    async fn set_default_payment_method(&self, id: UserId, payment_method: &str) -> DbResult<User> {
        let payment_method = payment_method.to_string();
        self.update(id, |user| user.default_payment_method = Some(payment_method))
    }
}

#[derive(Default)]
pub struct MemoryChats {
    sessions: Mutex<Vec<(String, ChatSession)>>,
    messages: Mutex<Vec<(String, String, ChatMessage)>>,
    calls: AtomicUsize,
}

impl MemoryChats {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert_session(&self, email: &str, session: ChatSession) {
        self.sessions
            .lock()
            .unwrap()
            .push((email.to_string(), session));
    }

    pub fn insert_message(&self, email: &str, session_key: &str, message: ChatMessage) {
        self.messages
            .lock()
            .unwrap()
            .push((email.to_string(), session_key.to_string(), message));
    }
}

#[async_trait]
impl ChatStore for MemoryChats {
    async fn find_log(&self, email: &str, session_key: &str) -> DbResult<Option<Vec<ChatMessage>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let exists = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .any(|(e, s)| e == email && s.session_key == session_key);
        if !exists {
            return Ok(None);
        }
        let mut messages: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, k, _)| e == email && k == session_key)
            .map(|(_, _, m)| m.clone())
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(Some(messages))
    }

    async fn history(&self, email: &str) -> DbResult<Vec<ChatSession>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == email)
            .map(|(_, s)| s.clone())
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.created_at));
        Ok(sessions)
    }

    async fn delete_session(&self, email: &str, session_key: &str) -> DbResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|(e, s)| !(e == email && s.session_key == session_key));
        let deleted = sessions.len() < before;
        if deleted {
            self.messages
                .lock()
                .unwrap()
                .retain(|(e, k, _)| !(e == email && k == session_key));
        }
        Ok(deleted)
    }

    async fn rename_session(&self, email: &str, session_key: &str, title: &str) -> DbResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().unwrap();
        for (e, s) in sessions.iter_mut() {
            if e == email && s.session_key == session_key {
                s.title = title.to_string();
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Default)]
pub struct MemoryPlans {
    plans: Mutex<Vec<Plan>>,
    history: Mutex<Vec<PlanHistory>>,
}

impl MemoryPlans {
    pub fn insert(&self, plan: Plan) {
        self.plans.lock().unwrap().push(plan);
    }
}

#[async_trait]
impl PlanStore for MemoryPlans {
    async fn list(&self) -> DbResult<Vec<Plan>> {
        let mut plans = self.plans.lock().unwrap().clone();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn get_by_id(&self, id: PlanId) -> DbResult<Option<Plan>> {
        Ok(self.plans.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn record_history(&self, request: &PlanHistoryCreateDBRequest) -> DbResult<PlanHistory> {
        let entry = PlanHistory {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            plan_id: request.plan_id,
            price: request.price,
            label: request.label.clone(),
            status: request.status.clone(),
            created_at: Utc::now(),
        };
        self.history.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn history_for_user(&self, user_id: UserId) -> DbResult<Vec<PlanHistory>> {
        let mut entries: Vec<PlanHistory> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| std::cmp::Reverse(h.created_at));
        Ok(entries)
    }

    async fn update_history_status(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        status: &str,
    ) -> DbResult<Option<PlanHistory>> {
        let mut history = self.history.lock().unwrap();
        let entry = history
            .iter_mut()
            .filter(|h| h.user_id == user_id && h.plan_id == plan_id)
            .max_by_key(|h| h.created_at);
        Ok(entry.map(|h| {
            h.status = status.to_string();
            h.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryModels {
    rows: Mutex<Vec<AiModel>>,
    calls: AtomicUsize,
}

impl MemoryModels {
    pub fn list_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert(&self, model: AiModel) {
        self.rows.lock().unwrap().push(model);
    }
}

#[async_trait]
impl ModelCatalog for MemoryModels {
    async fn list_enabled(&self) -> DbResult<Vec<AiModel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut models: Vec<AiModel> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.enabled)
            .cloned()
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }
}

#[derive(Default)]
pub struct MemoryChangeLog {
    rows: Mutex<Vec<ChangeLogEntry>>,
}

impl MemoryChangeLog {
    pub fn insert(&self, entry: ChangeLogEntry) {
        self.rows.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ChangeLogStore for MemoryChangeLog {
    async fn list(&self) -> DbResult<Vec<ChangeLogEntry>> {
        let mut entries = self.rows.lock().unwrap().clone();
        entries.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        Ok(entries)
    }
}

/// Memory-backed storage with injectable per-file failures.
#[derive(Default)]
pub struct MemoryStorage {
    stored: Mutex<Vec<String>>,
    fail_substrings: Mutex<Vec<String>>,
}

impl MemoryStorage {
    /// Make every store whose key contains `substring` fail.
    pub fn fail_matching(&self, substring: &str) {
        self.fail_substrings
            .lock()
            .unwrap()
            .push(substring.to_string());
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadStorage for MemoryStorage {
    async fn store(
        &self,
        key: &str,
        _content_type: &str,
        _content: Vec<u8>,
    ) -> Result<Url, StorageError> {
        if self
            .fail_substrings
            .lock()
            .unwrap()
            .iter()
            .any(|s| key.contains(s.as_str()))
        {
            return Err(StorageError::Backend("injected failure".to_string()));
        }
        self.stored.lock().unwrap().push(key.to_string());
        Ok(Url::parse(&format!("http://uploads.test/{key}")).unwrap())
    }
}

// ---------------------------------------------------------------------------
// Test context

pub struct TestContext {
    pub state: AppState,
    pub users: Arc<MemoryUsers>,
    pub chats: Arc<MemoryChats>,
    pub plans: Arc<MemoryPlans>,
    pub models: Arc<MemoryModels>,
    pub changelog: Arc<MemoryChangeLog>,
    pub storage: Arc<MemoryStorage>,
    pub payments: Arc<DummyProvider>,
    seed_counter: AtomicUsize,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_google(google: GoogleConfig) -> Self {
        let mut config = create_test_config();
        config.google = google;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let users = Arc::new(MemoryUsers::default());
        let chats = Arc::new(MemoryChats::default());
        let plans = Arc::new(MemoryPlans::default());
        let models = Arc::new(MemoryModels::default());
        let changelog = Arc::new(MemoryChangeLog::default());
        let storage = Arc::new(MemoryStorage::default());
        let payments = Arc::new(DummyProvider::new(DummyConfig::default()));
        let drive = Arc::new(DriveClient::new(config.google.clone()));

        let state = AppState::builder()
            .config(config)
            .users(users.clone())
            .chats(chats.clone())
            .plans(plans.clone())
            .models(models.clone())
            .changelog(changelog.clone())
            .storage(storage.clone())
            .payments(payments.clone())
            .drive(drive)
            .build();

        Self {
            state,
            users,
            chats,
            plans,
            models,
            changelog,
            storage,
            payments,
            seed_counter: AtomicUsize::new(0),
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(crate::router(self.state.clone())).unwrap()
    }

    /// Monotonic timestamps so "newest first" orderings are deterministic.
    fn next_timestamp(&self) -> chrono::DateTime<Utc> {
        let n = self.seed_counter.fetch_add(1, Ordering::SeqCst) as i64;
        Utc::now() + Duration::milliseconds(n)
    }

    fn blank_user(&self, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: email.split('@').next().unwrap_or("user").to_string(),
            password_hash: None,
            avatar_url: None,
            chat_points: 0,
            points_used: 0,
            points_reset_date: None,
            stripe_customer_id: None,
            subscription_id: None,
            subscription_status: None,
            default_payment_method: None,
            current_plan_id: None,
            request_plan_id: None,
            plan_start_date: None,
            plan_end_date: None,
            created_at: self.next_timestamp(),
        }
    }

    pub fn seed_user(&self, email: &str) -> User {
        let user = self.blank_user(email);
        self.users.insert(user.clone());
        user
    }

    pub fn seed_user_with_password(&self, email: &str, password: &str) -> User {
        let mut user = self.blank_user(email);
        user.password_hash = Some(crate::auth::password::hash_string(password).unwrap());
        self.users.insert(user.clone());
        user
    }

    pub fn seed_user_on_plan(&self, email: &str, plan_id: PlanId) -> User {
        let mut user = self.blank_user(email);
        user.current_plan_id = Some(plan_id);
        self.users.insert(user.clone());
        user
    }

    pub fn seed_customer(
        &self,
        email: &str,
        customer_id: &str,
        subscription_id: Option<&str>,
    ) -> User {
        let mut user = self.blank_user(email);
        user.stripe_customer_id = Some(customer_id.to_string());
        user.subscription_id = subscription_id.map(str::to_string);
        self.users.insert(user.clone());
        user
    }

    pub fn seed_plan(&self, name: &str, price: &str, is_yearly_plan: bool) -> Plan {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            price_id: None,
            points: 1000,
            is_yearly_plan,
            created_at: self.next_timestamp(),
        };
        self.plans.insert(plan.clone());
        plan
    }

    /// Plan with a provider price attached, as the plan-switch routes need.
    pub fn seed_priced_plan(&self, name: &str, price: &str, price_id: &str) -> Plan {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            price_id: Some(price_id.to_string()),
            points: 1000,
            is_yearly_plan: false,
            created_at: self.next_timestamp(),
        };
        self.plans.insert(plan.clone());
        plan
    }

    pub fn seed_model(&self, name: &str, provider: &str) -> AiModel {
        let model = AiModel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            provider: provider.to_string(),
            enabled: true,
            created_at: self.next_timestamp(),
        };
        self.models.insert(model.clone());
        model
    }

    pub fn seed_chat(
        &self,
        email: &str,
        session_key: &str,
        title: &str,
        messages: &[(&str, &str)],
    ) -> ChatSession {
        let user_id = self
            .users
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .unwrap_or_else(Uuid::new_v4);

        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            session_key: session_key.to_string(),
            title: title.to_string(),
            created_at: self.next_timestamp(),
        };
        self.chats.insert_session(email, session.clone());

        for (role, content) in messages {
            self.chats.insert_message(
                email,
                session_key,
                ChatMessage {
                    role: role.to_string(),
                    content: content.to_string(),
                    created_at: self.next_timestamp(),
                },
            );
        }
        session
    }

    pub fn seed_change_log(&self, title: &str, log: &str, category: &str) -> ChangeLogEntry {
        let entry = ChangeLogEntry {
            id: Uuid::new_v4(),
            title: title.to_string(),
            log: log.to_string(),
            category: category.to_string(),
            created_at: self.next_timestamp(),
        };
        self.changelog.insert(entry.clone());
        entry
    }
}
