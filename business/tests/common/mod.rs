//! Shared helpers for the integration tests: a mock server wired into a
//! `StateCtx`, sample users, and an in-memory `UsersApi`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use userdesk_business::users::{UpdatedUser, User, UserId, UserPage, UserPatch, UsersApi};
use userdesk_business::{
    ApiError, ApiResult, BusinessConfig, MemoryTokenStore, await_pending_tasks, build_state_ctx,
    build_state_ctx_with_api, flush_and_await,
};
use userdesk_states::StateCtx;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn user(id: UserId, first_name: &str, last_name: &str) -> User {
    User {
        id,
        email: format!(
            "{}.{}@reqres.in",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
    }
}

/// The first page of the demo data set.
pub fn page_one_users() -> Vec<User> {
    vec![
        user(1, "George", "Bluth"),
        user(2, "Janet", "Weaver"),
        user(3, "Emma", "Wong"),
        user(4, "Eve", "Holt"),
        user(5, "Charles", "Morris"),
        user(6, "Tracey", "Ramos"),
    ]
}

pub fn page_two_users() -> Vec<User> {
    vec![
        user(7, "Michael", "Lawson"),
        user(8, "Lindsay", "Ferguson"),
        user(9, "Tobias", "Funke"),
    ]
}

pub fn page_body(page: u32, total_pages: u32, users: &[User]) -> Value {
    json!({
        "page": page,
        "per_page": 6,
        "total": total_pages * 6,
        "total_pages": total_pages,
        "data": users,
        "support": {
            "url": "https://reqres.in/#support-heading",
            "text": "To keep ReqRes free, contributions towards server costs are appreciated!"
        }
    })
}

/// Test context that holds a mock server and a `StateCtx` pointed at it.
pub struct TestContext {
    pub mock_server: MockServer,
    pub ctx: StateCtx,
    pub tokens: MemoryTokenStore,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(MemoryTokenStore::new()).await
    }

    pub async fn with_token(token: &str) -> Self {
        Self::build(MemoryTokenStore::with_token(token)).await
    }

    async fn build(tokens: MemoryTokenStore) -> Self {
        init_logger();
        let mock_server = MockServer::start().await;
        let config = BusinessConfig::new(format!("{}/api", mock_server.uri()));
        let ctx = build_state_ctx(config, Arc::new(tokens.clone()));
        Self {
            mock_server,
            ctx,
            tokens,
        }
    }

    pub async fn mock_page(&self, page: u32, total_pages: u32, users: &[User], delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(page, total_pages, users))
                    .set_delay(delay),
            )
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_page_error(&self, page: u32, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Wait for every spawned command and apply their updates.
    pub async fn wait(&mut self) {
        await_pending_tasks(&mut self.ctx).await;
        self.ctx.sync_states();
    }

    pub async fn flush_and_wait(&mut self) {
        flush_and_await(&mut self.ctx).await;
    }
}

/// `UsersApi` over an in-memory list, recording every call.
#[derive(Debug, Default)]
pub struct FakeUsersApi {
    users: Mutex<Vec<User>>,
    fail_with: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeUsersApi {
    pub fn with_users(users: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(users),
            ..Self::default()
        })
    }

    /// Make every following call fail with `err`, or succeed again with `None`.
    pub fn fail_with(&self, err: Option<ApiError>) {
        *self.fail_with.lock().unwrap() = err;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn record(&self, call: String) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UsersApi for FakeUsersApi {
    async fn list_users(&self, page: u32) -> ApiResult<UserPage> {
        self.record(format!("list {page}"))?;
        let users = self.users.lock().unwrap().clone();
        Ok(UserPage {
            page,
            per_page: 6,
            total: u32::try_from(users.len()).unwrap(),
            total_pages: 1,
            data: users,
        })
    }

    async fn get_user(&self, id: UserId) -> ApiResult<User> {
        self.record(format!("get {id}"))?;
        self.stored(id)
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> ApiResult<UpdatedUser> {
        self.record(format!("update {id}"))?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
        patch.apply_to(user);
        Ok(UpdatedUser {
            first_name: patch.first_name.clone(),
            last_name: patch.last_name.clone(),
            email: patch.email.clone(),
            updated_at: Some("2026-10-18T09:30:00.000Z".to_owned()),
        })
    }

    async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        self.record(format!("delete {id}"))?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

/// A `StateCtx` over `api` whose first page has already been loaded.
pub async fn mounted_ctx(api: Arc<FakeUsersApi>) -> StateCtx {
    init_logger();
    let mut ctx = build_state_ctx_with_api(
        BusinessConfig::default(),
        Arc::new(MemoryTokenStore::with_token("QpwL5tke4Pnpja7X4")),
        api,
    );
    userdesk_business::users::workflow::mount(&mut ctx).unwrap();
    await_pending_tasks(&mut ctx).await;
    ctx
}
