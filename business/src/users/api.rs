//! Users API client.
//!
//! `UsersApi` is the seam the commands talk to; `HttpUsersApi` is the real
//! implementation against `/users`. Every request asks the injected
//! `TokenProvider` for the current token and attaches
//! `Authorization: Bearer <token>` when there is one. A missing token is not
//! an error here: the server decides.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use userdesk_states::{SnapshotClone, State};
use ustr::Ustr;

use crate::error::{ApiError, ApiResult};
use crate::http::{Client, RequestBuilder};
use crate::token::TokenProvider;
use crate::users::model::{SingleUserResponse, UpdatedUser, User, UserId, UserPage, UserPatch};

#[async_trait]
pub trait UsersApi: Send + Sync + Debug {
    /// GET `/users?page={page}`
    async fn list_users(&self, page: u32) -> ApiResult<UserPage>;

    /// GET `/users/{id}`
    async fn get_user(&self, id: UserId) -> ApiResult<User>;

    /// PUT `/users/{id}` with only the fields present in `patch`.
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> ApiResult<UpdatedUser>;

    /// DELETE `/users/{id}`. A user that is already gone counts as deleted.
    async fn delete_user(&self, id: UserId) -> ApiResult<()>;
}

#[derive(Debug, Clone)]
pub struct HttpUsersApi {
    base_url: Ustr,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpUsersApi {
    pub fn new(base_url: Ustr, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url,
            client: Client::new(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.tokens.get_token();
        request.bearer(token.as_deref())
    }
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    async fn list_users(&self, page: u32) -> ApiResult<UserPage> {
        let request = self.authorized(self.client.get(self.url(&format!("/users?page={page}"))));
        let response = request.send().await?;

        if !response.is_success() {
            return Err(ApiError::from_response(
                &response,
                &format!("users page {page}"),
            ));
        }

        response
            .json::<UserPage>()
            .map_err(|e| ApiError::decode("UserPage", &e))
    }

    async fn get_user(&self, id: UserId) -> ApiResult<User> {
        let request = self.authorized(self.client.get(self.url(&format!("/users/{id}"))));
        let response = request.send().await?;

        if !response.is_success() {
            return Err(ApiError::from_response(&response, &format!("user {id}")));
        }

        response
            .json::<SingleUserResponse>()
            .map(|single| single.data)
            .map_err(|e| ApiError::decode("SingleUserResponse", &e))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> ApiResult<UpdatedUser> {
        let request = self
            .authorized(self.client.put(self.url(&format!("/users/{id}"))))
            .json(patch)
            .map_err(|e| ApiError::Validation(format!("Failed to serialize request: {e}")))?;
        let response = request.send().await?;

        if !response.is_success() {
            return Err(ApiError::from_response(&response, &format!("user {id}")));
        }

        // The echo is informational; the update itself succeeded.
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(UpdatedUser::default());
        }
        Ok(response.json::<UpdatedUser>().unwrap_or_else(|e| {
            warn!("update_user: ignoring unreadable echo for user {id}: {e}");
            UpdatedUser::default()
        }))
    }

    async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        let request = self.authorized(self.client.delete(self.url(&format!("/users/{id}"))));
        let response = request.send().await?;

        if response.status == 404 {
            info!("delete_user: user {id} already gone, treating as deleted");
            return Ok(());
        }
        if !response.is_success() {
            return Err(ApiError::from_response(&response, &format!("user {id}")));
        }
        Ok(())
    }
}

/// The users API as a registered state, so commands can reach it.
#[derive(Debug, Clone)]
pub struct UsersApiHandle {
    api: Arc<dyn UsersApi>,
}

impl UsersApiHandle {
    pub fn new(api: Arc<dyn UsersApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> Arc<dyn UsersApi> {
        Arc::clone(&self.api)
    }
}

impl SnapshotClone for UsersApiHandle {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for UsersApiHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
