//! The user list controller.
//!
//! `UsersListState` owns the snapshot of the current page and everything the
//! list view renders: pagination, search term, loading/error status. It only
//! changes through the transitions below:
//!
//! - `begin_fetch` / `resolve_fetch`: page changes and their responses
//! - `apply_update` / `apply_delete`: local reconciliation after mutations
//! - `set_search_term`: view filter input
//!
//! Responses are tagged with the `PageRequest` that produced them; a response
//! whose request is no longer the latest one is discarded, so a slow reply for
//! a page the user already left never overwrites the newer snapshot.

use std::any::Any;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use userdesk_states::{SnapshotClone, State};

use crate::error::ApiError;
use crate::users::model::{User, UserId, UserPage, UserPatch};

/// Status of the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStatus {
    Idle,
    #[default]
    Loading,
    Error,
}

/// Identity of one page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersListState {
    status: ListStatus,
    users: Vec<User>,
    page: u32,
    total_pages: u32,
    per_page: u32,
    total: u32,
    search_term: String,
    error_message: Option<String>,

    /// Sequence number of the most recently issued fetch.
    request_seq: u64,
    /// The fetch the list is waiting on, if any.
    pending: Option<PageRequest>,
    last_fetch: Option<DateTime<Utc>>,
}

impl Default for UsersListState {
    fn default() -> Self {
        Self {
            status: ListStatus::Loading,
            users: Vec::new(),
            page: 1,
            total_pages: 1,
            per_page: 0,
            total: 0,
            search_term: String::new(),
            error_message: None,
            request_seq: 0,
            pending: None,
            last_fetch: None,
        }
    }
}

impl UsersListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start fetching `page`, superseding any fetch still in flight.
    ///
    /// Pages are 1-based; `0` is treated as `1`.
    pub fn begin_fetch(&mut self, page: u32) -> PageRequest {
        self.request_seq += 1;
        let request = PageRequest {
            page: page.max(1),
            seq: self.request_seq,
        };
        self.page = request.page;
        self.status = ListStatus::Loading;
        self.pending = Some(request);
        info!("UsersListState: fetching page {} (#{})", request.page, request.seq);
        request
    }

    /// Apply the outcome of `request`. Returns `false` when it was stale and ignored.
    ///
    /// `now` stamps `last_fetch` on success.
    pub fn resolve_fetch(
        &mut self,
        request: PageRequest,
        outcome: Result<UserPage, ApiError>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.pending != Some(request) {
            debug!(
                "UsersListState: dropping stale response for page {} (#{}, latest #{})",
                request.page, request.seq, self.request_seq
            );
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(page) => {
                self.users = page.data;
                self.page = page.page.max(1);
                self.total_pages = page.total_pages.max(1);
                self.per_page = page.per_page;
                self.total = page.total;
                self.status = ListStatus::Idle;
                self.error_message = None;
                self.last_fetch = Some(now);
            }
            Err(err) => {
                warn!("UsersListState: fetching page {} failed: {err}", request.page);
                // Keep the last good snapshot on screen.
                self.status = ListStatus::Error;
                self.error_message = Some(format!("Failed to fetch users: {err}"));
            }
        }
        true
    }

    /// Merge `patch` into the user with `id`, in place. No-op if absent.
    pub fn apply_update(&mut self, id: UserId, patch: &UserPatch) -> bool {
        match self.users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                patch.apply_to(user);
                true
            }
            None => false,
        }
    }

    /// Remove the user with `id`, preserving order. No-op if absent.
    pub fn apply_delete(&mut self, id: UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|user| user.id != id);
        self.users.len() != before
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// The users matching the search term, in list order. Recomputed on every call.
    pub fn visible_users(&self) -> Vec<&User> {
        self.users
            .iter()
            .filter(|user| matches_search(user, &self.search_term))
            .collect()
    }

    pub fn find(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    /// Nothing to show yet: the view should render a spinner.
    pub fn is_initial_load(&self) -> bool {
        self.is_loading() && self.users.is_empty()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn pending(&self) -> Option<PageRequest> {
        self.pending
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }
}

/// Case-insensitive match of `term` against the full name or the email.
///
/// A blank term matches everyone.
pub fn matches_search(user: &User, term: &str) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    user.full_name().to_lowercase().contains(&term) || user.email.to_lowercase().contains(&term)
}

impl SnapshotClone for UsersListState {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for UsersListState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
