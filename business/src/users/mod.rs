//! The user management screen: API client, list controller and the two
//! modal flows.

mod api;
mod delete;
mod edit;
mod fetch_page;
mod modal;
mod model;
mod state;
pub mod workflow;

pub use api::{HttpUsersApi, UsersApi, UsersApiHandle};
pub use delete::{ConfirmDeleteCommand, DeleteFlow};
pub use edit::{DraftField, EditFlow, SubmitEditCommand, UserDraft};
pub use fetch_page::FetchUsersPageCommand;
pub use modal::{FlowError, UserModal};
pub use model::{UpdatedUser, User, UserId, UserPage, UserPatch};
pub use state::{ListStatus, PageRequest, UsersListState, matches_search};
