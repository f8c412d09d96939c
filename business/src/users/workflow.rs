//! UI-facing operations of the users screen.
//!
//! Each function mutates states synchronously and dispatches the matching
//! command when a network call is needed. Dispatching spawns onto the
//! context's task set, so these must be called from within a tokio runtime;
//! results land after the host's next `sync_states()`.

use log::info;
use thiserror::Error;
use userdesk_states::StateCtx;

use super::delete::ConfirmDeleteCommand;
use super::edit::{DraftField, SubmitEditCommand};
use super::fetch_page::FetchUsersPageCommand;
use super::modal::{FlowError, UserModal};
use super::model::UserId;
use super::state::{PageRequest, UsersListState};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    State(#[from] userdesk_states::Error),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Load the current page when the screen first shows.
pub fn mount(ctx: &mut StateCtx) -> WorkflowResult<PageRequest> {
    let page = ctx.state::<UsersListState>()?.page();
    change_page(ctx, page)
}

/// Switch to `page`; any fetch still in flight is superseded.
pub fn change_page(ctx: &mut StateCtx, page: u32) -> WorkflowResult<PageRequest> {
    let request = ctx.update::<UsersListState, _>(|list| list.begin_fetch(page))?;
    ctx.dispatch::<FetchUsersPageCommand>()?;
    Ok(request)
}

/// Fetch the current page again.
pub fn refresh(ctx: &mut StateCtx) -> WorkflowResult<PageRequest> {
    mount(ctx)
}

pub fn set_search_term(ctx: &mut StateCtx, term: impl Into<String>) -> WorkflowResult<()> {
    let term = term.into();
    ctx.update::<UsersListState, _>(move |list| list.set_search_term(term))?;
    Ok(())
}

/// Open the edit dialog for a user of the current page.
pub fn open_edit(ctx: &mut StateCtx, id: UserId) -> WorkflowResult<()> {
    let user = ctx
        .state::<UsersListState>()?
        .find(id)
        .cloned()
        .ok_or(FlowError::UnknownUser(id))?;
    ctx.update::<UserModal, _>(|modal| modal.open_edit(&user))??;
    Ok(())
}

pub fn edit_draft(
    ctx: &mut StateCtx,
    field: DraftField,
    value: impl Into<String>,
) -> WorkflowResult<()> {
    let value = value.into();
    ctx.update::<UserModal, _>(move |modal| modal.set_draft_field(field, value))??;
    Ok(())
}

/// Validate the draft and send it. A rejected draft keeps the dialog open
/// with its message and makes no call.
pub fn submit_edit(ctx: &mut StateCtx) -> WorkflowResult<()> {
    let (id, _) = ctx.update::<UserModal, _>(UserModal::begin_edit_submit)??;
    info!("workflow: submitting edit of user {id}");
    ctx.dispatch::<SubmitEditCommand>()?;
    Ok(())
}

pub fn request_delete(ctx: &mut StateCtx, id: UserId) -> WorkflowResult<()> {
    ctx.update::<UserModal, _>(|modal| modal.request_delete(id))??;
    Ok(())
}

pub fn confirm_delete(ctx: &mut StateCtx) -> WorkflowResult<()> {
    let id = ctx.update::<UserModal, _>(UserModal::begin_delete_confirm)??;
    info!("workflow: deleting user {id}");
    ctx.dispatch::<ConfirmDeleteCommand>()?;
    Ok(())
}

/// Close the open dialog without any network call.
pub fn cancel_modal(ctx: &mut StateCtx) -> WorkflowResult<()> {
    ctx.update::<UserModal, _>(UserModal::cancel)?;
    Ok(())
}
