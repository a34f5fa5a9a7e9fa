//! # Page Controllers
//!
//! One module per screen. Every controller follows the same pattern:
//!
//! 1. read the mirrored state for the active child
//! 2. render a view model decorated by the rules engine ([`render_page`])
//! 3. turn a user action into a rules transition plus a store write
//!
//! Mutating actions never panic on a stale UI: a missing active child, a
//! deleted entity or a transition the rules refuse all end in a toast and
//! an [`ActionError`], with the store left untouched. Writes go through
//! the store first; the mirror only sees a document once the store has
//! accepted it ([`SessionContext::confirm_write`]).

pub mod scores;
pub mod settings;
pub mod shop;
pub mod spirits;
pub mod tasks;

use chrono::{DateTime, FixedOffset};
use shared::{
    ActionResponse, Child, ChildProgress, HeaderView, ModalAction, ModalResponse, PageContent,
    PageView, Screen, ToastSeverity,
};
use tracing::{info, warn};

use super::errors::{ActionError, RuleViolation};
use crate::session::SessionContext;
use crate::storage::documents::{progress_from_fields, progress_to_fields};
use crate::storage::{CollectionKind, TransactFn};
use crate::sync::MirrorState;

/// Render `screen` from the mirror as of `now`
pub fn render_page(screen: Screen, state: &MirrorState, now: &DateTime<FixedOffset>) -> PageView {
    let header = header_view(state);

    // First run: nothing but settings makes sense without a child
    if screen != Screen::Settings && state.is_loaded(CollectionKind::Children) && state.kids.is_empty() {
        return PageView {
            screen,
            header,
            redirect: Some(Screen::Settings),
            content: PageContent::NoActiveChild,
        };
    }

    let content = match (screen, state.active_child()) {
        (Screen::Settings, _) => PageContent::Settings(settings::render(state)),
        (_, None) => PageContent::NoActiveChild,
        (screen, Some(child)) => {
            let progress = state.progress_for(&child.id);
            match screen {
                Screen::Tasks => PageContent::Tasks(tasks::render(state, &progress, now)),
                Screen::Shop => PageContent::Shop(shop::render(state, &progress)),
                Screen::Spirits => PageContent::Spirits(spirits::render(&progress)),
                Screen::Scores => PageContent::Scores(scores::render(&progress)),
                Screen::Settings => PageContent::Settings(settings::render(state)),
            }
        }
    };

    PageView { screen, header, redirect: None, content }
}

fn header_view(state: &MirrorState) -> HeaderView {
    let active_child = state.active_child().cloned();
    let points = active_child
        .as_ref()
        .map(|child| state.progress_for(&child.id).points)
        .unwrap_or(0);
    HeaderView { active_child, points, children_count: state.kids.len() }
}

pub(crate) fn require_active_child(state: &MirrorState) -> Result<Child, ActionError> {
    state.active_child().cloned().ok_or(ActionError::NoActiveChild)
}

/// Active child and its progress, read from the mirror
pub(crate) fn active_child_progress(context: &SessionContext) -> Result<(Child, ChildProgress), ActionError> {
    let state = context.mirror().read();
    let child = require_active_child(&state)?;
    let progress = state.progress_for(&child.id);
    Ok((child, progress))
}

/// Success toast plus the matching response
pub(crate) fn succeed(context: &SessionContext, message: impl Into<String>) -> ActionResponse {
    let message = message.into();
    context.toasts().push(message.clone(), ToastSeverity::Success);
    ActionResponse { success: true, message, severity: ToastSeverity::Success }
}

/// Toast for a rejected action; hands the error back to the caller
pub(crate) fn reject(context: &SessionContext, error: ActionError) -> ActionError {
    warn!("Action rejected: {}", error);
    context.toasts().push(error.user_message(), error.severity());
    error
}

pub(crate) fn finish(
    context: &SessionContext,
    result: Result<String, ActionError>,
) -> Result<ActionResponse, ActionError> {
    match result {
        Ok(message) => Ok(succeed(context, message)),
        Err(e) => Err(reject(context, e)),
    }
}

/// Atomically rewrite a child's progress record.
///
/// `change` runs inside the store transaction against the stored record, so
/// rules are re-checked against the latest data rather than the mirror.
/// The accepted record is applied to the mirror and returned.
pub(crate) async fn update_progress<F>(
    context: &SessionContext,
    child_id: &str,
    change: F,
) -> Result<ChildProgress, ActionError>
where
    F: FnOnce(ChildProgress) -> Result<ChildProgress, RuleViolation> + Send + 'static,
{
    let update: TransactFn = Box::new(move |current| {
        let progress = match current {
            Some(fields) => progress_from_fields(&fields)?,
            None => ChildProgress::default(),
        };
        let next = change(progress)?;
        Ok(progress_to_fields(&next)?)
    });

    let receipt = context.store().transact(CollectionKind::Progress, child_id, update).await?;
    context.confirm_write(CollectionKind::Progress, &receipt);
    Ok(progress_from_fields(&receipt.document.fields)?)
}

/// Close the open modal and run its confirm action.
///
/// The modal is taken out of the slot before the action starts, so a second
/// confirm finds nothing to run and a modal opened meanwhile stays open.
pub async fn confirm_modal(context: &SessionContext) -> Result<ActionResponse, ActionError> {
    let Some(modal) = context.modal().close() else {
        return Ok(ActionResponse {
            success: true,
            message: "Nothing to confirm.".to_string(),
            severity: ToastSeverity::Info,
        });
    };
    info!("🪟 Confirming modal '{}' ({:?})", modal.title, modal.on_confirm);

    match &modal.on_confirm {
        ModalAction::Dismiss => Ok(ActionResponse {
            success: true,
            message: modal.confirm_label.clone(),
            severity: ToastSeverity::Info,
        }),
        ModalAction::ConfirmRedemption { reward_id } => shop::confirm_redemption(context, reward_id).await,
        ModalAction::ConfirmDeleteChild { child_id } => settings::delete_child(context, child_id).await,
    }
}

pub fn cancel_modal(context: &SessionContext) -> ModalResponse {
    if let Some(modal) = context.modal().close() {
        info!("🪟 Cancelled modal '{}'", modal.title);
    }
    ModalResponse { modal: None }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::session::context::test_support::TestSession;
    use shared::{CreateChildRequest, CreateRewardRequest, CreateTaskRequest, Reward, Task, TaskCycle};

    pub async fn add_child(session: &TestSession, nickname: &str) -> Child {
        let request = CreateChildRequest { nickname: nickname.to_string(), age: Some(7), gender: None };
        settings::create_child(&session.context, request).await.unwrap().child
    }

    pub async fn add_task(session: &TestSession, name: &str, points: i64, cycle: TaskCycle) -> Task {
        let request = CreateTaskRequest { name: name.to_string(), description: String::new(), points, cycle };
        settings::create_task(&session.context, request).await.unwrap()
    }

    pub async fn add_reward(session: &TestSession, name: &str, cost: i64) -> Reward {
        let request = CreateRewardRequest { name: name.to_string(), description: None, cost };
        settings::create_reward(&session.context, request).await.unwrap()
    }

    pub fn progress_of(session: &TestSession, child: &Child) -> ChildProgress {
        session.context.mirror().read().progress_for(&child.id)
    }
}
