//! # Settings Screen
//!
//! Parent-facing management of children, tasks and rewards plus the
//! client-local preferences. Every form is validated before anything is
//! written; a failed validation or write leaves the mirror as it was.
//!
//! Deleting a child is confirmed through the modal slot and also removes
//! the child's progress record. The active child is reconciled after every
//! change to the children collection.

use serde_json::{json, Value};
use shared::{
    ActionResponse, Child, ChildListResponse, ChildResponse, CreateChildRequest, CreateRewardRequest,
    CreateTaskRequest, LocalPreferences, ModalAction, Reward, SettingsView, Task, ToastSeverity,
    UpdateChildRequest, UpdatePreferencesRequest, UpdateRewardRequest, UpdateTaskRequest,
};
use tracing::{error, info};

use super::{finish, reject, succeed};
use crate::domain::errors::ActionError;
use crate::domain::validation::{
    validate_create_child, validate_create_reward, validate_create_task, validate_update_child,
    validate_update_reward, validate_update_task,
};
use crate::presentation::ModalOptions;
use crate::session::SessionContext;
use crate::storage::documents::from_document;
use crate::storage::{CollectionKind, Fields, WriteOptions};
use crate::sync::MirrorState;

pub fn render(state: &MirrorState) -> SettingsView {
    SettingsView {
        children: state.kids.clone(),
        active_child_id: state.active_child_id.clone(),
        tasks: state.tasks.clone(),
        rewards: state.rewards.clone(),
        is_initial_setup: state.kids.is_empty(),
    }
}

fn fields_of(pairs: Vec<(&str, Option<Value>)>) -> Fields {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect()
}

/// Write a document, apply it to the mirror and decode it back
async fn save<T: serde::de::DeserializeOwned>(
    context: &SessionContext,
    kind: CollectionKind,
    id: Option<&str>,
    fields: Fields,
) -> Result<T, ActionError> {
    let receipt = context.store().write(kind, id, fields, WriteOptions::deep()).await?;
    context.confirm_write(kind, &receipt);
    Ok(from_document(&receipt.document)?)
}

fn ensure_child(context: &SessionContext, child_id: &str) -> Result<Child, ActionError> {
    context
        .mirror()
        .read()
        .find_child(child_id)
        .cloned()
        .ok_or_else(|| ActionError::ChildNotFound(child_id.to_string()))
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

pub fn list_children(context: &SessionContext) -> ChildListResponse {
    let state = context.mirror().read();
    ChildListResponse { children: state.kids.clone(), active_child_id: state.active_child_id.clone() }
}

pub async fn create_child(context: &SessionContext, request: CreateChildRequest) -> Result<ChildResponse, ActionError> {
    info!("👶 Creating child: {:?}", request);
    let result = async {
        validate_create_child(&request)?;
        let fields = fields_of(vec![
            ("nickname", Some(json!(request.nickname.trim()))),
            ("age", request.age.map(|age| json!(age))),
            ("gender", request.gender.map(|gender| json!(gender))),
        ]);
        save::<Child>(context, CollectionKind::Children, None, fields).await
    }
    .await;

    match result {
        Ok(child) => {
            let success_message = format!("Welcome, {}!", child.nickname);
            succeed(context, success_message.clone());
            info!("👶 Created child {} ({})", child.nickname, child.id);
            Ok(ChildResponse { child, success_message })
        }
        Err(e) => Err(reject(context, e)),
    }
}

pub async fn update_child(
    context: &SessionContext,
    child_id: &str,
    request: UpdateChildRequest,
) -> Result<ChildResponse, ActionError> {
    info!("👶 Updating child {}: {:?}", child_id, request);
    let result = async {
        validate_update_child(&request)?;
        ensure_child(context, child_id)?;
        let fields = fields_of(vec![
            ("nickname", request.nickname.as_deref().map(|nickname| json!(nickname.trim()))),
            ("age", request.age.map(|age| json!(age))),
            ("gender", request.gender.map(|gender| json!(gender))),
        ]);
        save::<Child>(context, CollectionKind::Children, Some(child_id), fields).await
    }
    .await;

    match result {
        Ok(child) => {
            let success_message = format!("Saved changes for {}.", child.nickname);
            succeed(context, success_message.clone());
            Ok(ChildResponse { child, success_message })
        }
        Err(e) => Err(reject(context, e)),
    }
}

/// Ask for confirmation before deleting a child
pub fn request_delete_child(context: &SessionContext, child_id: &str) -> Result<ActionResponse, ActionError> {
    let child = ensure_child(context, child_id).map_err(|e| reject(context, e))?;
    let modal = context.modal().open(
        format!("Delete {}?", child.nickname),
        format!(
            "All of {}'s points, eggs and spirits will be removed. This cannot be undone.",
            child.nickname
        ),
        "Delete",
        ModalAction::ConfirmDeleteChild { child_id: child.id.clone() },
        ModalOptions::default(),
    );
    Ok(ActionResponse { success: true, message: modal.title, severity: ToastSeverity::Info })
}

/// Delete a child together with its progress record
pub async fn delete_child(context: &SessionContext, child_id: &str) -> Result<ActionResponse, ActionError> {
    info!("🗑️ Deleting child {}", child_id);
    let result = async {
        let child = ensure_child(context, child_id)?;
        let revision = context.store().delete(CollectionKind::Children, child_id).await?;
        context.confirm_delete(CollectionKind::Children, child_id, revision);

        // The child is gone either way; a leftover progress record is only logged
        match context.store().delete(CollectionKind::Progress, child_id).await {
            Ok(revision) => context.confirm_delete(CollectionKind::Progress, child_id, revision),
            Err(e) => error!("Failed to delete progress of {}: {}", child_id, e),
        }
        Ok::<_, ActionError>(format!("Removed {}.", child.nickname))
    }
    .await;
    finish(context, result)
}

pub fn set_active_child(context: &SessionContext, child_id: &str) -> Result<ActionResponse, ActionError> {
    info!("👤 Switching active child to {}", child_id);
    let result = ensure_child(context, child_id).and_then(|child| {
        context
            .set_active_child(Some(child.id.clone()))
            .map_err(|e| ActionError::WriteFailed(e.to_string()))?;
        Ok(format!("Now playing as {}.", child.nickname))
    });
    finish(context, result)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn ensure_task(context: &SessionContext, task_id: &str) -> Result<(), ActionError> {
    match context.mirror().read().find_task(task_id) {
        Some(_) => Ok(()),
        None => Err(ActionError::TaskNotFound(task_id.to_string())),
    }
}

pub async fn create_task(context: &SessionContext, request: CreateTaskRequest) -> Result<Task, ActionError> {
    info!("📝 Creating task: {:?}", request);
    let result = async {
        validate_create_task(&request)?;
        let fields = fields_of(vec![
            ("name", Some(json!(request.name.trim()))),
            ("description", Some(json!(request.description.trim()))),
            ("points", Some(json!(request.points))),
            ("cycle", Some(json!(request.cycle))),
        ]);
        save::<Task>(context, CollectionKind::Tasks, None, fields).await
    }
    .await;
    saved(context, result, |task| format!("Task \"{}\" added.", task.name))
}

pub async fn update_task(
    context: &SessionContext,
    task_id: &str,
    request: UpdateTaskRequest,
) -> Result<Task, ActionError> {
    info!("📝 Updating task {}: {:?}", task_id, request);
    let result = async {
        validate_update_task(&request)?;
        ensure_task(context, task_id)?;
        let fields = fields_of(vec![
            ("name", request.name.as_deref().map(|name| json!(name.trim()))),
            ("description", request.description.as_deref().map(|d| json!(d.trim()))),
            ("points", request.points.map(|points| json!(points))),
            ("cycle", request.cycle.map(|cycle| json!(cycle))),
        ]);
        save::<Task>(context, CollectionKind::Tasks, Some(task_id), fields).await
    }
    .await;
    saved(context, result, |task| format!("Task \"{}\" saved.", task.name))
}

pub async fn delete_task(context: &SessionContext, task_id: &str) -> Result<ActionResponse, ActionError> {
    info!("🗑️ Deleting task {}", task_id);
    let result = async {
        ensure_task(context, task_id)?;
        let revision = context.store().delete(CollectionKind::Tasks, task_id).await?;
        context.confirm_delete(CollectionKind::Tasks, task_id, revision);
        Ok::<_, ActionError>("Task deleted.".to_string())
    }
    .await;
    finish(context, result)
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

fn ensure_reward(context: &SessionContext, reward_id: &str) -> Result<(), ActionError> {
    match context.mirror().read().find_reward(reward_id) {
        Some(_) => Ok(()),
        None => Err(ActionError::RewardNotFound(reward_id.to_string())),
    }
}

pub async fn create_reward(context: &SessionContext, request: CreateRewardRequest) -> Result<Reward, ActionError> {
    info!("🎁 Creating reward: {:?}", request);
    let result = async {
        validate_create_reward(&request)?;
        let fields = fields_of(vec![
            ("name", Some(json!(request.name.trim()))),
            ("description", request.description.as_deref().map(|d| json!(d.trim()))),
            ("cost", Some(json!(request.cost))),
        ]);
        save::<Reward>(context, CollectionKind::Rewards, None, fields).await
    }
    .await;
    saved(context, result, |reward| format!("Reward \"{}\" added.", reward.name))
}

pub async fn update_reward(
    context: &SessionContext,
    reward_id: &str,
    request: UpdateRewardRequest,
) -> Result<Reward, ActionError> {
    info!("🎁 Updating reward {}: {:?}", reward_id, request);
    let result = async {
        validate_update_reward(&request)?;
        ensure_reward(context, reward_id)?;
        let fields = fields_of(vec![
            ("name", request.name.as_deref().map(|name| json!(name.trim()))),
            ("description", request.description.as_deref().map(|d| json!(d.trim()))),
            ("cost", request.cost.map(|cost| json!(cost))),
        ]);
        save::<Reward>(context, CollectionKind::Rewards, Some(reward_id), fields).await
    }
    .await;
    saved(context, result, |reward| format!("Reward \"{}\" saved.", reward.name))
}

pub async fn delete_reward(context: &SessionContext, reward_id: &str) -> Result<ActionResponse, ActionError> {
    info!("🗑️ Deleting reward {}", reward_id);
    let result = async {
        ensure_reward(context, reward_id)?;
        let revision = context.store().delete(CollectionKind::Rewards, reward_id).await?;
        context.confirm_delete(CollectionKind::Rewards, reward_id, revision);
        Ok::<_, ActionError>("Reward deleted.".to_string())
    }
    .await;
    finish(context, result)
}

fn saved<T>(
    context: &SessionContext,
    result: Result<T, ActionError>,
    message: impl FnOnce(&T) -> String,
) -> Result<T, ActionError> {
    match result {
        Ok(entity) => {
            succeed(context, message(&entity));
            Ok(entity)
        }
        Err(e) => Err(reject(context, e)),
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

pub fn get_preferences(context: &SessionContext) -> LocalPreferences {
    context.preferences().get()
}

pub fn update_preferences(
    context: &SessionContext,
    request: UpdatePreferencesRequest,
) -> Result<LocalPreferences, ActionError> {
    info!("⚙️ Updating preferences: {:?}", request);
    apply_preferences(context, &request).map_err(|e| reject(context, ActionError::WriteFailed(e.to_string())))
}

fn apply_preferences(context: &SessionContext, request: &UpdatePreferencesRequest) -> anyhow::Result<LocalPreferences> {
    if let Some(enabled) = request.background_audio_enabled {
        context.set_background_audio(enabled)?;
    }
    if let Some(seen) = request.first_run_seen {
        context.preferences().update(|prefs| prefs.first_run_seen = seen)?;
    }
    Ok(context.preferences().get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pages::test_support::*;
    use crate::domain::pages::{confirm_modal, tasks};
    use crate::domain::validation::ValidationError;
    use crate::session::context::test_support::test_session;
    use crate::session::PreferencesRepository;
    use crate::storage::DocumentStore;
    use shared::{Gender, TaskCycle};

    #[tokio::test]
    async fn test_create_child_trims_and_becomes_active() {
        let session = test_session().await;
        let request = CreateChildRequest { nickname: "  Mia ".to_string(), age: Some(6), gender: Some(Gender::Female) };

        let response = create_child(&session.context, request).await.unwrap();

        assert_eq!(response.child.nickname, "Mia");
        assert_eq!(response.child.age, Some(6));
        assert_eq!(list_children(&session.context).active_child_id, Some(response.child.id.clone()));
        assert_eq!(
            PreferencesRepository::load(&session.connection).get().active_child_id,
            Some(response.child.id)
        );
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let session = test_session().await;
        let blank = CreateChildRequest { nickname: " ".to_string(), age: None, gender: None };

        let error = create_child(&session.context, blank).await.unwrap_err();

        assert!(matches!(error, ActionError::Validation(ValidationError::EmptyNickname)));
        assert!(session.memory.list(CollectionKind::Children).await.unwrap().documents.is_empty());
        assert!(session.context.toasts().active().iter().any(|t| t.message == "Please enter a nickname."));
    }

    #[tokio::test]
    async fn test_update_child_keeps_unspecified_fields() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;

        let request = UpdateChildRequest { nickname: Some("Mimi".to_string()), age: None, gender: None };
        let response = update_child(&session.context, &mia.id, request).await.unwrap();

        assert_eq!(response.child.nickname, "Mimi");
        assert_eq!(response.child.age, Some(7));
    }

    #[tokio::test]
    async fn test_delete_child_via_modal_removes_progress_and_reselects() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let ben = add_child(&session, "Ben").await;
        let chore = add_task(&session, "Read", 10, TaskCycle::Daily).await;
        tasks::complete_task(&session.context, &chore.id).await.unwrap();

        request_delete_child(&session.context, &mia.id).unwrap();
        confirm_modal(&session.context).await.unwrap();

        let state = session.context.mirror().snapshot();
        assert!(state.find_child(&mia.id).is_none());
        assert!(!state.kid_data.contains_key(&mia.id));
        assert_eq!(state.active_child_id, Some(ben.id));
        assert!(session.memory.get(CollectionKind::Progress, &mia.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_last_child_returns_to_initial_setup() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;

        delete_child(&session.context, &mia.id).await.unwrap();

        let state = session.context.mirror().snapshot();
        assert_eq!(state.active_child_id, None);
        assert!(render(&state).is_initial_setup);
    }

    #[tokio::test]
    async fn test_set_active_child_rejects_unknown_id() {
        let session = test_session().await;
        add_child(&session, "Mia").await;
        let ben = add_child(&session, "Ben").await;

        set_active_child(&session.context, &ben.id).unwrap();
        assert_eq!(list_children(&session.context).active_child_id, Some(ben.id.clone()));

        assert!(matches!(
            set_active_child(&session.context, "child::nobody"),
            Err(ActionError::ChildNotFound(_))
        ));
        assert_eq!(list_children(&session.context).active_child_id, Some(ben.id));
    }

    #[tokio::test]
    async fn test_task_crud() {
        let session = test_session().await;
        let task = add_task(&session, "Feed the fish", 5, TaskCycle::Daily).await;

        let request = UpdateTaskRequest { name: None, description: None, points: Some(8), cycle: Some(TaskCycle::Weekly) };
        let updated = update_task(&session.context, &task.id, request).await.unwrap();
        assert_eq!(updated.name, "Feed the fish");
        assert_eq!(updated.points, 8);
        assert_eq!(updated.cycle, TaskCycle::Weekly);

        let zero = UpdateTaskRequest { name: None, description: None, points: Some(0), cycle: None };
        assert!(matches!(
            update_task(&session.context, &task.id, zero).await,
            Err(ActionError::Validation(ValidationError::NonPositivePoints))
        ));

        delete_task(&session.context, &task.id).await.unwrap();
        assert!(session.context.mirror().read().tasks.is_empty());
        assert!(matches!(
            delete_task(&session.context, &task.id).await,
            Err(ActionError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reward_crud() {
        let session = test_session().await;
        let reward = add_reward(&session, "Cinema", 300).await;

        let request = UpdateRewardRequest { name: Some("Cinema trip".to_string()), description: None, cost: None };
        let updated = update_reward(&session.context, &reward.id, request).await.unwrap();
        assert_eq!(updated.name, "Cinema trip");
        assert_eq!(updated.cost, 300);

        let free = CreateRewardRequest { name: "Hug".to_string(), description: None, cost: 0 };
        assert!(matches!(
            create_reward(&session.context, free).await,
            Err(ActionError::Validation(ValidationError::NonPositiveCost))
        ));

        delete_reward(&session.context, &reward.id).await.unwrap();
        assert!(session.context.mirror().read().rewards.is_empty());
    }

    #[tokio::test]
    async fn test_preferences_update() {
        let session = test_session().await;
        let request = UpdatePreferencesRequest { first_run_seen: Some(true), background_audio_enabled: Some(true) };

        let prefs = update_preferences(&session.context, request).unwrap();

        assert!(prefs.first_run_seen);
        assert!(prefs.background_audio_enabled);
        assert!(session.context.audio().is_playing());
        assert_eq!(PreferencesRepository::load(&session.connection).get(), prefs);
    }
}
