//! Tasks screen: the chores of the active child, split into what can be
//! done now and what is already done for this day, week or forever.

use chrono::{DateTime, FixedOffset};
use shared::{ActionResponse, ChildProgress, TaskCard, TasksView, ToastSeverity};
use tracing::info;

use super::{active_child_progress, finish, update_progress};
use crate::domain::errors::{ActionError, RuleViolation};
use crate::domain::rules;
use crate::session::SessionContext;
use crate::sync::MirrorState;

pub const EGG_EARNED_MESSAGE: &str = "You earned a spirit egg!";

pub fn render(state: &MirrorState, progress: &ChildProgress, now: &DateTime<FixedOffset>) -> TasksView {
    let (pending, completed): (Vec<TaskCard>, Vec<TaskCard>) = state
        .tasks
        .iter()
        .map(|task| TaskCard {
            task: task.clone(),
            eligible: rules::is_task_eligible(task, &progress.last_task_completion, now),
        })
        .partition(|card| card.eligible);

    TasksView {
        points: progress.points,
        all_done: pending.is_empty() && !completed.is_empty(),
        pending,
        completed,
    }
}

/// Complete a task for the active child
pub async fn complete_task(context: &SessionContext, task_id: &str) -> Result<ActionResponse, ActionError> {
    info!("✅ Completing task {}", task_id);
    let result = try_complete_task(context, task_id).await;
    finish(context, result)
}

async fn try_complete_task(context: &SessionContext, task_id: &str) -> Result<String, ActionError> {
    let (child, progress) = active_child_progress(context)?;
    let task = context
        .mirror()
        .read()
        .find_task(task_id)
        .cloned()
        .ok_or_else(|| ActionError::TaskNotFound(task_id.to_string()))?;

    let now = context.now();
    if !rules::is_task_eligible(&task, &progress.last_task_completion, &now) {
        return Err(RuleViolation::TaskAlreadyCompleted { task_name: task.name }.into());
    }

    let completed = task.clone();
    let updated = update_progress(context, &child.id, move |progress| {
        rules::complete_task(progress, &completed, &now)
    })
    .await?;

    info!("✅ {} completed '{}' (+{}), now {} points", child.nickname, task.name, task.points, updated.points);
    if rules::crossed_hatch_threshold(updated.points - task.points, updated.points) {
        context.toasts().push(EGG_EARNED_MESSAGE, ToastSeverity::Success);
    }

    Ok(format!("Great job! +{} points for \"{}\".", task.points, task.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pages::test_support::*;
    use crate::session::context::test_support::{test_now, test_session};
    use crate::session::context::test_support::TestSession;
    use crate::storage::documents::{progress_from_fields, progress_to_fields};
    use crate::storage::{CollectionKind, DocumentStore, WriteOptions};
    use chrono::Duration;
    use shared::{Child, PageContent, Screen, TaskCycle};

    /// Store a progress record from another device. The session stops
    /// listening first, so its mirror keeps the old record.
    async fn write_elsewhere(session: &TestSession, child: &Child, progress: &ChildProgress) {
        session.context.shutdown();
        session
            .memory
            .write(CollectionKind::Progress, &child.id, progress_to_fields(progress).unwrap(), WriteOptions::replace())
            .await
            .unwrap();
    }

    async fn stored_progress(session: &TestSession, child: &Child) -> ChildProgress {
        let document = session.memory.get(CollectionKind::Progress, &child.id).await.unwrap().unwrap();
        progress_from_fields(&document.fields).unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_completion_updates_points_and_history() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let task = add_task(&session, "Brush teeth", 10, TaskCycle::Daily).await;

        let response = complete_task(&session.context, &task.id).await.unwrap();

        assert!(response.success);
        let progress = progress_of(&session, &mia);
        assert_eq!(progress.points, 10);
        assert_eq!(progress.daily_points["2026-10-16"], 10);
        assert_eq!(rules::hatches_available(&progress), 0);

        let stored = session.memory.get(CollectionKind::Progress, &mia.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_scenario_d_second_completion_same_day_is_rejected() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let task = add_task(&session, "Brush teeth", 10, TaskCycle::Daily).await;
        complete_task(&session.context, &task.id).await.unwrap();

        session.clock.set(test_now() + Duration::hours(8));
        let error = complete_task(&session.context, &task.id).await.unwrap_err();

        assert!(matches!(error, ActionError::Rule(RuleViolation::TaskAlreadyCompleted { .. })));
        assert_eq!(progress_of(&session, &mia).points, 10);
        let toasts = session.context.toasts().active();
        assert!(toasts.iter().any(|t| t.severity == ToastSeverity::Danger));
    }

    #[tokio::test]
    async fn test_daily_task_is_available_again_next_day() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let task = add_task(&session, "Brush teeth", 10, TaskCycle::Daily).await;
        complete_task(&session.context, &task.id).await.unwrap();

        session.clock.set(test_now() + Duration::days(1));
        complete_task(&session.context, &task.id).await.unwrap();

        let progress = progress_of(&session, &mia);
        assert_eq!(progress.points, 20);
        assert_eq!(progress.daily_points.len(), 2);
    }

    #[tokio::test]
    async fn test_crossing_fifty_raises_egg_toast() {
        let session = test_session().await;
        add_child(&session, "Mia").await;
        let big = add_task(&session, "Clean the garage", 45, TaskCycle::Once).await;
        let small = add_task(&session, "Water plants", 10, TaskCycle::Daily).await;

        complete_task(&session.context, &big.id).await.unwrap();
        assert!(!session.context.toasts().active().iter().any(|t| t.message == EGG_EARNED_MESSAGE));

        complete_task(&session.context, &small.id).await.unwrap();
        assert!(session.context.toasts().active().iter().any(|t| t.message == EGG_EARNED_MESSAGE));
    }

    #[tokio::test]
    async fn test_rejected_without_child_or_task() {
        let session = test_session().await;
        let task = add_task(&session, "Read", 10, TaskCycle::Daily).await;
        assert!(matches!(
            complete_task(&session.context, &task.id).await,
            Err(ActionError::NoActiveChild)
        ));

        add_child(&session, "Mia").await;
        assert!(matches!(
            complete_task(&session.context, "task::gone").await,
            Err(ActionError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_write_leaves_mirror_untouched() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let task = add_task(&session, "Read", 10, TaskCycle::Daily).await;

        session.memory.deny_writes(true);
        let error = complete_task(&session.context, &task.id).await.unwrap_err();

        assert!(matches!(error, ActionError::PermissionDenied(_)));
        assert_eq!(progress_of(&session, &mia).points, 0);
    }

    #[tokio::test]
    async fn test_render_splits_pending_and_completed() {
        let session = test_session().await;
        add_child(&session, "Mia").await;
        let once = add_task(&session, "Help carry laundry", 30, TaskCycle::Once).await;
        add_task(&session, "Read", 10, TaskCycle::Weekly).await;
        complete_task(&session.context, &once.id).await.unwrap();

        let PageContent::Tasks(view) = session.context.open_page(Screen::Tasks).content else {
            panic!("expected tasks view");
        };
        assert_eq!(view.points, 30);
        assert_eq!(view.pending.len(), 1);
        assert_eq!(view.completed.len(), 1);
        assert_eq!(view.completed[0].task.id, once.id);
        assert!(!view.all_done);
    }

    #[tokio::test]
    async fn test_completion_keeps_progress_written_elsewhere() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let brush = add_task(&session, "Brush teeth", 10, TaskCycle::Daily).await;
        let read = add_task(&session, "Read", 15, TaskCycle::Daily).await;

        let other_device = rules::complete_task(ChildProgress::default(), &brush, &test_now()).unwrap();
        write_elsewhere(&session, &mia, &other_device).await;
        assert_eq!(progress_of(&session, &mia).points, 0);

        complete_task(&session.context, &read.id).await.unwrap();

        for progress in [stored_progress(&session, &mia).await, progress_of(&session, &mia)] {
            assert_eq!(progress.points, 25);
            assert_eq!(progress.daily_points["2026-10-16"], 25);
            assert!(progress.last_task_completion.contains_key(&brush.id));
            assert!(progress.last_task_completion.contains_key(&read.id));
        }
    }

    #[tokio::test]
    async fn test_task_completed_elsewhere_is_rejected_inside_the_write() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let brush = add_task(&session, "Brush teeth", 10, TaskCycle::Daily).await;

        let other_device = rules::complete_task(ChildProgress::default(), &brush, &test_now()).unwrap();
        write_elsewhere(&session, &mia, &other_device).await;

        let error = complete_task(&session.context, &brush.id).await.unwrap_err();

        assert!(matches!(error, ActionError::Rule(RuleViolation::TaskAlreadyCompleted { .. })));
        let stored = stored_progress(&session, &mia).await;
        assert_eq!(stored.points, 10);
        assert_eq!(stored.daily_points["2026-10-16"], 10);
    }

    #[tokio::test]
    async fn test_completion_at_the_points_ceiling_is_refused_and_store_stays_usable() {
        let session = test_session().await;
        let mia = add_child(&session, "Mia").await;
        let big = add_task(&session, "Clean the garage", 10, TaskCycle::Daily).await;
        let small = add_task(&session, "Water plants", 1, TaskCycle::Daily).await;

        let near_limit = ChildProgress { points: i64::MAX - 5, ..ChildProgress::default() };
        write_elsewhere(&session, &mia, &near_limit).await;

        let error = complete_task(&session.context, &big.id).await.unwrap_err();
        assert!(matches!(error, ActionError::Rule(RuleViolation::PointsLimitReached { .. })));
        assert_eq!(stored_progress(&session, &mia).await.points, i64::MAX - 5);

        complete_task(&session.context, &small.id).await.unwrap();
        assert_eq!(stored_progress(&session, &mia).await.points, i64::MAX - 4);
    }
}
