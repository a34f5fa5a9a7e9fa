//! Spirit collection: twenty egg slots per child. Every 50 points earn one
//! hatch; hatched slots reveal a spirit whose story can be narrated.

use shared::{
    ActionResponse, ChildProgress, EggSlotView, ModalAction, SpiritsView, ToastSeverity, TOTAL_EGG_SLOTS,
};
use tracing::info;

use super::{active_child_progress, finish, reject, update_progress};
use crate::domain::errors::{ActionError, RuleViolation};
use crate::domain::rules;
use crate::presentation::ModalOptions;
use crate::session::SessionContext;

pub fn render(progress: &ChildProgress) -> SpiritsView {
    let progress = progress.clone().normalized();
    let available_hatches = rules::hatches_available(&progress);
    let hatched_count = progress.hatched_count();

    let slots = progress
        .egg_slots
        .iter()
        .enumerate()
        .map(|(index, slot)| EggSlotView {
            index,
            slot: slot.clone(),
            can_hatch: index < TOTAL_EGG_SLOTS && !slot.is_hatched() && available_hatches > 0,
        })
        .collect();

    SpiritsView {
        points: progress.points,
        hatched_count,
        unhatched_count: progress.egg_slots.len().saturating_sub(hatched_count),
        available_hatches,
        points_to_next_hatch: rules::points_until_next_hatch(progress.points),
        slots,
    }
}

/// Hatch the egg in `slot` for the active child and reveal its spirit
pub async fn hatch_egg(context: &SessionContext, slot: usize) -> Result<ActionResponse, ActionError> {
    info!("🥚 Hatch requested for slot {}", slot);
    context.narrator().stop();
    let result = try_hatch_egg(context, slot).await;
    finish(context, result)
}

async fn try_hatch_egg(context: &SessionContext, slot: usize) -> Result<String, ActionError> {
    let (child, progress) = active_child_progress(context)?;
    rules::check_hatch(&progress, slot)?;

    let picker = context.spirit_picker();
    let now = context.now();
    let updated = update_progress(context, &child.id, move |progress| {
        rules::hatch(progress, slot, picker.as_ref(), &now).map(|(progress, _)| progress)
    })
    .await?;

    let spirit = updated
        .egg_slots
        .get(slot)
        .and_then(|egg| egg.spirit.clone())
        .ok_or_else(|| ActionError::WriteFailed(format!("slot {} has no spirit after hatching", slot)))?;

    info!("🐣 {} hatched {} in slot {}", child.nickname, spirit.id, slot);
    context.modal().open(
        format!("{} hatched!", spirit.name),
        spirit.desc.clone(),
        "Yay!",
        ModalAction::Dismiss,
        ModalOptions::without_cancel(),
    );

    Ok(format!("You hatched {}!", spirit.name))
}

/// Read the story of a hatched spirit aloud, cancelling any story in progress
pub fn narrate_slot(context: &SessionContext, slot: usize) -> Result<ActionResponse, ActionError> {
    let (_, progress) = active_child_progress(context).map_err(|e| reject(context, e))?;

    let spirit = match progress.egg_slots.get(slot) {
        None => Err(RuleViolation::SlotOutOfRange { slot }),
        Some(egg) => egg.spirit.clone().filter(|_| egg.is_hatched()).ok_or(RuleViolation::EggNotHatched { slot }),
    }
    .map_err(|violation| reject(context, violation.into()))?;

    let utterance = context.narrator().speak(&spirit.desc);
    info!("🔊 Narrating {} (utterance {})", spirit.id, utterance);
    Ok(ActionResponse {
        success: true,
        message: format!("Telling the story of {}.", spirit.name),
        severity: ToastSeverity::Info,
    })
}

pub fn stop_narration(context: &SessionContext) -> ActionResponse {
    context.narrator().stop();
    ActionResponse { success: true, message: "Narration stopped.".to_string(), severity: ToastSeverity::Info }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pages::test_support::*;
    use crate::domain::pages::tasks;
    use crate::presentation::narration::tests::RecordingSpeechEngine;
    use crate::session::context::test_support::{test_session, TestSession};
    use shared::{Child, PageContent, Screen, TaskCycle, HATCH_STEP};
    use std::sync::Arc;

    async fn child_with_points(session: &TestSession, points: i64) -> Child {
        let child = add_child(session, "Mia").await;
        let chore = add_task(session, "Big chore", points, TaskCycle::Once).await;
        tasks::complete_task(&session.context, &chore.id).await.unwrap();
        child
    }

    #[tokio::test]
    async fn test_scenario_b_hatch_reveals_spirit_and_keeps_points() {
        let session = test_session().await;
        let mia = child_with_points(&session, 50).await;

        hatch_egg(&session.context, 0).await.unwrap();

        let progress = progress_of(&session, &mia);
        assert!(progress.egg_slots[0].is_hatched());
        assert!(progress.egg_slots[0].spirit.is_some());
        assert_eq!(progress.points, 50);
        assert_eq!(rules::hatches_available(&progress), 0);

        let modal = session.context.modal().current().unwrap();
        assert!(!modal.show_cancel);
        assert_eq!(modal.on_confirm, ModalAction::Dismiss);
    }

    #[tokio::test]
    async fn test_second_hatch_without_points_is_rejected() {
        let session = test_session().await;
        let mia = child_with_points(&session, 50).await;
        hatch_egg(&session.context, 0).await.unwrap();

        let error = hatch_egg(&session.context, 1).await.unwrap_err();

        assert!(matches!(
            error,
            ActionError::Rule(RuleViolation::NoHatchAvailable { points_to_next }) if points_to_next == HATCH_STEP
        ));
        assert!(!progress_of(&session, &mia).egg_slots[1].is_hatched());
    }

    #[tokio::test]
    async fn test_hatched_slot_cannot_hatch_again() {
        let session = test_session().await;
        child_with_points(&session, 100).await;
        hatch_egg(&session.context, 3).await.unwrap();

        assert!(matches!(
            hatch_egg(&session.context, 3).await,
            Err(ActionError::Rule(RuleViolation::EggAlreadyHatched { slot: 3 }))
        ));
        assert!(matches!(
            hatch_egg(&session.context, TOTAL_EGG_SLOTS).await,
            Err(ActionError::Rule(RuleViolation::SlotOutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_narration_only_for_hatched_slots_and_stopped_by_hatch() {
        let session = test_session().await;
        let engine = Arc::new(RecordingSpeechEngine::default());
        let context = session.context.clone().with_speech_engine(engine.clone());
        let mia = add_child(&session, "Mia").await;
        let chore = add_task(&session, "Big chore", 100, TaskCycle::Once).await;
        tasks::complete_task(&context, &chore.id).await.unwrap();

        assert!(matches!(
            narrate_slot(&context, 0),
            Err(ActionError::Rule(RuleViolation::EggNotHatched { slot: 0 }))
        ));

        hatch_egg(&context, 0).await.unwrap();
        narrate_slot(&context, 0).unwrap();
        narrate_slot(&context, 0).unwrap();
        assert_eq!(context.narrator().active_utterance(), Some(2));

        hatch_egg(&context, 1).await.unwrap();
        assert_eq!(context.narrator().active_utterance(), None);
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec!["speak:1", "cancel:1", "speak:2", "cancel:2"]
        );
        assert_eq!(progress_of(&session, &mia).hatched_count(), 2);
    }

    #[tokio::test]
    async fn test_render_counts_and_hatch_flags() {
        let session = test_session().await;
        child_with_points(&session, 130).await;
        hatch_egg(&session.context, 0).await.unwrap();

        let PageContent::Spirits(view) = session.context.open_page(Screen::Spirits).content else {
            panic!("expected spirits view");
        };
        assert_eq!(view.hatched_count, 1);
        assert_eq!(view.unhatched_count, TOTAL_EGG_SLOTS - 1);
        assert_eq!(view.available_hatches, 1);
        assert_eq!(view.points_to_next_hatch, 20);
        assert!(!view.slots[0].can_hatch);
        assert!(view.slots[1].can_hatch);
        assert_eq!(view.slots.len(), TOTAL_EGG_SLOTS);
    }
}
