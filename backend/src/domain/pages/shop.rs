//! Reward shop. Redeeming is a two-step flow: the request opens a confirm
//! modal, confirming records the redemption for a parent to fulfil.

use shared::{ActionResponse, ChildProgress, ModalAction, RewardCard, ShopView, ToastSeverity};
use tracing::info;

use super::{active_child_progress, finish, reject, update_progress};
use crate::domain::errors::{ActionError, RuleViolation};
use crate::domain::rules;
use crate::presentation::ModalOptions;
use crate::session::SessionContext;
use crate::sync::MirrorState;

pub fn render(state: &MirrorState, progress: &ChildProgress) -> ShopView {
    let rewards = state
        .rewards
        .iter()
        .map(|reward| RewardCard {
            reward: reward.clone(),
            affordable: rules::can_redeem(progress, reward),
            points_short: (reward.cost - progress.points).max(0),
        })
        .collect();

    let mut redemptions = progress.redemptions.clone();
    redemptions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    ShopView { points: progress.points, rewards, redemptions }
}

/// Open the confirm modal for redeeming `reward_id`
pub fn request_redemption(context: &SessionContext, reward_id: &str) -> Result<ActionResponse, ActionError> {
    info!("🛍️ Redemption requested for {}", reward_id);
    let (child, progress) = active_child_progress(context).map_err(|e| reject(context, e))?;
    let reward = context
        .mirror()
        .read()
        .find_reward(reward_id)
        .cloned()
        .ok_or_else(|| reject(context, ActionError::RewardNotFound(reward_id.to_string())))?;

    if !rules::can_redeem(&progress, &reward) {
        let violation = RuleViolation::InsufficientPoints { needed: reward.cost, available: progress.points };
        return Err(reject(context, violation.into()));
    }

    let modal = context.modal().open(
        format!("Redeem {}?", reward.name),
        format!(
            "{} wants \"{}\" for {} points. A parent will hand it over.",
            child.nickname, reward.name, reward.cost
        ),
        "Redeem",
        ModalAction::ConfirmRedemption { reward_id: reward.id.clone() },
        ModalOptions::default(),
    );

    Ok(ActionResponse { success: true, message: modal.title, severity: ToastSeverity::Info })
}

/// Record the redemption; runs when the confirm modal is accepted
pub async fn confirm_redemption(context: &SessionContext, reward_id: &str) -> Result<ActionResponse, ActionError> {
    info!("🛍️ Confirming redemption of {}", reward_id);
    let result = try_confirm_redemption(context, reward_id).await;
    finish(context, result)
}

async fn try_confirm_redemption(context: &SessionContext, reward_id: &str) -> Result<String, ActionError> {
    let (child, _) = active_child_progress(context)?;
    let reward = context
        .mirror()
        .read()
        .find_reward(reward_id)
        .cloned()
        .ok_or_else(|| ActionError::RewardNotFound(reward_id.to_string()))?;

    let now = context.now();
    let redeemed = reward.clone();
    let updated = update_progress(context, &child.id, move |progress| {
        rules::redeem_reward(progress, &redeemed, &now)
    })
    .await?;

    info!(
        "🛍️ {} redeemed '{}' ({} points), {} redemptions on record",
        child.nickname,
        reward.name,
        reward.cost,
        updated.redemptions.len()
    );
    Ok(format!("Redeemed \"{}\"! Ask a parent to hand it over.", reward.name))
}
