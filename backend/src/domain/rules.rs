//! # Rules Engine
//!
//! Pure decision functions over [`ChildProgress`]. Nothing here performs
//! I/O: callers pass the current time (in the child's local time zone) and,
//! for hatching, a [`SpiritPicker`].
//!
//! ## Completion markers
//!
//! | cycle  | stored marker          | eligible when                          |
//! |--------|------------------------|----------------------------------------|
//! | daily  | epoch millis           | marker's local date is not today       |
//! | weekly | ISO week key `YYYY-Www`| marker's week is not the current week  |
//! | once   | epoch millis           | no marker at all                       |
//!
//! Tasks with a cycle this build does not understand are never eligible.

use chrono::{DateTime, Datelike, TimeZone};
use shared::{
    ChildProgress, CompletionMarker, EggStatus, Redemption, Reward, Spirit, Task, TaskCycle,
    HATCH_STEP, TOTAL_EGG_SLOTS,
};
use std::collections::BTreeMap;
use std::fmt::Display;

use super::errors::RuleViolation;
use super::spirits::SpiritPicker;

/// Local calendar day, `YYYY-MM-DD`
pub fn day_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%Y-%m-%d").to_string()
}

/// ISO week, `YYYY-Www`
pub fn week_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let week = now.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn local_time<Tz: TimeZone>(millis: i64, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    now.timezone().timestamp_millis_opt(millis).single()
}

pub fn is_task_eligible<Tz: TimeZone>(
    task: &Task,
    last_completion: &BTreeMap<String, CompletionMarker>,
    now: &DateTime<Tz>,
) -> bool {
    let marker = last_completion.get(&task.id);
    match task.cycle {
        TaskCycle::Daily => match marker {
            Some(CompletionMarker::At(millis)) => local_time(*millis, now)
                .map(|done| done.date_naive() != now.date_naive())
                .unwrap_or(true),
            // Left over from the task's time as a weekly task
            Some(CompletionMarker::Week(_)) | None => true,
        },
        TaskCycle::Weekly => match marker {
            Some(CompletionMarker::Week(key)) => *key != week_key(now),
            Some(CompletionMarker::At(millis)) => local_time(*millis, now)
                .map(|done| week_key(&done) != week_key(now))
                .unwrap_or(true),
            None => true,
        },
        TaskCycle::Once => marker.is_none(),
        TaskCycle::Unknown => false,
    }
}

/// Record a completion. Does not check eligibility, see [`complete_task`].
///
/// Fails instead of overflowing when the totals would leave `i64`.
pub fn apply_completion<Tz: TimeZone>(
    mut progress: ChildProgress,
    task: &Task,
    now: &DateTime<Tz>,
) -> Result<ChildProgress, RuleViolation>
where
    Tz::Offset: Display,
{
    let marker = match task.cycle {
        TaskCycle::Weekly => CompletionMarker::Week(week_key(now)),
        _ => CompletionMarker::At(now.timestamp_millis()),
    };

    let today = day_key(now);
    let points_limit = || RuleViolation::PointsLimitReached { task_name: task.name.clone() };
    let points = progress.points.checked_add(task.points).ok_or_else(points_limit)?;
    let today_points = progress
        .daily_points
        .get(&today)
        .copied()
        .unwrap_or(0)
        .checked_add(task.points)
        .ok_or_else(points_limit)?;

    progress.points = points;
    progress.last_task_completion.insert(task.id.clone(), marker);
    progress.daily_points.insert(today, today_points);
    Ok(progress)
}

/// Eligibility check followed by [`apply_completion`]
pub fn complete_task<Tz: TimeZone>(
    progress: ChildProgress,
    task: &Task,
    now: &DateTime<Tz>,
) -> Result<ChildProgress, RuleViolation>
where
    Tz::Offset: Display,
{
    if !is_task_eligible(task, &progress.last_task_completion, now) {
        return Err(RuleViolation::TaskAlreadyCompleted { task_name: task.name.clone() });
    }
    apply_completion(progress, task, now)
}

pub fn can_redeem(progress: &ChildProgress, reward: &Reward) -> bool {
    progress.points >= reward.cost
}

/// Append a redemption record. Points are left untouched: the record is a
/// request for a parent to fulfil, not a debit.
pub fn apply_redemption<Tz: TimeZone>(
    mut progress: ChildProgress,
    reward: &Reward,
    now: &DateTime<Tz>,
) -> ChildProgress {
    progress.redemptions.push(Redemption {
        reward_id: reward.id.clone(),
        cost: reward.cost,
        timestamp: now.timestamp_millis(),
    });
    progress
}

/// Affordability check followed by [`apply_redemption`]
pub fn redeem_reward<Tz: TimeZone>(
    progress: ChildProgress,
    reward: &Reward,
    now: &DateTime<Tz>,
) -> Result<ChildProgress, RuleViolation> {
    if !can_redeem(&progress, reward) {
        return Err(RuleViolation::InsufficientPoints {
            needed: reward.cost,
            available: progress.points,
        });
    }
    Ok(apply_redemption(progress, reward, now))
}

/// Hatch opportunities earned but not yet claimed
pub fn hatches_available(progress: &ChildProgress) -> i64 {
    let earned = progress.points.max(0) / HATCH_STEP;
    (earned - progress.hatched_count() as i64).max(0)
}

pub fn points_until_next_hatch(points: i64) -> i64 {
    let remainder = points.rem_euclid(HATCH_STEP);
    if remainder == 0 {
        0
    } else {
        HATCH_STEP - remainder
    }
}

/// True when going from `before` to `after` points crossed a hatch threshold
pub fn crossed_hatch_threshold(before: i64, after: i64) -> bool {
    after.max(0) / HATCH_STEP > before.max(0) / HATCH_STEP
}

/// Whether the egg in `slot` may hatch now
pub fn check_hatch(progress: &ChildProgress, slot: usize) -> Result<(), RuleViolation> {
    let egg = progress
        .egg_slots
        .get(slot)
        .filter(|_| slot < TOTAL_EGG_SLOTS)
        .ok_or(RuleViolation::SlotOutOfRange { slot })?;
    if egg.is_hatched() {
        return Err(RuleViolation::EggAlreadyHatched { slot });
    }
    if hatches_available(progress) == 0 {
        let shortfall = points_until_next_hatch(progress.points);
        return Err(RuleViolation::NoHatchAvailable {
            points_to_next: if shortfall == 0 { HATCH_STEP } else { shortfall },
        });
    }
    Ok(())
}

/// Hatch the egg in `slot`, revealing a spirit chosen by `picker`
pub fn hatch<Tz: TimeZone>(
    progress: ChildProgress,
    slot: usize,
    picker: &dyn SpiritPicker,
    now: &DateTime<Tz>,
) -> Result<(ChildProgress, Spirit), RuleViolation> {
    let mut progress = progress.normalized();
    check_hatch(&progress, slot)?;

    let owned: Vec<String> = progress
        .egg_slots
        .iter()
        .filter_map(|s| s.spirit.as_ref().map(|spirit| spirit.id.clone()))
        .collect();
    let spirit = picker.pick(&owned);

    let egg = &mut progress.egg_slots[slot];
    egg.status = EggStatus::Hatched;
    egg.spirit = Some(spirit.clone());
    egg.hatched_at = Some(now.timestamp_millis());

    Ok((progress, spirit))
}
