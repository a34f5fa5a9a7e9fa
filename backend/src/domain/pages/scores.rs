//! Scores screen: daily point history of the active child and its CSV export.

use shared::{ChildProgress, DailyPointsEntry, ExportDailyPointsResponse, ScoresView};
use tracing::info;

use super::{active_child_progress, reject};
use crate::domain::errors::ActionError;
use crate::domain::export_service;
use crate::session::SessionContext;

/// Number of days listed on the scores screen
pub const HISTORY_DAYS: usize = 30;

pub fn render(progress: &ChildProgress) -> ScoresView {
    let total = progress.daily_points.values().fold(0i64, |sum, points| sum.saturating_add(*points));

    let recent: Vec<(&String, &i64)> = progress.daily_points.iter().rev().take(HISTORY_DAYS).collect();
    let best = recent.iter().map(|(_, points)| **points).max().unwrap_or(0);

    let entries = recent
        .into_iter()
        .map(|(date, points)| DailyPointsEntry {
            date: date.clone(),
            points: *points,
            bar_percent: bar_percent(*points, best),
        })
        .collect();

    ScoresView { total, entries }
}

fn bar_percent(points: i64, best: i64) -> u32 {
    if best <= 0 || points <= 0 {
        return 0;
    }
    ((points as f64 * 100.0 / best as f64).round() as u32).min(100)
}

/// CSV of the active child's daily points
pub fn export_daily_points(context: &SessionContext) -> Result<ExportDailyPointsResponse, ActionError> {
    info!("📄 Exporting daily points");
    let (child, progress) = active_child_progress(context).map_err(|e| reject(context, e))?;
    export_service::export_daily_points(&child, &progress, &context.now())
        .map_err(|e| reject(context, ActionError::WriteFailed(format!("export failed: {}", e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pages::test_support::*;
    use crate::domain::pages::tasks;
    use crate::session::context::test_support::{test_now, test_session};
    use chrono::Duration;
    use shared::TaskCycle;

    fn progress_with(days: &[(&str, i64)]) -> ChildProgress {
        let mut progress = ChildProgress::default();
        for (date, points) in days {
            progress.daily_points.insert(date.to_string(), *points);
        }
        progress
    }

    #[test]
    fn test_scenario_e_newest_first_with_relative_bars() {
        let view = render(&progress_with(&[("2026-10-14", 10), ("2026-10-15", 40), ("2026-10-16", 25)]));

        assert_eq!(view.total, 75);
        let dates: Vec<&str> = view.entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-10-16", "2026-10-15", "2026-10-14"]);
        let bars: Vec<u32> = view.entries.iter().map(|e| e.bar_percent).collect();
        assert_eq!(bars, vec![63, 100, 25]);
    }

    #[test]
    fn test_only_last_thirty_days_listed_but_total_covers_all() {
        let first = chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut progress = ChildProgress::default();
        for offset in 0..40 {
            let date = first + Duration::days(offset);
            progress.daily_points.insert(date.format("%Y-%m-%d").to_string(), 5);
        }

        let view = render(&progress);
        assert_eq!(view.total, 200);
        assert_eq!(view.entries.len(), HISTORY_DAYS);
        assert_eq!(view.entries[0].date, "2026-10-10");
        assert_eq!(view.entries[HISTORY_DAYS - 1].date, "2026-09-11");
        assert!(view.entries.iter().all(|e| e.bar_percent == 100));
    }

    #[test]
    fn test_empty_history() {
        let view = render(&ChildProgress::default());
        assert_eq!(view.total, 0);
        assert!(view.entries.is_empty());
        assert_eq!(bar_percent(0, 0), 0);
    }

    #[tokio::test]
    async fn test_export_requires_active_child() {
        let session = test_session().await;
        assert!(matches!(export_daily_points(&session.context), Err(ActionError::NoActiveChild)));
    }

    #[tokio::test]
    async fn test_export_after_completions() {
        let session = test_session().await;
        add_child(&session, "Mia").await;
        let chore = add_task(&session, "Read", 10, TaskCycle::Daily).await;
        tasks::complete_task(&session.context, &chore.id).await.unwrap();
        session.clock.set(test_now() + Duration::days(1));
        tasks::complete_task(&session.context, &chore.id).await.unwrap();

        let export = export_daily_points(&session.context).unwrap();

        assert_eq!(export.filename, "Mia_daily_points_20261017.csv");
        assert_eq!(export.csv_data, "date,points\n2026-10-16,10\n2026-10-17,10\n");
    }
}
