//! Default tasks and rewards preloaded into an empty namespace.

use anyhow::Result;
use shared::{TaskCycle, ToastSeverity};
use tracing::info;

use crate::session::SessionContext;
use crate::storage::{CollectionKind, Fields};
use serde_json::json;

pub const DEFAULTS_LOADED_MESSAGE: &str = "Default tasks and rewards loaded!";

fn default_tasks() -> Vec<(&'static str, &'static str, i64, TaskCycle)> {
    vec![
        ("Bedtime on time", "Brush teeth, change into pajamas and be in bed by 9pm.", 10, TaskCycle::Daily),
        ("Tidy up toys", "Put every toy back where it belongs after playing.", 15, TaskCycle::Daily),
        ("Help with chores", "Carry the clean laundry to the bedrooms.", 30, TaskCycle::Once),
        ("Reading time", "Read a book for at least 15 minutes.", 10, TaskCycle::Daily),
        ("Polite words", "Say please, thank you and sorry to grown-ups.", 5, TaskCycle::Daily),
    ]
}

fn default_rewards() -> Vec<(&'static str, &'static str, i64)> {
    vec![
        ("Weekend dessert", "An ice cream or a small cake after dinner.", 150),
        ("30 extra minutes", "Thirty more minutes of TV or games.", 200),
        ("Toy voucher", "A voucher for a new toy.", 500),
        ("Bedtime story", "One extra bedtime story from mum or dad.", 80),
        ("Family outing", "A weekend trip to the park with the whole family.", 400),
    ]
}

fn fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Seed empty task and reward collections. Returns true when anything was written.
pub async fn ensure_default_data(context: &SessionContext) -> Result<bool> {
    let store = context.store();
    let mut seeded = false;

    if store.list(CollectionKind::Tasks).await?.documents.is_empty() {
        for (name, description, points, cycle) in default_tasks() {
            let doc = fields(json!({
                "name": name,
                "description": description,
                "points": points,
                "cycle": cycle,
            }));
            store.create(CollectionKind::Tasks, doc).await?;
        }
        seeded = true;
    }

    if store.list(CollectionKind::Rewards).await?.documents.is_empty() {
        for (name, description, cost) in default_rewards() {
            let doc = fields(json!({
                "name": name,
                "description": description,
                "cost": cost,
            }));
            store.create(CollectionKind::Rewards, doc).await?;
        }
        seeded = true;
    }

    if seeded {
        info!("🌱 Loaded default tasks and rewards for {}", context.namespace().root_path);
        context.toasts().push(DEFAULTS_LOADED_MESSAGE, ToastSeverity::Info);
    }
    Ok(seeded)
}
