use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of points that unlock one hatch opportunity
pub const HATCH_STEP: i64 = 50;

/// Every child owns exactly this many egg slots
pub const TOTAL_EGG_SLOTS: usize = 20;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Child ID in format: "child::<epoch_millis>::<suffix>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    /// Display name chosen in settings (required, trimmed)
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Recurrence class of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCycle {
    /// Completable once per calendar day
    Daily,
    /// Completable once per ISO week
    Weekly,
    /// Completable exactly once, forever
    Once,
    /// Any cycle value this build does not understand; never completable
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TaskCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskCycle::Daily => "daily",
            TaskCycle::Weekly => "weekly",
            TaskCycle::Once => "once",
            TaskCycle::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A chore worth points. Tasks are shared by every child of an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: i64,
    pub cycle: TaskCycle,
}

/// Something a child can redeem points for; fulfilled by a parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cost: i64,
}

/// Stored marker of the last completion of a task.
///
/// Daily and once tasks record the completion time (epoch millis), weekly
/// tasks record the ISO week key (e.g. `2026-W42`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionMarker {
    At(i64),
    Week(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EggStatus {
    #[default]
    Unhatched,
    Hatched,
}

/// Collectible creature revealed by hatching an egg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spirit {
    pub id: String,
    pub name: String,
    pub img: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggSlot {
    pub status: EggStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spirit: Option<Spirit>,
    /// Epoch millis of the hatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatched_at: Option<i64>,
}

impl EggSlot {
    pub fn is_hatched(&self) -> bool {
        self.status == EggStatus::Hatched
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub reward_id: String,
    pub cost: i64,
    /// Epoch millis of the redemption
    pub timestamp: i64,
}

/// Mutable per-child record: points, completions, daily totals, eggs and redemptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChildProgress {
    pub points: i64,
    pub last_task_completion: BTreeMap<String, CompletionMarker>,
    /// Points earned per local calendar day, keyed by `YYYY-MM-DD`
    pub daily_points: BTreeMap<String, i64>,
    pub egg_slots: Vec<EggSlot>,
    pub redemptions: Vec<Redemption>,
}

impl Default for ChildProgress {
    fn default() -> Self {
        Self {
            points: 0,
            last_task_completion: BTreeMap::new(),
            daily_points: BTreeMap::new(),
            egg_slots: vec![EggSlot::default(); TOTAL_EGG_SLOTS],
            redemptions: Vec::new(),
        }
    }
}

impl ChildProgress {
    /// Pads the egg slots to at least [`TOTAL_EGG_SLOTS`]. Longer lists are kept as stored.
    pub fn normalized(mut self) -> Self {
        if self.egg_slots.len() < TOTAL_EGG_SLOTS {
            self.egg_slots.resize(TOTAL_EGG_SLOTS, EggSlot::default());
        }
        self
    }

    pub fn hatched_count(&self) -> usize {
        self.egg_slots.iter().filter(|slot| slot.is_hatched()).count()
    }
}

// ---------------------------------------------------------------------------
// Presentation DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastSeverity {
    Success,
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: ToastSeverity,
}

/// What happens when the user confirms the open modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalAction {
    /// Just close the modal
    Dismiss,
    ConfirmRedemption { reward_id: String },
    ConfirmDeleteChild { child_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalView {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub show_cancel: bool,
    pub on_confirm: ModalAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalResponse {
    pub modal: Option<ModalView>,
}

/// Result of a mutating user action, rendered by the UI as a toast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    pub severity: ToastSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastListResponse {
    pub toasts: Vec<Toast>,
}

/// Returned by every API call while the identity could not be established
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalErrorResponse {
    pub fatal: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Session and preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub namespace_path: String,
    pub active_child: Option<Child>,
}

/// Client-local flags, never synced to the document store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPreferences {
    pub active_child_id: Option<String>,
    pub first_run_seen: bool,
    pub background_audio_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub first_run_seen: Option<bool>,
    pub background_audio_enabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Settings requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub nickname: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    pub nickname: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
    pub active_child_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetActiveChildRequest {
    pub child_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: i64,
    pub cycle: TaskCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
    pub cycle: Option<TaskCycle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub name: String,
    pub description: Option<String>,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRewardRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
}

// ---------------------------------------------------------------------------
// Page views
// ---------------------------------------------------------------------------

/// The five screens of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Tasks,
    Shop,
    Spirits,
    Settings,
    Scores,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Tasks,
        Screen::Shop,
        Screen::Spirits,
        Screen::Settings,
        Screen::Scores,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Screen::Tasks => "tasks",
            Screen::Shop => "shop",
            Screen::Spirits => "spirits",
            Screen::Settings => "settings",
            Screen::Scores => "scores",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Screen> {
        Screen::ALL.into_iter().find(|screen| screen.slug() == slug)
    }
}

/// Shared header shown on every screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderView {
    pub active_child: Option<Child>,
    pub points: i64,
    pub children_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCard {
    pub task: Task,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksView {
    pub points: i64,
    pub pending: Vec<TaskCard>,
    pub completed: Vec<TaskCard>,
    /// True when every task is done for now
    pub all_done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCard {
    pub reward: Reward,
    pub affordable: bool,
    /// Points still missing (0 when affordable)
    pub points_short: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopView {
    pub points: i64,
    pub rewards: Vec<RewardCard>,
    pub redemptions: Vec<Redemption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggSlotView {
    pub index: usize,
    pub slot: EggSlot,
    pub can_hatch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiritsView {
    pub points: i64,
    pub hatched_count: usize,
    pub unhatched_count: usize,
    pub available_hatches: i64,
    pub points_to_next_hatch: i64,
    pub slots: Vec<EggSlotView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsView {
    pub children: Vec<Child>,
    pub active_child_id: Option<String>,
    pub tasks: Vec<Task>,
    pub rewards: Vec<Reward>,
    /// No child exists yet; the UI only offers child creation
    pub is_initial_setup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPointsEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub points: i64,
    /// Bar length relative to the best day, 0-100
    pub bar_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresView {
    pub total: i64,
    /// Most recent 30 days, newest first
    pub entries: Vec<DailyPointsEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "view", rename_all = "lowercase")]
pub enum PageContent {
    Tasks(TasksView),
    Shop(ShopView),
    Spirits(SpiritsView),
    Settings(SettingsView),
    Scores(ScoresView),
    /// Screen needs an active child and none exists
    NoActiveChild,
}

/// A rendered screen as delivered to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub screen: Screen,
    pub header: HeaderView,
    /// Set when the UI must navigate elsewhere (e.g. first run without children)
    pub redirect: Option<Screen>,
    pub content: PageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPageResponse {
    /// Incremented by every render pass of the session
    pub version: u64,
    pub page: Option<PageView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDailyPointsResponse {
    pub filename: String,
    pub csv_data: String,
}
