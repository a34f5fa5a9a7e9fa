//! # Session Context
//!
//! Everything one running session owns, bundled in a cheaply clonable
//! handle that page controllers receive explicitly:
//!
//! - the identity namespace and its reactive document store
//! - the in-memory mirror plus the active-child selection
//! - local preferences
//! - toasts, the modal slot, narration and background audio
//! - the render scheduler of the open page
//! - the clock and the spirit picker
//!
//! [`SessionContext::start`] subscribes to the four collections. Each
//! snapshot is applied to the mirror and schedules a render; a feed error
//! raises a toast and leaves the mirror as it was.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use shared::{PageView, Screen, ToastSeverity};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::clock::{Clock, SystemClock};
use super::identity::UserNamespace;
use super::preferences::PreferencesRepository;
use crate::config::AppConfig;
use crate::domain::pages;
use crate::domain::spirits::{RandomSpiritPicker, SpiritPicker};
use crate::presentation::{
    AudioSink, BackgroundAudio, LoggingAudioSink, LoggingSpeechEngine, ModalSlot, Narrator,
    SpeechEngine, ToastQueue,
};
use crate::storage::{CollectionKind, DocumentStore, Snapshot, StoreError, WriteReceipt};
use crate::sync::{Mirror, ReactiveStore, RenderFn, RenderScheduler, Subscription};

/// Where subscription snapshots end up
#[derive(Clone)]
struct SyncTarget {
    mirror: Mirror,
    preferences: PreferencesRepository,
    toasts: ToastQueue,
    scheduler: RenderScheduler,
}

impl SyncTarget {
    fn apply(&self, kind: CollectionKind, result: Result<Snapshot, StoreError>) {
        match result {
            Ok(snapshot) => {
                if self.mirror.apply_snapshot(kind, &snapshot) {
                    if kind == CollectionKind::Children {
                        self.reconcile_active_child();
                    }
                    self.scheduler.request_render();
                }
            }
            Err(e) => {
                warn!("Subscription to {} failed, keeping previous data: {}", kind, e);
                self.toasts
                    .push(format!("Could not sync {}, showing saved data.", kind), ToastSeverity::Danger);
            }
        }
    }

    fn reconcile_active_child(&self) {
        if let Some(active) = self.mirror.reconcile_active_child() {
            info!("👤 Active child is now {:?}", active);
            if let Err(e) = self.preferences.set_active_child(active) {
                error!("Failed to persist active child: {}", e);
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionContext {
    namespace: UserNamespace,
    store: ReactiveStore,
    target: SyncTarget,
    modal: ModalSlot,
    narrator: Narrator,
    audio: BackgroundAudio,
    clock: Arc<dyn Clock>,
    picker: Arc<dyn SpiritPicker>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
    render_loop: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionContext {
    pub fn new(
        namespace: UserNamespace,
        store: Arc<dyn DocumentStore>,
        preferences: PreferencesRepository,
        config: &AppConfig,
    ) -> Self {
        let active_child_id = preferences.get().active_child_id;
        let target = SyncTarget {
            mirror: Mirror::new(active_child_id),
            preferences,
            toasts: ToastQueue::new(config.toast_ttl()),
            scheduler: RenderScheduler::new(config.render_debounce()),
        };

        Self {
            namespace,
            store: ReactiveStore::new(store),
            target,
            modal: ModalSlot::new(),
            narrator: Narrator::new(Arc::new(LoggingSpeechEngine)),
            audio: BackgroundAudio::new(Arc::new(LoggingAudioSink)),
            clock: Arc::new(SystemClock),
            picker: Arc::new(RandomSpiritPicker::from_entropy()),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            render_loop: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_spirit_picker(mut self, picker: Arc<dyn SpiritPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_speech_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.narrator = Narrator::new(engine);
        self
    }

    pub fn with_audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio = BackgroundAudio::new(sink);
        self
    }

    /// Subscribe to every collection and start the render loop
    pub async fn start(&self) -> Result<()> {
        info!("🚀 Starting session for {}", self.namespace.root_path);

        for kind in CollectionKind::ALL {
            let target = self.target.clone();
            let subscription = self
                .store
                .subscribe(kind, move |result| target.apply(kind, result))
                .await;
            self.lock_subscriptions().push(subscription);
        }

        let handle = self.target.scheduler.start();
        if let Some(previous) = self
            .render_loop
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle)
        {
            previous.abort();
        }

        self.audio.set_enabled(self.preferences().get().background_audio_enabled);
        Ok(())
    }

    /// Drop all subscriptions and stop rendering
    pub fn shutdown(&self) {
        self.lock_subscriptions().clear();
        if let Some(handle) = self
            .render_loop
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
        self.narrator.stop();
        self.audio.set_enabled(false);
        info!("Session for {} stopped", self.namespace.root_path);
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-list every collection into the mirror
    pub async fn refresh(&self) {
        for kind in CollectionKind::ALL {
            let result = self.store.list(kind).await;
            self.target.apply(kind, result);
        }
    }

    /// Apply a document the store accepted, then schedule a render
    pub fn confirm_write(&self, kind: CollectionKind, receipt: &WriteReceipt) {
        self.target.mirror.apply_confirmed(
            kind,
            &receipt.document.id,
            Some(&receipt.document.fields),
            receipt.revision,
        );
        self.after_confirmed(kind);
    }

    /// Apply a delete the store accepted
    pub fn confirm_delete(&self, kind: CollectionKind, id: &str, revision: Option<u64>) {
        let revision = revision.unwrap_or_else(|| self.mirror().read().revision(kind).unwrap_or(0));
        self.target.mirror.apply_confirmed(kind, id, None, revision);
        self.after_confirmed(kind);
    }

    fn after_confirmed(&self, kind: CollectionKind) {
        if kind == CollectionKind::Children {
            self.target.reconcile_active_child();
        }
        self.target.scheduler.request_render();
    }

    /// Make `screen` the open page and render it right away
    pub fn open_page(&self, screen: Screen) -> PageView {
        let mirror = self.target.mirror.clone();
        let clock = self.clock.clone();
        let render: RenderFn = Arc::new(move || pages::render_page(screen, &mirror.read(), &clock.now()));

        self.target.scheduler.register(screen, render.clone());
        self.target.scheduler.render_now().unwrap_or_else(|| render())
    }

    pub fn set_active_child(&self, child_id: Option<String>) -> Result<()> {
        self.target.preferences.set_active_child(child_id.clone())?;
        self.target.mirror.set_active_child(child_id);
        self.target.scheduler.request_render();
        Ok(())
    }

    pub fn set_background_audio(&self, enabled: bool) -> Result<()> {
        self.target.preferences.update(|prefs| prefs.background_audio_enabled = enabled)?;
        self.audio.set_enabled(enabled);
        Ok(())
    }

    pub fn namespace(&self) -> &UserNamespace {
        &self.namespace
    }

    pub fn current_user_id(&self) -> &str {
        self.namespace.current_user_id()
    }

    pub fn store(&self) -> &ReactiveStore {
        &self.store
    }

    pub fn mirror(&self) -> &Mirror {
        &self.target.mirror
    }

    pub fn preferences(&self) -> &PreferencesRepository {
        &self.target.preferences
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.target.toasts
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.target.scheduler
    }

    pub fn modal(&self) -> &ModalSlot {
        &self.modal
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn audio(&self) -> &BackgroundAudio {
        &self.audio
    }

    pub fn spirit_picker(&self) -> Arc<dyn SpiritPicker> {
        self.picker.clone()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::session::clock::FixedClock;
    use crate::storage::{InMemoryDocumentStore, YamlConnection};
    use chrono::TimeZone;
    use tempfile::TempDir;

    pub struct TestSession {
        pub context: SessionContext,
        pub memory: InMemoryDocumentStore,
        pub clock: Arc<FixedClock>,
        pub connection: YamlConnection,
        pub _temp_dir: TempDir,
    }

    /// 2026-10-16 09:00 at UTC+8
    pub fn test_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, 9, 0, 0)
            .unwrap()
    }

    /// Started session over an empty in-memory store
    pub async fn test_session() -> TestSession {
        test_session_with(|memory| Arc::new(memory) as Arc<dyn DocumentStore>).await
    }

    /// Like [`test_session`], with the store wrapped before the session sees it
    pub async fn test_session_with<F>(wrap: F) -> TestSession
    where
        F: FnOnce(InMemoryDocumentStore) -> Arc<dyn DocumentStore>,
    {
        let temp_dir = TempDir::new().unwrap();
        let connection = YamlConnection::new(temp_dir.path()).unwrap();
        let memory = InMemoryDocumentStore::new();
        let clock = Arc::new(FixedClock::new(test_now()));
        let config = AppConfig { render_debounce_ms: 0, ..AppConfig::for_data_dir(temp_dir.path()) };

        let context = SessionContext::new(
            UserNamespace::new("test-user"),
            wrap(memory.clone()),
            PreferencesRepository::load(&connection),
            &config,
        )
        .with_clock(clock.clone())
        .with_spirit_picker(Arc::new(RandomSpiritPicker::seeded(11)));
        context.start().await.unwrap();

        TestSession { context, memory, clock, connection, _temp_dir: temp_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::storage::documents::to_fields;
    use crate::storage::WriteOptions;
    use shared::Child;

    fn child(id: &str, nickname: &str) -> Child {
        Child { id: id.to_string(), nickname: nickname.to_string(), age: None, gender: None }
    }

    #[tokio::test]
    async fn test_refresh_picks_first_child_and_persists_it() {
        let session = test_session().await;
        let store = session.context.store();
        for kid in [child("child::a", "Mia"), child("child::b", "Ben")] {
            store
                .write(CollectionKind::Children, Some(&kid.id), to_fields(&kid).unwrap(), WriteOptions::replace())
                .await
                .unwrap();
        }

        session.context.refresh().await;

        assert_eq!(session.context.mirror().read().kids.len(), 2);
        assert_eq!(session.context.mirror().read().active_child_id.as_deref(), Some("child::a"));
        assert_eq!(
            PreferencesRepository::load(&session.connection).get().active_child_id.as_deref(),
            Some("child::a")
        );
    }

    #[tokio::test]
    async fn test_unsaved_active_child_switch_keeps_previous_child() {
        let session = test_session().await;
        let store = session.context.store();
        for kid in [child("child::a", "Mia"), child("child::b", "Ben")] {
            store
                .write(CollectionKind::Children, Some(&kid.id), to_fields(&kid).unwrap(), WriteOptions::replace())
                .await
                .unwrap();
        }
        session.context.refresh().await;

        // A directory where the preferences file belongs makes every save fail
        let preferences_path = session.connection.preferences_file_path();
        std::fs::remove_file(&preferences_path).unwrap();
        std::fs::create_dir(&preferences_path).unwrap();

        assert!(session.context.set_active_child(Some("child::b".to_string())).is_err());
        assert_eq!(session.context.mirror().read().active_child_id.as_deref(), Some("child::a"));
        assert_eq!(session.context.preferences().get().active_child_id.as_deref(), Some("child::a"));
    }

    #[tokio::test]
    async fn test_feed_error_keeps_stale_mirror_and_raises_toast() {
        let session = test_session().await;
        let kid = child("child::a", "Mia");
        let receipt = session
            .context
            .store()
            .write(CollectionKind::Children, Some(&kid.id), to_fields(&kid).unwrap(), WriteOptions::replace())
            .await
            .unwrap();
        session.context.confirm_write(CollectionKind::Children, &receipt);

        session.memory.fail_reads(true);
        session.context.refresh().await;

        assert_eq!(session.context.mirror().read().kids.len(), 1);
        let toasts = session.context.toasts().active();
        assert!(toasts.iter().any(|t| t.severity == ToastSeverity::Danger));
    }

    #[tokio::test]
    async fn test_subscription_updates_mirror_after_remote_write() {
        let session = test_session().await;
        session
            .memory
            .write(
                CollectionKind::Children,
                "child::remote",
                to_fields(&child("child::remote", "Ava")).unwrap(),
                WriteOptions::replace(),
            )
            .await
            .unwrap();

        for _ in 0..100 {
            if !session.context.mirror().read().kids.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(session.context.mirror().read().active_child_id.as_deref(), Some("child::remote"));
    }

    #[tokio::test]
    async fn test_open_page_registers_render_callback() {
        let session = test_session().await;
        let page = session.context.open_page(Screen::Settings);

        assert_eq!(page.screen, Screen::Settings);
        assert_eq!(session.context.scheduler().current_screen(), Some(Screen::Settings));
        assert!(session.context.scheduler().version() >= 1);
    }
}
