//! # Render Scheduler
//!
//! One render callback per session, registered by the page that is open.
//! Registering again replaces the previous callback. Render requests that
//! arrive within the debounce window are coalesced into a single pass, and
//! each pass publishes the rendered page on a watch channel together with a
//! version number the UI can long-poll on.

use shared::{PageView, RenderedPageResponse, Screen};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

pub type RenderFn = Arc<dyn Fn() -> PageView + Send + Sync>;

struct Registration {
    screen: Screen,
    render: RenderFn,
}

struct SchedulerState {
    registration: Mutex<Option<Registration>>,
    wake: Notify,
    published: watch::Sender<RenderedPageResponse>,
    debounce: Duration,
}

#[derive(Clone)]
pub struct RenderScheduler {
    state: Arc<SchedulerState>,
}

impl RenderScheduler {
    pub fn new(debounce: Duration) -> Self {
        let (published, _) = watch::channel(RenderedPageResponse { version: 0, page: None });
        Self {
            state: Arc::new(SchedulerState {
                registration: Mutex::new(None),
                wake: Notify::new(),
                published,
                debounce,
            }),
        }
    }

    /// Install the render callback of `screen`, replacing any previous one
    pub fn register(&self, screen: Screen, render: RenderFn) {
        let mut registration = self
            .state
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = registration.as_ref() {
            debug!("Render callback {:?} replaced by {:?}", previous.screen, screen);
        }
        *registration = Some(Registration { screen, render });
    }

    pub fn current_screen(&self) -> Option<Screen> {
        self.state
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|registration| registration.screen)
    }

    /// Ask for a render pass; bursts of requests collapse into one pass
    pub fn request_render(&self) {
        self.state.wake.notify_one();
    }

    /// Render immediately and publish the result
    pub fn render_now(&self) -> Option<PageView> {
        let render = self
            .state
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|registration| registration.render.clone())?;

        let page = render();
        self.state.published.send_modify(|published| {
            published.version += 1;
            published.page = Some(page.clone());
        });
        debug!("Rendered {:?} (v{})", page.screen, self.version());
        Some(page)
    }

    pub fn version(&self) -> u64 {
        self.state.published.borrow().version
    }

    pub fn latest(&self) -> RenderedPageResponse {
        self.state.published.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<RenderedPageResponse> {
        self.state.published.subscribe()
    }

    /// Wait until a render newer than `after` is published, or `timeout` passes
    pub async fn wait_for_newer(&self, after: u64, timeout: Duration) -> RenderedPageResponse {
        let mut receiver = self.watch();
        let _ = tokio::time::timeout(timeout, receiver.wait_for(|published| published.version > after)).await;
        self.latest()
    }

    /// Start the background loop serving [`RenderScheduler::request_render`]
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            loop {
                scheduler.state.wake.notified().await;
                if !scheduler.state.debounce.is_zero() {
                    tokio::time::sleep(scheduler.state.debounce).await;
                }
                scheduler.render_now();
            }
        })
    }
}
