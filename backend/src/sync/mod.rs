//! # Reactive Sync
//!
//! Keeps the session's mirror in step with the document store and decides
//! when pages re-render.

pub mod mirror;
pub mod reactive_store;
pub mod scheduler;

pub use mirror::{Mirror, MirrorState};
pub use reactive_store::{ReactiveStore, Subscription};
pub use scheduler::{RenderFn, RenderScheduler};
