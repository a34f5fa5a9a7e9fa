//! # Session Layer
//!
//! Identity bootstrap, client-local preferences and the per-session context
//! handed to every page controller.

pub mod clock;
pub mod context;
pub mod identity;
pub mod preferences;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::SessionContext;
pub use identity::{
    bootstrap_identity, FileIdentityProvider, IdentityError, IdentityProvider, UserNamespace,
};
pub use preferences::PreferencesRepository;
