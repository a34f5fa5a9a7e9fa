//! # Presentation Utilities
//!
//! Side-effecting UI helpers owned by a session: toasts, the modal slot,
//! speech narration and background audio. None of them touch domain state.

pub mod audio;
pub mod modal;
pub mod narration;
pub mod toast;

pub use audio::{AudioSink, BackgroundAudio, LoggingAudioSink};
pub use modal::{ModalOptions, ModalSlot};
pub use narration::{LoggingSpeechEngine, Narrator, SpeechEngine};
pub use toast::ToastQueue;
