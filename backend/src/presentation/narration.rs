//! Text-to-speech narration. At most one utterance is active at a time:
//! starting a new one cancels the one in flight.

use std::sync::{Arc, Mutex};
use tracing::info;

/// Platform speech capability
pub trait SpeechEngine: Send + Sync {
    fn speak(&self, utterance_id: u64, text: &str);
    fn cancel(&self, utterance_id: u64);
}

/// Engine used when no speech capability is available; only logs
pub struct LoggingSpeechEngine;

impl SpeechEngine for LoggingSpeechEngine {
    fn speak(&self, utterance_id: u64, text: &str) {
        info!("🔊 Narrating #{}: {}", utterance_id, text);
    }

    fn cancel(&self, utterance_id: u64) {
        info!("🔇 Narration #{} cancelled", utterance_id);
    }
}

#[derive(Default)]
struct NarratorState {
    next_id: u64,
    active: Option<u64>,
}

#[derive(Clone)]
pub struct Narrator {
    engine: Arc<dyn SpeechEngine>,
    state: Arc<Mutex<NarratorState>>,
}

impl Narrator {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine, state: Arc::new(Mutex::new(NarratorState::default())) }
    }

    /// Speak `text`, cancelling any utterance in flight. Returns the new utterance id.
    pub fn speak(&self, text: &str) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(active) = state.active.take() {
            self.engine.cancel(active);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.active = Some(id);
        self.engine.speak(id, text);
        id
    }

    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(active) = state.active.take() {
            self.engine.cancel(active);
        }
    }

    /// Called when the engine finished an utterance on its own
    pub fn finished(&self, utterance_id: u64) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.active == Some(utterance_id) {
            state.active = None;
        }
    }

    pub fn active_utterance(&self) -> Option<u64> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).active
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records engine calls as `speak:<id>` / `cancel:<id>`
    #[derive(Default)]
    pub struct RecordingSpeechEngine {
        pub calls: Mutex<Vec<String>>,
    }

    impl SpeechEngine for RecordingSpeechEngine {
        fn speak(&self, utterance_id: u64, _text: &str) {
            self.calls.lock().unwrap().push(format!("speak:{}", utterance_id));
        }

        fn cancel(&self, utterance_id: u64) {
            self.calls.lock().unwrap().push(format!("cancel:{}", utterance_id));
        }
    }

    #[test]
    fn test_new_utterance_cancels_previous() {
        let engine = Arc::new(RecordingSpeechEngine::default());
        let narrator = Narrator::new(engine.clone());

        let first = narrator.speak("Once upon a time");
        let second = narrator.speak("The end");

        assert_eq!(narrator.active_utterance(), Some(second));
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec![format!("speak:{}", first), format!("cancel:{}", first), format!("speak:{}", second)]
        );
    }

    #[test]
    fn test_stop_and_finish() {
        let engine = Arc::new(RecordingSpeechEngine::default());
        let narrator = Narrator::new(engine.clone());

        let id = narrator.speak("hello");
        narrator.finished(id);
        assert_eq!(narrator.active_utterance(), None);

        // Nothing in flight, nothing to cancel
        narrator.stop();
        assert_eq!(engine.calls.lock().unwrap().len(), 1);
    }
}
