//! Looping background music, switched by a local preference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub const BACKGROUND_TRACK: &str = "assets/audio/background.mp3";

pub trait AudioSink: Send + Sync {
    fn play_loop(&self, track: &str);
    fn pause(&self);
}

pub struct LoggingAudioSink;

impl AudioSink for LoggingAudioSink {
    fn play_loop(&self, track: &str) {
        info!("🎵 Background audio playing: {}", track);
    }

    fn pause(&self) {
        info!("🎵 Background audio paused");
    }
}

#[derive(Clone)]
pub struct BackgroundAudio {
    sink: Arc<dyn AudioSink>,
    playing: Arc<AtomicBool>,
}

impl BackgroundAudio {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self { sink, playing: Arc::new(AtomicBool::new(false)) }
    }

    /// Start or pause the loop; repeated calls with the same value do nothing
    pub fn set_enabled(&self, enabled: bool) {
        let was_playing = self.playing.swap(enabled, Ordering::SeqCst);
        match (was_playing, enabled) {
            (false, true) => self.sink.play_loop(BACKGROUND_TRACK),
            (true, false) => self.sink.pause(),
            _ => {}
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingSink {
        events: Mutex<Vec<&'static str>>,
    }

    impl AudioSink for CountingSink {
        fn play_loop(&self, _track: &str) {
            self.events.lock().unwrap().push("play");
        }

        fn pause(&self) {
            self.events.lock().unwrap().push("pause");
        }
    }

    #[test]
    fn test_toggle_only_acts_on_change() {
        let sink = Arc::new(CountingSink::default());
        let audio = BackgroundAudio::new(sink.clone());

        audio.set_enabled(true);
        audio.set_enabled(true);
        assert!(audio.is_playing());
        audio.set_enabled(false);
        audio.set_enabled(false);

        assert_eq!(*sink.events.lock().unwrap(), vec!["play", "pause"]);
    }
}
