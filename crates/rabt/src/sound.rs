//! Sound cue sinks and the muting mixer.

use std::fmt::Debug;
use std::io::Write;

use rabt_core::Cue;
use tracing::{debug, instrument};

/// Something that can play a [`Cue`].
pub trait SoundSink: Send + Sync + Debug {
    /// Plays `cue`. Must not block.
    fn play(&self, cue: Cue);
}

/// Logs cues instead of playing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SoundSink for TracingSink {
    fn play(&self, cue: Cue) {
        debug!(cue = %cue, "Sound cue");
    }
}

/// Rings the terminal bell for a wrong group and for a win.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellSink;

impl SoundSink for BellSink {
    fn play(&self, cue: Cue) {
        let rings = match cue {
            Cue::Select | Cue::Correct => 0,
            Cue::Wrong => 1,
            Cue::Win => 2,
        };
        if rings > 0 {
            ring(&mut std::io::stdout(), rings);
        }
    }
}

/// Writes `rings` bell characters to `out`. Failures are logged and dropped.
fn ring(out: &mut impl Write, rings: usize) {
    if let Err(e) = out.write_all("\x07".repeat(rings).as_bytes()) {
        debug!(error = %e, "Could not ring terminal bell");
        return;
    }
    if let Err(e) = out.flush() {
        debug!(error = %e, "Could not flush terminal bell");
    }
}

/// Routes cues to a sink unless muted.
#[derive(Debug)]
pub struct Mixer {
    sink: Box<dyn SoundSink>,
    muted: bool,
}

impl Mixer {
    /// Creates an unmuted mixer.
    #[instrument(skip(sink))]
    pub fn new(sink: Box<dyn SoundSink>) -> Self {
        Self { sink, muted: false }
    }

    /// Whether cues are currently dropped.
    #[instrument(skip(self))]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Sets the mute flag.
    #[instrument(skip(self))]
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Flips the mute flag and returns the new value.
    #[instrument(skip(self))]
    pub fn toggle(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Plays `cue` on the sink unless muted.
    #[instrument(skip(self))]
    pub fn play(&self, cue: Cue) {
        if self.muted {
            debug!(cue = %cue, "Muted, dropping cue");
            return;
        }
        self.sink.play(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Cue>>>);

    impl SoundSink for Recorder {
        fn play(&self, cue: Cue) {
            self.0.lock().expect("lock").push(cue);
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("closed"))
        }
    }

    #[test]
    fn test_ring_writes_bells() {
        let mut out = Vec::new();
        ring(&mut out, 2);
        assert_eq!(out, b"\x07\x07");
    }

    #[test]
    fn test_ring_survives_closed_output() {
        ring(&mut Broken, 1);
    }

    #[test]
    fn test_mute_drops_cues() {
        let recorder = Recorder::default();
        let mut mixer = Mixer::new(Box::new(recorder.clone()));
        mixer.play(Cue::Select);
        assert!(mixer.toggle());
        mixer.play(Cue::Wrong);
        assert!(!mixer.toggle());
        mixer.play(Cue::Win);
        assert_eq!(*recorder.0.lock().expect("lock"), vec![Cue::Select, Cue::Win]);
    }
}
