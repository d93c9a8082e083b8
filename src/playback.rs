use crate::settings::TICK_MS;
use crate::timeline::{quantize, Segment};

/// Playhead clock. Positions are always on the 50ms grid and clamped to
/// the track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playback {
    position: u32,
    duration: u32,
}

impl Playback {
    pub fn new(duration: u32) -> Playback {
        Playback {
            position: 0,
            duration,
        }
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn seek(&mut self, t: u32) {
        self.position = quantize(t.min(self.duration));
    }

    pub fn step_forward(&mut self) {
        self.seek(self.position.saturating_add(TICK_MS));
    }

    pub fn step_back(&mut self) {
        self.position = self.position.saturating_sub(TICK_MS);
    }

    /// Jump to the nearest block start strictly after the playhead.
    pub fn snap_next(&mut self, seq: &[Segment]) {
        if let Some(seg) = seq.iter().find(|s| s.start_time > self.position) {
            self.seek(seg.start_time);
        }
    }

    /// Jump to the nearest block start strictly before the playhead.
    pub fn snap_prev(&mut self, seq: &[Segment]) {
        if let Some(seg) = seq.iter().rev().find(|s| s.start_time < self.position) {
            self.seek(seg.start_time);
        }
    }
}
