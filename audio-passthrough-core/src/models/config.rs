use std::time::Duration;

/// Largest buffer a single reconfiguration will allocate, in frames (about 21 s at 48 kHz).
const MAX_BUFFER_FRAMES: usize = 1 << 20;

/// Configuration for the passthrough path.
///
/// The audio format itself is fixed (see `AudioFormat`) and the
/// self-classification threshold is a compile-time constant; only operational
/// knobs live here.
#[derive(Debug, Clone, PartialEq)]
pub struct PassthroughConfiguration {
    /// Wall-clock interval between loop guard re-checks (default: 1 s).
    pub guard_interval: Duration,

    /// Frames the output buffer holds on first bind (default: 4096).
    /// Later reconfigurations grow to the largest frame count requested so far.
    pub initial_buffer_frames: usize,

    /// Whether frames are forwarded at all (default: true).
    pub enabled: bool,
}

impl PassthroughConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.guard_interval.is_zero() {
            return Err("guard interval must be positive".into());
        }
        if self.initial_buffer_frames == 0 {
            return Err("initial buffer must hold at least one frame".into());
        }
        if self.initial_buffer_frames > MAX_BUFFER_FRAMES {
            return Err(format!(
                "initial buffer of {} frames exceeds the {} frame limit",
                self.initial_buffer_frames, MAX_BUFFER_FRAMES
            ));
        }
        Ok(())
    }

    pub(crate) fn max_buffer_frames() -> usize {
        MAX_BUFFER_FRAMES
    }
}

impl Default for PassthroughConfiguration {
    fn default() -> Self {
        Self {
            guard_interval: Duration::from_secs(1),
            initial_buffer_frames: 4096,
            enabled: true,
        }
    }
}
