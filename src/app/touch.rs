use core::sync::atomic::{AtomicU16, Ordering};

use super::config::MUX_CHANNEL_COUNT;

/// Latest oversampled reading per channel. One writer (the scan sweep), any
/// number of readers; each slot is a single atomic store so telemetry can
/// never observe a half-written value. Lines mixing samples from two sweeps
/// are acceptable, this is monitoring data.
pub(crate) struct RawSampleCache {
    slots: [AtomicU16; MUX_CHANNEL_COUNT],
}

impl RawSampleCache {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [const { AtomicU16::new(0) }; MUX_CHANNEL_COUNT],
        }
    }

    pub(crate) fn store(&self, channel: usize, raw: u16) {
        self.slots[channel].store(raw, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> [u16; MUX_CHANNEL_COUNT] {
        let mut samples = [0u16; MUX_CHANNEL_COUNT];
        for (slot, sample) in self.slots.iter().zip(samples.iter_mut()) {
            *sample = slot.load(Ordering::Relaxed);
        }
        samples
    }
}

/// Per-channel press/release edge detection over the raw threshold compare.
/// Owns the debounce memory exclusively; nothing else can flip a channel's
/// pressed state.
pub(crate) struct TouchClassifier {
    pressed: [bool; MUX_CHANNEL_COUNT],
}

impl TouchClassifier {
    pub(crate) const fn new() -> Self {
        Self {
            pressed: [false; MUX_CHANNEL_COUNT],
        }
    }

    /// Capacitive loading pulls the reading down, so touched means below.
    pub(crate) fn classify(raw: u16, threshold: u16) -> bool {
        raw < threshold
    }

    /// `Some(new_state)` exactly once per transition; a stable reading never
    /// re-triggers.
    pub(crate) fn detect_edge(
        &mut self,
        channel: usize,
        raw: u16,
        threshold: u16,
    ) -> Option<bool> {
        let touched = Self::classify(raw, threshold);
        if touched == self.pressed[channel] {
            return None;
        }
        self.pressed[channel] = touched;
        Some(touched)
    }
}
