use muxpad::{drivers::mux::AnalogFrontEnd, platform::DelayOps};

use super::config::{OVERSAMPLE_COUNT, SAMPLE_SETTLE_US};

/// Drives the analog front end for one channel at a time and averages a
/// short burst of conversions to knock down sampling noise.
pub(crate) struct ChannelSampler<F: AnalogFrontEnd, D: DelayOps> {
    frontend: F,
    delay: D,
}

impl<F: AnalogFrontEnd, D: DelayOps> ChannelSampler<F, D> {
    pub(crate) fn new(frontend: F, delay: D) -> Self {
        Self { frontend, delay }
    }

    /// Truncating integer mean of `OVERSAMPLE_COUNT` consecutive readings.
    pub(crate) fn sample(&mut self, channel: u8) -> u16 {
        self.frontend.select(channel);
        self.delay.delay_us(SAMPLE_SETTLE_US);
        let mut sum = 0u32;
        for _ in 0..OVERSAMPLE_COUNT {
            sum += u32::from(self.frontend.read_raw());
        }
        (sum / OVERSAMPLE_COUNT) as u16
    }
}
