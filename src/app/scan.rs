use embassy_time::{Duration, Timer};

use super::{
    config::{MUX_CHANNEL_COUNT, SCAN_ACTIVE_PERIOD_MS, SCAN_IDLE_PERIOD_MS},
    hid::{HidDispatcher, ReportLink},
    touch::{RawSampleCache, TouchClassifier},
    types::{ScanSampler, SharedKeymap},
};

pub(crate) fn next_scan_period_ms(activity: bool) -> u64 {
    if activity {
        SCAN_ACTIVE_PERIOD_MS
    } else {
        SCAN_IDLE_PERIOD_MS
    }
}

/// Sweeps all mux channels forever. Sole writer of the debounce state and
/// the raw sample cache.
#[embassy_executor::task]
pub(crate) async fn scan_task(
    mut sampler: ScanSampler,
    keymap: &'static SharedKeymap,
    samples: &'static RawSampleCache,
    link: ReportLink,
) {
    let mut classifier = TouchClassifier::new();
    let mut dispatcher = HidDispatcher::new(link);
    esp_println::println!("scan: running");

    loop {
        // One snapshot per sweep keeps each channel's (threshold, keycode)
        // pair consistent even if a SET lands mid-sweep.
        let keymap = *keymap.lock().await;
        let mut activity = false;

        for channel in 0..MUX_CHANNEL_COUNT {
            let raw = sampler.sample(channel as u8);
            samples.store(channel, raw);
            let record = keymap.records[channel];
            if let Some(pressed) = classifier.detect_edge(channel, raw, record.threshold) {
                dispatcher.dispatch(record.keycode, pressed);
                activity = true;
            }
        }

        Timer::after(Duration::from_millis(next_scan_period_ms(activity))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_sweep_schedules_short_interval() {
        assert_eq!(next_scan_period_ms(true), 10);
    }

    #[test]
    fn idle_sweep_schedules_long_interval() {
        assert_eq!(next_scan_period_ms(false), 50);
    }
}
