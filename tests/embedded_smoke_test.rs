//! Minimal async embedded-test harness for xtensa/ESP32.
//! Validates test runtime wiring without touching the mux or flash hardware.

#![no_std]
#![no_main]

#[cfg(test)]
#[embedded_test::tests(executor = esp_rtos::embassy::Executor::new())]
mod tests {
    use muxpad::platform::{BusyDelay, DelayOps};

    #[init]
    fn init() {
        let peripherals = esp_hal::init(esp_hal::Config::default());
        let timg0 = esp_hal::timer::timg::TimerGroup::new(peripherals.TIMG0);
        esp_rtos::start(timg0.timer0);
    }

    #[test]
    async fn harness_smoke_async() {
        embassy_time::Timer::after(embassy_time::Duration::from_millis(10)).await;
        assert_eq!(2 + 2, 4);
    }

    #[test]
    async fn busy_delay_advances_time() {
        let before = embassy_time::Instant::now();
        BusyDelay::new().delay_ms(5);
        assert!(before.elapsed() >= embassy_time::Duration::from_millis(4));
    }
}
