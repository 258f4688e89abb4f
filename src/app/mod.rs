pub(crate) mod config;
mod hid;
mod host_link;
mod keymap;
mod sampler;
mod scan;
mod store;
mod touch;
mod types;

use esp_hal::{
    gpio::{Level, Output, OutputConfig},
    timer::timg::TimerGroup,
    uart::{Config as UartConfig, Uart},
};
use muxpad::{
    drivers::mux::{adc_frontend, MuxFrontEnd},
    platform::BusyDelay,
};

use self::{
    config::{HID_CONNECTION, HID_REPORTS, KEYMAP, RAW_SAMPLES, TRANSPORT_EVENTS, UART_BAUD},
    hid::ReportLink,
    keymap::KeymapStore,
    sampler::ChannelSampler,
    store::FlashConfigStore,
    types::LoadError,
};

pub(crate) fn run() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let uart_cfg = UartConfig::default().with_baudrate(UART_BAUD);
    let uart = Uart::new(peripherals.UART0, uart_cfg)
        .expect("failed to init UART0")
        .with_rx(peripherals.GPIO3)
        .with_tx(peripherals.GPIO1)
        .into_async();

    let (adc, input) = adc_frontend(peripherals.ADC1, peripherals.GPIO34);
    let frontend = MuxFrontEnd::new(
        Output::new(peripherals.GPIO18, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO19, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO21, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO22, Level::Low, OutputConfig::default()),
        adc,
        input,
        BusyDelay::new(),
    );
    let sampler = ChannelSampler::new(frontend, BusyDelay::new());

    let mut keymap_store = KeymapStore::new(FlashConfigStore::new(peripherals.FLASH));
    match keymap_store.load() {
        Ok(()) => esp_println::println!("keymap: loaded from flash"),
        Err(LoadError::NotFound) => esp_println::println!("keymap: provisioned defaults"),
        Err(LoadError::Corrupt) => {
            esp_println::println!("keymap: stored blob corrupt; using defaults")
        }
    }
    // Publish the table the scan sweep reads before any task starts.
    if let Ok(mut published) = KEYMAP.try_lock() {
        *published = *keymap_store.get_all();
    }

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        spawner.must_spawn(scan::scan_task(
            sampler,
            &KEYMAP,
            &RAW_SAMPLES,
            ReportLink::new(&HID_CONNECTION, &HID_REPORTS),
        ));
        spawner.must_spawn(host_link::host_link_task(
            uart,
            keymap_store,
            &KEYMAP,
            &RAW_SAMPLES,
        ));
        spawner.must_spawn(hid::hid_link_task(
            &HID_REPORTS,
            &TRANSPORT_EVENTS,
            &HID_CONNECTION,
        ));
    });
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}
