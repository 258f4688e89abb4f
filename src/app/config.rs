use embassy_sync::{channel::Channel, mutex::Mutex};

use super::{
    hid::HidConnection,
    keymap::Keymap,
    touch::RawSampleCache,
    types::{ReportQueue, SharedKeymap, TransportEventQueue},
};

pub(crate) const MUX_CHANNEL_COUNT: usize = 16;
pub(crate) const UART_BAUD: u32 = 115_200;
pub(crate) const HOST_CMD_BUF_LEN: usize = 128;

/// Scan sweep pacing: fast while the user is touching, coarse when idle.
pub(crate) const SCAN_ACTIVE_PERIOD_MS: u64 = 10;
pub(crate) const SCAN_IDLE_PERIOD_MS: u64 = 50;

/// Telemetry stream pacing (20 Hz), independent of the scan cadence.
pub(crate) const TELEMETRY_PERIOD_MS: u64 = 50;

pub(crate) const OVERSAMPLE_COUNT: u32 = 4;
pub(crate) const SAMPLE_SETTLE_US: u32 = 20;

pub(crate) const DEFAULT_THRESHOLD: u16 = 3900;
pub(crate) const DEFAULT_KEYCODES: [u8; MUX_CHANNEL_COUNT] = [
    0x1A, 0x16, 0x04, 0x07, 0x2C, 0x08, 0x0B, 0x0A, 0x14, 0x2B, 0x4F, 0x50, 0x52, 0x51, 0x1F,
    0x29,
];

pub(crate) const KEYMAP_STORE_MAGIC: u32 = 0x5041_4D4B; // "KMAP"

// Allocation sites for task-shared state. Tasks never reach for these
// directly; `run()` hands each task a reference to exactly what it needs.

/// Read view of the keymap for the scan sweep; the host-link task republishes
/// the whole table here after every accepted SET.
pub(crate) static KEYMAP: SharedKeymap = Mutex::new(Keymap::with_defaults());

/// Latest oversampled reading per channel, overwritten every sweep.
pub(crate) static RAW_SAMPLES: RawSampleCache = RawSampleCache::new();

/// Transport connection handle, written by the transport's own
/// connect/disconnect callbacks and read by the dispatcher.
pub(crate) static HID_CONNECTION: HidConnection = HidConnection::new();

/// Outbound key reports awaiting the transport's notify primitive.
pub(crate) static HID_REPORTS: ReportQueue = Channel::new();

/// Where the transport stack's connect/disconnect callbacks hand their
/// events over to the link task.
pub(crate) static TRANSPORT_EVENTS: TransportEventQueue = Channel::new();
