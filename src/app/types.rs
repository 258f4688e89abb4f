use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, mutex::Mutex,
};
use esp_hal::{uart::Uart, Async};
use muxpad::{drivers::mux::MuxFrontEnd, platform::BusyDelay};

use super::{
    hid::{HidReport, TransportEvent},
    keymap::Keymap,
    sampler::ChannelSampler,
};

pub(crate) type SerialUart = Uart<'static, Async>;
pub(crate) type ScanSampler = ChannelSampler<MuxFrontEnd<'static, BusyDelay>, BusyDelay>;

/// Channel-to-key table shared between the scan sweep and the host link.
pub(crate) type SharedKeymap = Mutex<CriticalSectionRawMutex, Keymap>;

/// Outbound key reports queued for the transport's notify primitive.
pub(crate) type ReportQueue = Channel<CriticalSectionRawMutex, HidReport, 4>;

/// Connection lifecycle events from the transport stack's callbacks.
pub(crate) type TransportEventQueue = Channel<CriticalSectionRawMutex, TransportEvent, 4>;

/// Why a persisted keymap could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoadError {
    /// No blob in storage (erased sector or foreign magic).
    NotFound,
    /// Blob present but unusable: wrong payload size, bad checksum, or the
    /// storage read itself failed.
    Corrupt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveError {
    Io,
}
