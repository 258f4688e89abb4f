use core::sync::atomic::{AtomicU16, Ordering};

use embassy_futures::select::{select, Either};

use super::types::{ReportQueue, TransportEventQueue};

const NO_CONNECTION: u16 = 0xFFFF;

/// Transport connection handle. The transport stack's connect/disconnect
/// callbacks are the only writers; the dispatcher reads it atomically so a
/// report is never aimed at a half-updated target.
pub(crate) struct HidConnection {
    handle: AtomicU16,
}

impl HidConnection {
    pub(crate) const fn new() -> Self {
        Self {
            handle: AtomicU16::new(NO_CONNECTION),
        }
    }

    pub(crate) fn connect(&self, handle: u16) {
        self.handle.store(handle, Ordering::Release);
    }

    pub(crate) fn disconnect(&self) {
        self.handle.store(NO_CONNECTION, Ordering::Release);
    }

    pub(crate) fn current(&self) -> Option<u16> {
        match self.handle.load(Ordering::Acquire) {
            NO_CONNECTION => None,
            handle => Some(handle),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.current().is_some()
    }
}

/// Standard 8-byte boot keyboard input report:
/// modifiers, reserved, then six key slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HidReport(pub(crate) [u8; 8]);

impl HidReport {
    /// This device never emits modifiers and fills only the first key slot;
    /// a second concurrent press overwrites it rather than using slots 2-6.
    pub(crate) fn key_event(keycode: u8, pressed: bool) -> Self {
        let mut bytes = [0u8; 8];
        if pressed {
            bytes[2] = keycode;
        }
        Self(bytes)
    }
}

/// What the dispatcher needs from the wireless transport.
pub(crate) trait HidTransport {
    fn is_connected(&self) -> bool;
    fn notify(&mut self, report: HidReport);
}

/// Turns debounced edges into outbound reports. Reports produced while
/// disconnected are dropped without error: the debounce memory is
/// channel-local, so state converges on its own after a reconnect.
pub(crate) struct HidDispatcher<T: HidTransport> {
    transport: T,
}

impl<T: HidTransport> HidDispatcher<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self { transport }
    }

    pub(crate) fn dispatch(&mut self, keycode: u8, pressed: bool) {
        if !self.transport.is_connected() {
            return;
        }
        self.transport.notify(HidReport::key_event(keycode, pressed));
    }
}

/// Firmware-side transport seam: reports go into a bounded queue drained by
/// the link task at the radio stack boundary.
pub(crate) struct ReportLink {
    connection: &'static HidConnection,
    reports: &'static ReportQueue,
}

impl ReportLink {
    pub(crate) fn new(connection: &'static HidConnection, reports: &'static ReportQueue) -> Self {
        Self {
            connection,
            reports,
        }
    }
}

impl HidTransport for ReportLink {
    fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn notify(&mut self, report: HidReport) {
        // Send primitive of the transport; a full queue behaves like a slow
        // radio and the report is dropped, matching the no-retry contract.
        let _ = self.reports.try_send(report);
    }
}

/// Connection lifecycle events surfaced by the wireless transport stack; its
/// connect/disconnect callbacks enqueue these from the radio boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TransportEvent {
    Connected(u16),
    Disconnected,
}

fn apply_transport_event(connection: &HidConnection, event: TransportEvent) {
    match event {
        TransportEvent::Connected(handle) => connection.connect(handle),
        TransportEvent::Disconnected => connection.disconnect(),
    }
}

/// Boundary task for the wireless stack: the single consumer of transport
/// lifecycle events, and drains queued reports toward the current connection.
#[embassy_executor::task]
pub(crate) async fn hid_link_task(
    reports: &'static ReportQueue,
    events: &'static TransportEventQueue,
    connection: &'static HidConnection,
) {
    esp_println::println!("hid: link task running");
    loop {
        match select(reports.receive(), events.receive()).await {
            Either::First(report) => {
                let Some(target) = connection.current() else {
                    continue;
                };
                // Hand-off point for the GATT notify primitive.
                esp_println::println!("hid: notify handle={} report={:02x?}", target, report.0);
            }
            Either::Second(event) => {
                apply_transport_event(connection, event);
                esp_println::println!("hid: transport event {:?}", event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingTransport {
        connected: bool,
        sent: heapless::Vec<HidReport, 4>,
    }

    impl HidTransport for RecordingTransport {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn notify(&mut self, report: HidReport) {
            self.sent.push(report).unwrap();
        }
    }

    #[test]
    fn press_report_fills_only_first_key_slot() {
        let report = HidReport::key_event(0x1A, true);
        assert_eq!(report.0, [0, 0, 0x1A, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn release_report_is_all_zero() {
        let report = HidReport::key_event(0x1A, false);
        assert_eq!(report.0, [0u8; 8]);
    }

    #[test]
    fn dispatch_while_disconnected_never_touches_transport() {
        let transport = RecordingTransport {
            connected: false,
            sent: heapless::Vec::new(),
        };
        let mut dispatcher = HidDispatcher::new(transport);
        dispatcher.dispatch(0x1A, true);
        assert!(dispatcher.transport.sent.is_empty());
    }

    #[test]
    fn dispatch_while_connected_notifies_once() {
        let transport = RecordingTransport {
            connected: true,
            sent: heapless::Vec::new(),
        };
        let mut dispatcher = HidDispatcher::new(transport);
        dispatcher.dispatch(0x04, true);
        dispatcher.dispatch(0x04, false);
        assert_eq!(
            dispatcher.transport.sent.as_slice(),
            &[
                HidReport([0, 0, 0x04, 0, 0, 0, 0, 0]),
                HidReport([0u8; 8]),
            ]
        );
    }

    #[test]
    fn connection_handle_round_trips() {
        let connection = HidConnection::new();
        assert!(!connection.is_connected());
        connection.connect(7);
        assert_eq!(connection.current(), Some(7));
        connection.disconnect();
        assert_eq!(connection.current(), None);
    }

    #[test]
    fn transport_events_drive_connection_handle() {
        let connection = HidConnection::new();
        apply_transport_event(&connection, TransportEvent::Connected(3));
        assert_eq!(connection.current(), Some(3));
        apply_transport_event(&connection, TransportEvent::Disconnected);
        assert!(!connection.is_connected());
    }
}
