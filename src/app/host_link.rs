mod line_reader;
mod parser;

use core::fmt::Write;

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use super::{
    config::TELEMETRY_PERIOD_MS,
    keymap::{Keymap, KeymapStore},
    store::{ConfigStore, FlashConfigStore},
    touch::RawSampleCache,
    types::{SerialUart, SharedKeymap},
};
use line_reader::LineReader;
use parser::{parse_host_command, HostCommand};

/// Byte sink for protocol output. The UART in production; tests substitute a
/// buffer so line framing can be checked without the hardware.
pub(crate) trait HostSink {
    async fn write_all(&mut self, bytes: &[u8]) -> bool;
    async fn flush(&mut self);
}

impl HostSink for SerialUart {
    async fn write_all(&mut self, mut bytes: &[u8]) -> bool {
        while !bytes.is_empty() {
            match self.write_async(bytes).await {
                Ok(0) => return false,
                Ok(written) => bytes = &bytes[written..],
                Err(_) => return false,
            }
        }
        true
    }

    async fn flush(&mut self) {
        let _ = self.flush_async().await;
    }
}

/// Host configuration/telemetry link. Owns the UART and the authoritative
/// keymap store; runs independently of the scan cadence.
#[embassy_executor::task]
pub(crate) async fn host_link_task(
    mut uart: SerialUart,
    mut keymap_store: KeymapStore<FlashConfigStore<'static>>,
    keymap: &'static SharedKeymap,
    samples: &'static RawSampleCache,
) {
    let mut reader = LineReader::new();
    let mut handshaken = false;
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_PERIOD_MS));
    let mut rx = [0u8; 1];
    esp_println::println!("host_link: running");

    loop {
        match select(uart.read_async(&mut rx), ticker.next()).await {
            Either::First(Ok(len)) => {
                for &byte in &rx[..len] {
                    if let Some(line) = reader.push_byte(byte) {
                        handle_line(
                            line,
                            &mut uart,
                            &mut keymap_store,
                            keymap,
                            &mut handshaken,
                        )
                        .await;
                    }
                }
            }
            Either::First(Err(_)) => {}
            Either::Second(()) => {
                if handshaken {
                    emit_raw_line(&mut uart, samples).await;
                }
            }
        }
    }
}

async fn handle_line<S: HostSink, C: ConfigStore>(
    line: &[u8],
    sink: &mut S,
    keymap_store: &mut KeymapStore<C>,
    keymap: &SharedKeymap,
    handshaken: &mut bool,
) {
    // Malformed or unknown lines are dropped without a reply.
    let Some(command) = parse_host_command(line) else {
        return;
    };
    match command {
        HostCommand::Connect => {
            *handshaken = true;
            emit_config_dump(sink, keymap_store.get_all()).await;
        }
        HostCommand::Disconnect => {
            *handshaken = false;
        }
        HostCommand::Set {
            channel,
            threshold,
            keycode,
        } => {
            if !keymap_store.set(channel as usize, threshold, keycode) {
                return;
            }
            if keymap_store.save().is_err() {
                esp_println::println!("host_link: keymap save failed");
            }
            // Republish so the scan sweep picks the change up next cycle.
            *keymap.lock().await = *keymap_store.get_all();
        }
    }
}

/// One `CFG:` line per channel, in channel order, on every CONNECT.
async fn emit_config_dump<S: HostSink>(sink: &mut S, keymap: &Keymap) {
    for (channel, record) in keymap.records.iter().enumerate() {
        let mut line = heapless::String::<32>::new();
        let _ = write!(
            &mut line,
            "CFG:{},{},{}\n",
            channel, record.threshold, record.keycode
        );
        let _ = sink.write_all(line.as_bytes()).await;
    }
    sink.flush().await;
}

async fn emit_raw_line<S: HostSink>(sink: &mut S, samples: &RawSampleCache) {
    let samples = samples.snapshot();
    let mut line = heapless::String::<128>::new();
    let _ = line.push_str("RAW:");
    for (channel, raw) in samples.iter().enumerate() {
        if channel > 0 {
            let _ = line.push(',');
        }
        let _ = write!(&mut line, "{}", raw);
    }
    let _ = line.push('\n');
    let _ = sink.write_all(line.as_bytes()).await;
    sink.flush().await;
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::super::{
        config::{DEFAULT_KEYCODES, DEFAULT_THRESHOLD, MUX_CHANNEL_COUNT},
        types::{LoadError, SaveError},
    };
    use super::*;

    struct BufferSink {
        bytes: heapless::Vec<u8, 1024>,
        flushes: usize,
    }

    impl BufferSink {
        fn new() -> Self {
            Self {
                bytes: heapless::Vec::new(),
                flushes: 0,
            }
        }

        fn lines(&self) -> impl Iterator<Item = &[u8]> {
            self.bytes.split(|&b| b == b'\n').filter(|l| !l.is_empty())
        }
    }

    impl HostSink for BufferSink {
        async fn write_all(&mut self, bytes: &[u8]) -> bool {
            self.bytes.extend_from_slice(bytes).is_ok()
        }

        async fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    struct NullStore;

    impl ConfigStore for NullStore {
        fn load(&mut self, _payload: &mut [u8]) -> Result<(), LoadError> {
            Err(LoadError::NotFound)
        }

        fn save(&mut self, _payload: &[u8]) -> Result<(), SaveError> {
            Ok(())
        }
    }

    #[test]
    fn connect_dumps_sixteen_config_lines_in_channel_order() {
        let mut sink = BufferSink::new();
        let mut store = KeymapStore::new(NullStore);
        let keymap = SharedKeymap::new(Keymap::with_defaults());
        let mut handshaken = false;

        block_on(handle_line(
            b"CONNECT",
            &mut sink,
            &mut store,
            &keymap,
            &mut handshaken,
        ));

        assert!(handshaken);
        let mut count = 0;
        for (channel, line) in sink.lines().enumerate() {
            let mut expected = heapless::String::<32>::new();
            let _ = write!(
                &mut expected,
                "CFG:{},{},{}",
                channel, DEFAULT_THRESHOLD, DEFAULT_KEYCODES[channel]
            );
            assert_eq!(line, expected.as_bytes());
            count += 1;
        }
        assert_eq!(count, MUX_CHANNEL_COUNT);
    }

    #[test]
    fn disconnect_clears_the_telemetry_gate() {
        let mut sink = BufferSink::new();
        let mut store = KeymapStore::new(NullStore);
        let keymap = SharedKeymap::new(Keymap::with_defaults());
        let mut handshaken = false;

        block_on(handle_line(
            b"CONNECT",
            &mut sink,
            &mut store,
            &keymap,
            &mut handshaken,
        ));
        assert!(handshaken);
        block_on(handle_line(
            b"DISCONNECT",
            &mut sink,
            &mut store,
            &keymap,
            &mut handshaken,
        ));
        assert!(!handshaken);
        // Unknown lines leave the gate alone.
        block_on(handle_line(
            b"PING",
            &mut sink,
            &mut store,
            &keymap,
            &mut handshaken,
        ));
        assert!(!handshaken);
    }

    #[test]
    fn set_republishes_the_shared_table_without_output() {
        let mut sink = BufferSink::new();
        let mut store = KeymapStore::new(NullStore);
        let keymap = SharedKeymap::new(Keymap::with_defaults());
        let mut handshaken = true;

        block_on(handle_line(
            b"SET:5,1000,4",
            &mut sink,
            &mut store,
            &keymap,
            &mut handshaken,
        ));

        let published = block_on(async { *keymap.lock().await });
        assert_eq!(published.records[5].threshold, 1000);
        assert_eq!(published.records[5].keycode, 4);
        assert!(sink.bytes.is_empty());
    }

    #[test]
    fn raw_line_lists_all_sixteen_channels() {
        let samples = RawSampleCache::new();
        for channel in 0..MUX_CHANNEL_COUNT {
            samples.store(channel, (channel as u16) * 100);
        }
        let mut sink = BufferSink::new();

        block_on(emit_raw_line(&mut sink, &samples));

        assert_eq!(
            sink.bytes.as_slice(),
            b"RAW:0,100,200,300,400,500,600,700,800,900,1000,1100,1200,1300,1400,1500\n"
        );
        assert_eq!(sink.flushes, 1);
    }
}
