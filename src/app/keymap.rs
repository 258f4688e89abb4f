use super::{
    config::{DEFAULT_KEYCODES, DEFAULT_THRESHOLD, MUX_CHANNEL_COUNT},
    store::ConfigStore,
    types::{LoadError, SaveError},
};

/// keycode (1) + threshold (2) per channel, little-endian, no header.
pub(crate) const KEYMAP_BLOB_LEN: usize = MUX_CHANNEL_COUNT * 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChannelRecord {
    /// HID scan code emitted while the channel is pressed.
    pub(crate) keycode: u8,
    /// Oversampled reading below this level counts as touched.
    pub(crate) threshold: u16,
}

/// The channel-to-key table. Index is the mux channel and never moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Keymap {
    pub(crate) records: [ChannelRecord; MUX_CHANNEL_COUNT],
}

impl Keymap {
    pub(crate) const fn with_defaults() -> Self {
        let mut records = [ChannelRecord {
            keycode: 0,
            threshold: DEFAULT_THRESHOLD,
        }; MUX_CHANNEL_COUNT];
        let mut channel = 0;
        while channel < MUX_CHANNEL_COUNT {
            records[channel].keycode = DEFAULT_KEYCODES[channel];
            channel += 1;
        }
        Self { records }
    }

    pub(crate) fn to_blob(&self) -> [u8; KEYMAP_BLOB_LEN] {
        let mut blob = [0u8; KEYMAP_BLOB_LEN];
        for (channel, record) in self.records.iter().enumerate() {
            let base = channel * 3;
            blob[base] = record.keycode;
            blob[base + 1..base + 3].copy_from_slice(&record.threshold.to_le_bytes());
        }
        blob
    }

    pub(crate) fn from_blob(blob: &[u8; KEYMAP_BLOB_LEN]) -> Self {
        let mut keymap = Self::with_defaults();
        for (channel, record) in keymap.records.iter_mut().enumerate() {
            let base = channel * 3;
            record.keycode = blob[base];
            record.threshold = u16::from_le_bytes([blob[base + 1], blob[base + 2]]);
        }
        keymap
    }
}

/// Owns the authoritative keymap and its persistence. Lives in the host-link
/// task; the scan sweep reads a published snapshot instead.
pub(crate) struct KeymapStore<S: ConfigStore> {
    table: Keymap,
    store: S,
}

impl<S: ConfigStore> KeymapStore<S> {
    pub(crate) fn new(store: S) -> Self {
        Self {
            table: Keymap::with_defaults(),
            store,
        }
    }

    /// Replaces the compiled-in defaults with the persisted table if one
    /// exists. First boot (nothing stored) provisions the defaults so every
    /// later boot takes the fast path; a corrupt blob keeps the defaults
    /// without persisting over the evidence.
    pub(crate) fn load(&mut self) -> Result<(), LoadError> {
        let mut blob = [0u8; KEYMAP_BLOB_LEN];
        match self.store.load(&mut blob) {
            Ok(()) => {
                self.table = Keymap::from_blob(&blob);
                Ok(())
            }
            Err(LoadError::NotFound) => {
                if self.save().is_err() {
                    esp_println::println!("keymap: provisioning save failed");
                }
                Err(LoadError::NotFound)
            }
            Err(LoadError::Corrupt) => Err(LoadError::Corrupt),
        }
    }

    /// Write-through: serializes the in-memory table without re-reading
    /// storage first.
    pub(crate) fn save(&mut self) -> Result<(), SaveError> {
        self.store.save(&self.table.to_blob())
    }

    /// Returns whether the record was updated; an out-of-range channel is
    /// ignored without error so the host protocol never desyncs.
    pub(crate) fn set(&mut self, channel: usize, threshold: u16, keycode: u8) -> bool {
        let Some(record) = self.table.records.get_mut(channel) else {
            return false;
        };
        record.threshold = threshold;
        record.keycode = keycode;
        true
    }

    pub(crate) fn get_all(&self) -> &Keymap {
        &self.table
    }
}
