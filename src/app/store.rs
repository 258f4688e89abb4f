use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;

use super::{
    config::KEYMAP_STORE_MAGIC,
    keymap::KEYMAP_BLOB_LEN,
    types::{LoadError, SaveError},
};

/// Durable blob storage for the keymap. Implementations frame the payload
/// however they like; the payload itself stays a fixed-size, header-less
/// blob.
pub(crate) trait ConfigStore {
    fn load(&mut self, payload: &mut [u8]) -> Result<(), LoadError>;
    fn save(&mut self, payload: &[u8]) -> Result<(), SaveError>;
}

// magic (4) + payload length (2), then payload, then checksum (1).
const HEADER_LEN: usize = 6;
const RECORD_LEN: usize = HEADER_LEN + KEYMAP_BLOB_LEN + 1;

/// Keymap persistence in the last flash sector, after the application image.
pub(crate) struct FlashConfigStore<'d> {
    flash: FlashStorage<'d>,
    offset: u32,
}

impl<'d> FlashConfigStore<'d> {
    pub(crate) fn new(flash_peripheral: esp_hal::peripherals::FLASH<'d>) -> Self {
        let flash = FlashStorage::new(flash_peripheral).multicore_auto_park();
        let capacity = flash.capacity() as u32;
        let offset = capacity.saturating_sub(FlashStorage::SECTOR_SIZE);
        Self { flash, offset }
    }
}

impl ConfigStore for FlashConfigStore<'_> {
    fn load(&mut self, payload: &mut [u8]) -> Result<(), LoadError> {
        let mut record = [0u8; RECORD_LEN];
        if self.flash.read(self.offset, &mut record).is_err() {
            return Err(LoadError::Corrupt);
        }
        if record.iter().all(|&byte| byte == 0xFF) {
            return Err(LoadError::NotFound);
        }
        if u32::from_le_bytes([record[0], record[1], record[2], record[3]]) != KEYMAP_STORE_MAGIC {
            return Err(LoadError::NotFound);
        }
        let stored_len = u16::from_le_bytes([record[4], record[5]]) as usize;
        if stored_len != payload.len() || HEADER_LEN + stored_len + 1 != RECORD_LEN {
            return Err(LoadError::Corrupt);
        }
        let expected = checksum8(&record[..RECORD_LEN - 1]);
        if record[RECORD_LEN - 1] != expected {
            return Err(LoadError::Corrupt);
        }
        payload.copy_from_slice(&record[HEADER_LEN..HEADER_LEN + stored_len]);
        Ok(())
    }

    fn save(&mut self, payload: &[u8]) -> Result<(), SaveError> {
        debug_assert_eq!(payload.len(), KEYMAP_BLOB_LEN);
        let mut record = [0xFFu8; RECORD_LEN];
        record[0..4].copy_from_slice(&KEYMAP_STORE_MAGIC.to_le_bytes());
        record[4..6].copy_from_slice(&(payload.len() as u16).to_le_bytes());
        record[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);
        record[RECORD_LEN - 1] = checksum8(&record[..RECORD_LEN - 1]);
        self.flash
            .write(self.offset, &record)
            .map_err(|_| SaveError::Io)
    }
}

fn checksum8(bytes: &[u8]) -> u8 {
    let mut acc = 0xA5u8;
    for &byte in bytes {
        acc = acc.rotate_left(3) ^ byte;
    }
    acc
}
