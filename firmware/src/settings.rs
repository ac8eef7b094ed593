//! Flash-backed store for the persisted display settings.

use defmt::warn;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use healthful_ui::settings::{Settings, SETTINGS_LEN};

/// The record lives in the last sector of the 4 MiB external flash, clear of
/// the regions InfiniTime-compatible tooling writes to.
pub const SETTINGS_OFFSET: u32 = 0x3F_F000;

pub struct SettingsStore<F> {
    flash: F,
    offset: u32,
}

impl<F: ReadNorFlash + NorFlash> SettingsStore<F> {
    pub fn new(flash: F, offset: u32) -> Self {
        Self { flash, offset }
    }

    /// Read the stored settings, falling back to the defaults when the
    /// record is missing or unreadable.
    pub fn load(&mut self) -> Settings {
        let mut raw = [0; SETTINGS_LEN];
        match self.flash.read(self.offset, &mut raw) {
            Ok(()) => Settings::decode(&raw).unwrap_or_default(),
            Err(_) => {
                warn!("settings record unreadable, using defaults");
                Settings::default()
            }
        }
    }

    /// Persist the settings. Failures are logged and dropped so the watch
    /// keeps running with the in-memory copy.
    pub fn save(&mut self, settings: &Settings) {
        let record = settings.encode();
        let end = self.offset + F::ERASE_SIZE as u32;
        if self.flash.erase(self.offset, end).is_err() {
            warn!("failed to erase settings sector");
            return;
        }
        if self.flash.write(self.offset, &record).is_err() {
            warn!("failed to program settings record");
        }
    }
}
