//! embedded-storage adapter
//!
//! Lets any NOR flash driver implementing the `embedded-storage` traits back
//! the variable store.
//!
//! The driver must implement [`MultiwriteNorFlash`]: region headers are
//! programmed several times over the same bytes, each time clearing more bits.
//! Records and headers are written at byte granularity, so drivers with a
//! `READ_SIZE` or `WRITE_SIZE` above 1 report `FlashError::InvalidAddress`.

use crate::platform::{error::FlashError, traits::FlashInterface, PlatformError, Result};
use embedded_storage::nor_flash::{MultiwriteNorFlash, NorFlashError, NorFlashErrorKind};

/// [`FlashInterface`] over an `embedded-storage` NOR flash driver
///
/// # Example
///
/// ```ignore
/// use flash_eeprom::platform::nor_flash::NorFlashAdapter;
/// use flash_eeprom::{DefaultFlashStore, StoreConfig};
///
/// let flash = NorFlashAdapter::new(hal_flash);
/// let mut store = DefaultFlashStore::new(flash, StoreConfig::default())?;
/// store.init()?;
/// ```
pub struct NorFlashAdapter<F> {
    inner: F,
}

impl<F: MultiwriteNorFlash> NorFlashAdapter<F> {
    /// Wrap a NOR flash driver
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    /// Unwrap the driver
    pub fn into_inner(self) -> F {
        self.inner
    }
}

/// Map a driver error to a platform error
fn map_error(error: impl NorFlashError, fallback: FlashError) -> PlatformError {
    match error.kind() {
        NorFlashErrorKind::NotAligned | NorFlashErrorKind::OutOfBounds => {
            FlashError::InvalidAddress.into()
        }
        _ => fallback.into(),
    }
}

impl<F: MultiwriteNorFlash> FlashInterface for NorFlashAdapter<F> {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.inner
            .read(address, buf)
            .map_err(|e| map_error(e, FlashError::ReadFailed))
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.inner
            .write(address, data)
            .map_err(|e| map_error(e, FlashError::WriteFailed))
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        self.inner
            .erase(address, address + size)
            .map_err(|e| map_error(e, FlashError::EraseFailed))
    }

    fn block_size(&self) -> u32 {
        F::ERASE_SIZE as u32
    }

    fn capacity(&self) -> u32 {
        self.inner.capacity() as u32
    }
}
