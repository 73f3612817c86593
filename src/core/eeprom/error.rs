//! Store error types
//!
//! Provides error types for variable store operations.

use crate::platform::{FlashError, PlatformError};
use flash_eeprom_core::eeprom::ConfigError;

/// Errors from variable store operations
///
/// A miss is not an error: [`get`](super::FlashStore::get) returns `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Payload longer than the fixed record payload (rejected before any I/O)
    PayloadTooLarge,
    /// Requested size does not match the stored payload size
    SizeMismatch,
    /// A written record or header did not read back identically
    ///
    /// The previous value stays authoritative.
    WriteVerifyFailed,
    /// No room for the record even after compaction
    StoreFull,
    /// `init()` has not completed since construction or a failed swap
    NotInitialized,
    /// Store configuration rejected at construction
    InvalidConfig(ConfigError),
    /// Flash driver error
    Io(PlatformError),
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::PayloadTooLarge => write!(f, "payload too large"),
            StoreError::SizeMismatch => write!(f, "requested size does not match stored size"),
            StoreError::WriteVerifyFailed => write!(f, "write verification failed"),
            StoreError::StoreFull => write!(f, "store full"),
            StoreError::NotInitialized => write!(f, "store not initialized"),
            StoreError::InvalidConfig(e) => write!(f, "invalid configuration: {}", e),
            StoreError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<PlatformError> for StoreError {
    fn from(error: PlatformError) -> Self {
        StoreError::Io(error)
    }
}

impl From<FlashError> for StoreError {
    fn from(error: FlashError) -> Self {
        StoreError::Io(error.into())
    }
}

impl From<ConfigError> for StoreError {
    fn from(error: ConfigError) -> Self {
        StoreError::InvalidConfig(error)
    }
}
