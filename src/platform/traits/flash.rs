//! Flash interface trait
//!
//! This module defines the Flash storage interface that platform implementations must provide.
//! The variable store consumes nothing else from the platform.

use crate::platform::Result;

/// Chunk size used when checking a range for the erased state
const ERASE_CHECK_CHUNK: usize = 32;

/// Flash interface trait
///
/// Platform implementations must provide this interface for Flash read/write/erase operations.
///
/// # Flash Characteristics
///
/// - Flash is organized in blocks (the minimum erasable unit)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1→0 (must erase first to reset to 1)
/// - Operations are blocking; their duration is opaque to callers
///
/// # Safety Invariants
///
/// - Flash peripheral must be initialized before use
/// - Only one owner per Flash instance (no concurrent access)
/// - Interrupt handlers that touch the same Flash must be masked by the caller
///   for the duration of every store operation
pub trait FlashInterface {
    /// Read data from Flash
    ///
    /// Reads `buf.len()` bytes from Flash starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if address is out of bounds.
    /// Returns `PlatformError::Flash(FlashError::ReadFailed)` if the read operation fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to Flash
    ///
    /// Writes `data` to Flash starting at `address`.
    ///
    /// # Important
    ///
    /// - Writing can only change bits from 1→0
    /// - Writing a 1 over a 0 has no effect; the caller must erase first
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if address is out of bounds.
    /// Returns `PlatformError::Flash(FlashError::WriteFailed)` if the write operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase Flash region
    ///
    /// Erases Flash starting at `address` for `size` bytes.
    /// Sets all bytes in the region to 0xFF.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if:
    /// - Address is not block-aligned
    /// - Size is not a multiple of block size
    ///
    /// Returns `PlatformError::Flash(FlashError::EraseFailed)` if the erase operation fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Get Flash block size
    ///
    /// Returns the minimum erasable unit size.
    fn block_size(&self) -> u32;

    /// Get total Flash size
    ///
    /// Returns the total Flash capacity in bytes.
    fn capacity(&self) -> u32;

    /// Check that a range reads back fully erased (all 0xFF)
    ///
    /// The default implementation reads the range back in small chunks.
    fn verify_erased(&mut self, address: u32, size: u32) -> Result<bool> {
        let mut chunk = [0u8; ERASE_CHECK_CHUNK];
        let mut offset = 0u32;

        while offset < size {
            let len = core::cmp::min(ERASE_CHECK_CHUNK as u32, size - offset) as usize;
            self.read(address + offset, &mut chunk[..len])?;
            if chunk[..len].iter().any(|&b| b != 0xFF) {
                return Ok(false);
            }
            offset += len as u32;
        }

        Ok(true)
    }
}
