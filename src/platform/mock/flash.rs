//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use std::vec::Vec;

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (4 MB, same as Pico 2 W)
const FLASH_CAPACITY: u32 = 4 * 1024 * 1024;

/// Minimum firmware size (protect first 256 KB)
const FIRMWARE_SIZE: u32 = 0x40000;

/// Mock Flash implementation
///
/// Simulates NOR Flash in memory for testing. Supports:
/// - Read/write/erase operations with 1→0 write semantics
/// - Corruption injection and bit flips for testing error handling
/// - Stuck cells that refuse to program, for write-verify failures
/// - Erase and write counters for wear leveling validation
/// - Byte-granular power-loss simulation for crash recovery testing
///
/// # Example
///
/// ```ignore
/// use flash_eeprom::platform::mock::MockFlash;
/// use flash_eeprom::platform::traits::FlashInterface;
///
/// let mut flash = MockFlash::with_geometry(256, 64);
///
/// flash.erase(0, 64).unwrap();
/// flash.write(0, &[0xAA, 0xFF, 0xFF]).unwrap();
///
/// let mut buf = [0u8; 3];
/// flash.read(0, &mut buf).unwrap();
/// assert_eq!(buf, [0xAA, 0xFF, 0xFF]);
/// assert_eq!(flash.get_erase_count(0), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: Vec<u8>,
    /// Minimum erasable unit
    block_size: u32,
    /// Bytes below this address reject writes and erases
    protected: u32,
    /// Erase count per block (for wear leveling testing)
    erase_counts: Vec<u32>,
    /// Number of write operations issued
    write_count: u32,
    /// Cells with bits that stay 1 when programmed: (address, mask)
    stuck_bits: Vec<(u32, u8)>,
    /// Byte operations left before power is cut
    power_budget: Option<usize>,
    /// Cleared once simulated power loss hits
    powered: bool,
}

impl MockFlash {
    /// Create a mock with the Pico 2 W geometry (4 MB, 4 KB blocks)
    ///
    /// The first 256 KB are treated as firmware and reject writes and erases.
    pub fn new() -> Self {
        let mut flash = Self::with_geometry(FLASH_CAPACITY, BLOCK_SIZE);
        flash.protected = FIRMWARE_SIZE;
        flash
    }

    /// Create a small mock with arbitrary geometry and no protected range
    pub fn with_geometry(capacity: u32, block_size: u32) -> Self {
        let block_count = (capacity / block_size) as usize;

        Self {
            storage: vec![0xFF; capacity as usize],
            block_size,
            protected: 0,
            erase_counts: vec![0; block_count],
            write_count: 0,
            stuck_bits: Vec::new(),
            power_budget: None,
            powered: true,
        }
    }

    /// Get Flash contents (for test verification)
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        self.storage[address as usize..(address as usize + len)].to_vec()
    }

    /// Inject corruption at address (for testing error recovery)
    ///
    /// Overwrites `len` bytes with a fixed pattern, bypassing 1→0 semantics.
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        for byte in &mut self.storage[address as usize..address as usize + len] {
            *byte = 0xAA; // Corrupt pattern
        }
    }

    /// Flip a single bit in place, bypassing 1→0 semantics
    pub fn flip_bit(&mut self, address: u32, bit: u8) {
        self.storage[address as usize] ^= 1 << (bit & 7);
    }

    /// Make bits in `mask` at `address` impossible to program
    ///
    /// Writes still complete, but the masked bits read back as 1.
    pub fn stick_bits(&mut self, address: u32, mask: u8) {
        self.stuck_bits.push((address, mask));
    }

    /// Get erase count for a block (for wear leveling validation)
    ///
    /// Returns the number of times a block has been erased.
    pub fn get_erase_count(&self, address: u32) -> u32 {
        let block_id = (address / self.block_size) as usize;
        self.erase_counts[block_id]
    }

    /// Get total erase count across all blocks
    pub fn get_total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Get number of write operations issued so far
    pub fn get_write_count(&self) -> u32 {
        self.write_count
    }

    /// Cut power after `bytes` more byte-level program or erase steps
    ///
    /// The step that hits the limit fails and leaves the byte untouched.
    /// From then on every operation fails until [`Self::restore_power`].
    pub fn simulate_power_loss_after(&mut self, bytes: usize) {
        self.power_budget = Some(bytes);
    }

    /// Power the device back up and cancel any pending power loss
    pub fn restore_power(&mut self) {
        self.power_budget = None;
        self.powered = true;
    }

    /// Whether simulated power loss has hit
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Consume one byte step of the power budget
    fn tick(&mut self) -> bool {
        if !self.powered {
            return false;
        }

        match self.power_budget {
            None => true,
            Some(0) => {
                self.power_budget = None;
                self.powered = false;
                false
            }
            Some(left) => {
                self.power_budget = Some(left - 1);
                true
            }
        }
    }

    /// Bits at `address` that cannot be programmed
    fn stuck_mask(&self, address: u32) -> u8 {
        self.stuck_bits
            .iter()
            .filter(|(stuck, _)| *stuck == address)
            .fold(0, |mask, (_, bits)| mask | bits)
    }

    /// Check if a range is in the writable region
    fn is_writable(&self, address: u32, len: usize) -> bool {
        address >= self.protected && address as usize + len <= self.storage.len()
    }

    /// Check if address is block-aligned
    fn is_block_aligned(&self, address: u32) -> bool {
        address % self.block_size == 0
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if !self.powered {
            return Err(FlashError::ReadFailed.into());
        }

        // Validate address range
        if address as usize + buf.len() > self.storage.len() {
            return Err(FlashError::InvalidAddress.into());
        }

        buf.copy_from_slice(&self.storage[address as usize..(address as usize + buf.len())]);

        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.powered {
            return Err(FlashError::WriteFailed.into());
        }

        if !self.is_writable(address, data.len()) {
            return Err(FlashError::InvalidAddress.into());
        }

        self.write_count += 1;

        // Flash can only change bits from 1→0 (simulate this behavior)
        for (i, &byte) in data.iter().enumerate() {
            if !self.tick() {
                return Err(FlashError::WriteFailed.into());
            }
            let target = address + i as u32;
            let mask = self.stuck_mask(target);
            self.storage[target as usize] &= byte | mask;
        }

        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.powered {
            return Err(FlashError::EraseFailed.into());
        }

        // Validate address is in writable region and block-aligned
        if !self.is_writable(address, size as usize)
            || !self.is_block_aligned(address)
            || size % self.block_size != 0
        {
            return Err(FlashError::InvalidAddress.into());
        }

        // Update erase counts
        let start_block = (address / self.block_size) as usize;
        for count in &mut self.erase_counts[start_block..start_block + (size / self.block_size) as usize]
        {
            *count += 1;
        }

        // Erase bytes in address order; power loss leaves the tail programmed
        for i in address as usize..(address + size) as usize {
            if !self.tick() {
                return Err(FlashError::EraseFailed.into());
            }
            self.storage[i] = 0xFF;
        }

        Ok(())
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn capacity(&self) -> u32 {
        self.storage.len() as u32
    }
}
