//! Region geometry and store configuration
//!
//! A store occupies two equally sized, independently erasable regions. Each
//! region starts with a [`HEADER_SIZE`]-byte lifecycle header followed by a
//! packed array of fixed-size records.
//!
//! ```text
//! offset 0                3              3 + R          3 + 2R
//! +-----------------------+--------------+--------------+-----
//! | header (3 bytes)      | record 0     | record 1     | ...
//! +-----------------------+--------------+--------------+-----
//!
//! record (R = P + 4 bytes):
//! +--------+-----------+-----------------+----------+
//! | status | id (LE16) | payload (P)     | checksum |
//! +--------+-----------+-----------------+----------+
//! ```

/// Size of the region lifecycle header in bytes
pub const HEADER_SIZE: usize = 3;

/// Bytes a record carries besides its payload (status + id + checksum)
pub const RECORD_OVERHEAD: usize = 4;

/// Largest supported payload size
///
/// Keeps a whole record within a 256-byte stack buffer.
pub const MAX_PAYLOAD_SIZE: usize = 252;

/// Largest possible record size
pub const MAX_RECORD_SIZE: usize = MAX_PAYLOAD_SIZE + RECORD_OVERHEAD;

/// Default payload size per variable
pub const DEFAULT_PAYLOAD_SIZE: usize = 22;

/// Default base address of region A
pub const DEFAULT_REGION_A: u32 = 0x040000;

/// Default base address of region B
pub const DEFAULT_REGION_B: u32 = 0x041000;

/// Default region size (one 4 KB erase block)
pub const DEFAULT_REGION_SIZE: u32 = 4096;

/// Default lookup table capacity
///
/// Must be a power of two and at least the record capacity of a region.
pub const DEFAULT_TABLE_SIZE: usize = 256;

/// Size of one record for the given payload size
pub const fn record_size(payload_size: usize) -> usize {
    payload_size + RECORD_OVERHEAD
}

/// Number of records a region can hold
///
/// `floor((region_size - HEADER_SIZE) / record_size)`, or 0 when the region
/// cannot even hold the header.
pub const fn capacity(region_size: usize, payload_size: usize) -> usize {
    if region_size < HEADER_SIZE {
        return 0;
    }
    (region_size - HEADER_SIZE) / record_size(payload_size)
}

/// Region offset of record slot `slot`
pub const fn record_offset(slot: usize, payload_size: usize) -> usize {
    HEADER_SIZE + slot * record_size(payload_size)
}

/// One of the two regions of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionId {
    /// First region (preferred on ties)
    A,
    /// Second region
    B,
}

impl RegionId {
    /// Both regions in tie-break order
    pub const ALL: [RegionId; 2] = [RegionId::A, RegionId::B];

    /// The opposite region
    pub const fn other(self) -> Self {
        match self {
            RegionId::A => RegionId::B,
            RegionId::B => RegionId::A,
        }
    }

    /// Index into per-region arrays
    pub const fn index(self) -> usize {
        match self {
            RegionId::A => 0,
            RegionId::B => 1,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Payload size is zero or above [`MAX_PAYLOAD_SIZE`]
    PayloadSize,
    /// Region cannot hold the header and at least one record
    RegionTooSmall,
    /// Region base or size is not aligned to the erase block size
    Misaligned,
    /// The two regions share bytes
    Overlapping,
    /// Lookup table cannot index every record slot
    TableTooSmall,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::PayloadSize => write!(f, "payload size out of range"),
            ConfigError::RegionTooSmall => write!(f, "region too small for one record"),
            ConfigError::Misaligned => write!(f, "region not aligned to erase block"),
            ConfigError::Overlapping => write!(f, "regions overlap"),
            ConfigError::TableTooSmall => write!(f, "lookup table smaller than region capacity"),
        }
    }
}

/// Flash placement of a store
///
/// # Example
///
/// ```
/// use flash_eeprom_core::eeprom::StoreConfig;
///
/// let config = StoreConfig::new(0x0000, 0x0040, 64);
/// assert_eq!(config.capacity(8), 5);
/// assert!(config.validate(8, 64, 8).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoreConfig {
    /// Base address of region A
    pub region_a: u32,
    /// Base address of region B
    pub region_b: u32,
    /// Size of each region in bytes
    pub region_size: u32,
}

impl StoreConfig {
    /// Create a configuration from two base addresses and a region size
    pub const fn new(region_a: u32, region_b: u32, region_size: u32) -> Self {
        Self {
            region_a,
            region_b,
            region_size,
        }
    }

    /// Base address of a region
    pub const fn base(&self, region: RegionId) -> u32 {
        match region {
            RegionId::A => self.region_a,
            RegionId::B => self.region_b,
        }
    }

    /// Record capacity of one region for the given payload size
    pub const fn capacity(&self, payload_size: usize) -> usize {
        capacity(self.region_size as usize, payload_size)
    }

    /// Validate the configuration
    ///
    /// # Arguments
    ///
    /// - `payload_size`: Fixed payload size of each record
    /// - `block_size`: Erase block size of the flash device
    /// - `table_size`: Capacity of the lookup table
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(
        &self,
        payload_size: usize,
        block_size: u32,
        table_size: usize,
    ) -> Result<(), ConfigError> {
        if payload_size == 0 || payload_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::PayloadSize);
        }

        if block_size == 0
            || self.region_size == 0
            || self.region_size % block_size != 0
            || self.region_a % block_size != 0
            || self.region_b % block_size != 0
        {
            return Err(ConfigError::Misaligned);
        }

        let (low, high) = if self.region_a <= self.region_b {
            (self.region_a, self.region_b)
        } else {
            (self.region_b, self.region_a)
        };
        if (high - low) < self.region_size {
            return Err(ConfigError::Overlapping);
        }

        let slots = self.capacity(payload_size);
        if slots == 0 {
            return Err(ConfigError::RegionTooSmall);
        }

        if table_size < slots {
            return Err(ConfigError::TableTooSmall);
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_A, DEFAULT_REGION_B, DEFAULT_REGION_SIZE)
    }
}
