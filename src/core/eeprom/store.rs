//! Variable store engine
//!
//! [`FlashStore`] keeps small fixed-size variables in two flash regions. New
//! values are appended to the authoritative region; when it fills up, the
//! live values are compacted into the other region (a swap) and the roles of
//! the two regions are exchanged.
//!
//! # Swap sequence
//!
//! ```text
//! src: Valid        dst: Empty
//!      Valid             Initializing   (dst erased if not blank, then Begin)
//!      Valid             Initializing   (live records copied in table order)
//!      Invalid           Initializing   (Retire src)
//!      Invalid           Valid          (Commit dst)
//!      Empty             Valid          (src erased)
//! ```
//!
//! Power loss between any two steps leaves a header pair that
//! [`resolve`](flash_eeprom_core::eeprom::resolve) settles on the next `init()`,
//! keeping either the old or the new copy of the data set.

use super::error::StoreError;
use super::region::RegionPair;
use super::table::{scan, LookupTable};
use crate::platform::FlashInterface;
use flash_eeprom_core::eeprom::{
    record_offset, resolve, HeaderState, HeaderTransition, Record, RecordStatus, RegionId,
    RepairAction, StoreConfig, DEFAULT_PAYLOAD_SIZE, DEFAULT_TABLE_SIZE, MAX_RECORD_SIZE,
};

/// Value returned by [`FlashStore::get`]
pub type Payload<const P: usize> = heapless::Vec<u8, P>;

/// Store with the default payload size and lookup table capacity
pub type DefaultFlashStore<F> = FlashStore<F, DEFAULT_PAYLOAD_SIZE, DEFAULT_TABLE_SIZE>;

/// Store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoreStats {
    /// Completed swaps
    pub swaps: u32,
    /// Records appended by `set`
    pub records_written: u32,
    /// `set` calls skipped because the value was unchanged
    pub writes_skipped: u32,
    /// Appends that did not read back identically
    pub verify_failures: u32,
    /// Erase count per region (for wear monitoring), indexed by [`RegionId::index`]
    pub erases: [u32; 2],
}

/// Flash-backed variable store
///
/// - `P`: fixed payload size of every record
/// - `N`: lookup table capacity, a power of two no smaller than the region
///   capacity
///
/// # Example
///
/// ```ignore
/// use flash_eeprom::platform::mock::MockFlash;
/// use flash_eeprom::{DefaultFlashStore, StoreConfig};
///
/// let mut store = DefaultFlashStore::new(MockFlash::new(), StoreConfig::default()).unwrap();
/// store.init().unwrap();
///
/// store.set(0x0010, &[0x01, 0x02]).unwrap();
/// let value = store.get(0x0010, 2).unwrap();
/// assert_eq!(value.as_deref(), Some(&[0x01, 0x02][..]));
/// ```
#[derive(Debug)]
pub struct FlashStore<F: FlashInterface, const P: usize, const N: usize> {
    /// Flash regions
    regions: RegionPair<F>,
    /// Latest record offset per id in the active region
    table: LookupTable<N>,
    /// Authoritative region
    active: RegionId,
    /// Append cursor (record slot index)
    next_slot: usize,
    /// Record slots per region
    capacity: usize,
    /// Cleared until `init()` succeeds, and after a failed swap
    initialized: bool,
    /// Storage statistics
    stats: StoreStats,
}

impl<F: FlashInterface, const P: usize, const N: usize> FlashStore<F, P, N> {
    /// Create a store over two regions of `flash`
    ///
    /// Nothing is read or written until [`Self::init`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration does not fit
    /// the payload size, the flash erase block or the lookup table.
    pub fn new(flash: F, config: StoreConfig) -> Result<Self, StoreError> {
        config.validate(P, flash.block_size(), N)?;

        Ok(Self {
            regions: RegionPair::new(flash, config),
            table: LookupTable::new(),
            active: RegionId::A,
            next_slot: 0,
            capacity: config.capacity(P),
            initialized: false,
            stats: StoreStats::default(),
        })
    }

    /// Recover the regions and load the lookup table
    ///
    /// Reads both region headers, runs the repairs chosen by
    /// [`resolve`](flash_eeprom_core::eeprom::resolve) and scans the
    /// authoritative region. Calling it again after a clean run performs no
    /// flash writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::WriteVerifyFailed`] if a
    /// repair cannot be carried out. The store stays uninitialized.
    pub fn init(&mut self) -> Result<(), StoreError> {
        self.initialized = false;

        let a = self.regions.read_header(RegionId::A)?;
        let b = self.regions.read_header(RegionId::B)?;

        for (_region, header) in RegionId::ALL.into_iter().zip([a, b]) {
            if header == HeaderState::Unrecognized {
                crate::log_warn!("Region {:?} header unrecognized, forcing erase", _region);
            }
        }

        let resolution = resolve(a, b);
        for action in resolution.actions.iter().copied() {
            crate::log_info!("Region repair: {:?}", action);
            match action {
                RepairAction::Erase(region) => self.erase_region(region)?,
                RepairAction::Promote(region) => {
                    self.regions.write_header(region, HeaderTransition::Commit)?
                }
            }
        }

        self.load(resolution.authoritative)?;

        crate::log_info!(
            "Store ready: region {:?}, {} variables, {} free slots",
            self.active,
            self.table.len(),
            self.free_slots()
        );

        Ok(())
    }

    /// Read a variable
    ///
    /// Returns the first `size` bytes of the stored payload, `None` if `id`
    /// has never been written or its record no longer passes its checksum.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SizeMismatch`] if `size` exceeds the payload size `P`
    /// - [`StoreError::NotInitialized`] before a successful `init()`
    /// - [`StoreError::Io`] if the flash read fails
    pub fn get(&mut self, id: u16, size: usize) -> Result<Option<Payload<P>>, StoreError> {
        if size > P {
            return Err(StoreError::SizeMismatch);
        }
        self.ensure_initialized()?;

        let Some(offset) = self.table.get(id) else {
            return Ok(None);
        };

        let Some(record) = self.read_record(self.active, offset)? else {
            crate::log_warn!("Record for id {} failed its checksum", id);
            return Ok(None);
        };

        Payload::from_slice(&record.payload[..size])
            .map(Some)
            .map_err(|_| StoreError::SizeMismatch)
    }

    /// Write a variable
    ///
    /// Payloads shorter than `P` are zero padded. Writing the value a variable
    /// already holds is a no-op. When the active region is full, its live
    /// records are compacted into the other region first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PayloadTooLarge`] if `data` is longer than `P`
    /// - [`StoreError::NotInitialized`] before a successful `init()`
    /// - [`StoreError::StoreFull`] if compaction cannot free a slot
    /// - [`StoreError::WriteVerifyFailed`] if the record did not read back
    ///   identically; the previous value stays in place
    /// - [`StoreError::Io`] on flash failure
    pub fn set(&mut self, id: u16, data: &[u8]) -> Result<(), StoreError> {
        let record = Record::<P>::new(id, data).ok_or(StoreError::PayloadTooLarge)?;
        self.ensure_initialized()?;

        if let Some(offset) = self.table.get(id) {
            if let Some(current) = self.read_record(self.active, offset)? {
                if current.holds(data) {
                    crate::log_trace!("Variable {} unchanged, skipping write", id);
                    self.stats.writes_skipped += 1;
                    return Ok(());
                }
            }
        }

        if self.next_slot >= self.capacity {
            self.compact()?;
        }

        if self.next_slot >= self.capacity || (!self.table.contains(id) && self.table.len() >= N) {
            crate::log_warn!("Store full, cannot write variable {}", id);
            return Err(StoreError::StoreFull);
        }

        self.append(record)
    }

    /// Record slots per region
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live variables
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no variable is stored
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Whether `id` has a value
    pub fn contains(&self, id: u16) -> bool {
        self.table.contains(id)
    }

    /// Live variable ids in table order
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.table.ids()
    }

    /// Records that can be appended before the next swap
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.next_slot)
    }

    /// Region offset of the next record to be appended
    pub fn free_offset(&self) -> usize {
        record_offset(self.next_slot, P)
    }

    /// Authoritative region, once initialized
    pub fn active_region(&self) -> Option<RegionId> {
        self.initialized.then_some(self.active)
    }

    /// Whether `init()` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> StoreStats {
        self.stats
    }

    /// Region placement
    pub fn config(&self) -> &StoreConfig {
        self.regions.config()
    }

    /// Flash interface reference
    pub fn flash(&self) -> &F {
        self.regions.flash()
    }

    /// Mutable flash interface reference (for testing)
    ///
    /// Writing through this reference bypasses the store; call
    /// [`Self::init`] afterwards to resynchronize.
    pub fn flash_mut(&mut self) -> &mut F {
        self.regions.flash_mut()
    }

    /// Release the flash interface
    pub fn into_flash(self) -> F {
        self.regions.into_flash()
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.initialized {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Scan `region` and make it the active region
    fn load(&mut self, region: RegionId) -> Result<(), StoreError> {
        let result = scan::<F, P, N>(&mut self.regions, region)?;

        self.table = result.table;
        self.next_slot = result.next_slot;
        self.active = region;
        self.initialized = true;

        Ok(())
    }

    /// Read and decode the record at `offset`
    fn read_record(&mut self, region: RegionId, offset: u32) -> Result<Option<Record<P>>, StoreError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let raw = &mut buf[..Record::<P>::SIZE];
        self.regions.read(region, offset as usize, raw)?;
        Ok(Record::decode(raw))
    }

    fn erase_region(&mut self, region: RegionId) -> Result<(), StoreError> {
        self.stats.erases[region.index()] += 1;
        self.regions.erase(region)
    }

    /// Append a record at the cursor
    fn append(&mut self, record: Record<P>) -> Result<(), StoreError> {
        let offset = record_offset(self.next_slot, P);

        match self.regions.write_verified(self.active, offset, &record.encode()) {
            Ok(()) => {
                self.table.insert(record.id, offset as u32)?;
                self.next_slot += 1;
                self.stats.records_written += 1;
                Ok(())
            }
            Err(e) => {
                if e == StoreError::WriteVerifyFailed {
                    crate::log_error!(
                        "Write verify failed for variable {} at offset {}",
                        record.id,
                        offset
                    );
                    self.stats.verify_failures += 1;
                }
                self.settle_cursor(offset);
                Err(e)
            }
        }
    }

    /// Step the cursor past a failed append if its status byte was programmed
    ///
    /// A rescan stops at the first blank status byte, so this keeps the cursor
    /// where `init()` would put it.
    fn settle_cursor(&mut self, offset: usize) {
        let mut status = [0u8; 1];
        match self.regions.read(self.active, offset, &mut status) {
            Ok(()) if status[0] != RecordStatus::BLANK => self.next_slot += 1,
            Ok(()) => {}
            Err(_) => self.initialized = false,
        }
    }

    /// Free slots by swapping, unless every record is live
    fn compact(&mut self) -> Result<(), StoreError> {
        if self.table.len() >= self.capacity {
            crate::log_warn!("All {} records live, swap skipped", self.capacity);
            return Err(StoreError::StoreFull);
        }

        let result = self.swap();
        if result.is_err() {
            crate::log_error!("Swap failed, store needs init");
            self.initialized = false;
        }
        result
    }

    /// Copy the live records into the other region and switch to it
    fn swap(&mut self) -> Result<(), StoreError> {
        let src = self.active;
        let dst = src.other();

        crate::log_info!(
            "Swap {:?} -> {:?}: {} live of {} records",
            src,
            dst,
            self.table.len(),
            self.next_slot
        );

        if !self.regions.verify_erased(dst)? {
            self.erase_region(dst)?;
        }
        self.regions.write_header(dst, HeaderTransition::Begin)?;

        let mut buf = [0u8; MAX_RECORD_SIZE];
        let mut slot = 0;
        for (_id, offset) in self.table.iter() {
            let raw = &mut buf[..Record::<P>::SIZE];
            self.regions.read(src, offset as usize, raw)?;

            let Some(record) = Record::<P>::decode(raw) else {
                crate::log_warn!("Dropping damaged record for variable {}", _id);
                continue;
            };

            self.regions
                .write_verified(dst, record_offset(slot, P), &record.encode())?;
            slot += 1;
        }

        self.regions.write_header(src, HeaderTransition::Retire)?;
        self.regions.write_header(dst, HeaderTransition::Commit)?;
        self.erase_region(src)?;

        self.load(dst)?;
        self.stats.swaps += 1;

        crate::log_info!("Swap done: {} free slots in region {:?}", self.free_slots(), dst);

        Ok(())
    }
}
