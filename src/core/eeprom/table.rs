//! Lookup table and region scan
//!
//! The lookup table maps each variable id to the region offset of its latest
//! intact record. It is rebuilt by [`scan`] at initialization and after a
//! swap, and extended in place on every append.

use super::error::StoreError;
use super::region::RegionPair;
use crate::platform::FlashInterface;
use flash_eeprom_core::eeprom::{record_offset, Record, RecordStatus, RegionId, MAX_RECORD_SIZE};
use heapless::FnvIndexMap;

/// Latest record offset per variable id
///
/// `N` must be a power of two. Iteration follows first insertion order, which
/// is the order records are copied in during a swap.
#[derive(Debug, Clone, Default)]
pub struct LookupTable<const N: usize> {
    /// Region-relative record offset per id
    offsets: FnvIndexMap<u16, u32, N>,
}

impl<const N: usize> LookupTable<N> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            offsets: FnvIndexMap::new(),
        }
    }

    /// Offset of the latest record for `id`
    pub fn get(&self, id: u16) -> Option<u32> {
        self.offsets.get(&id).copied()
    }

    /// Point `id` at a newer record
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreFull`] if `id` is new and the table has no
    /// room left.
    pub fn insert(&mut self, id: u16, offset: u32) -> Result<(), StoreError> {
        self.offsets
            .insert(id, offset)
            .map(|_| ())
            .map_err(|_| StoreError::StoreFull)
    }

    /// Whether `id` has a record
    pub fn contains(&self, id: u16) -> bool {
        self.offsets.contains_key(&id)
    }

    /// Number of live ids
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether no id has a record
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Live ids in table order
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.offsets.keys().copied()
    }

    /// `(id, offset)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.offsets.iter().map(|(&id, &offset)| (id, offset))
    }
}

/// Result of scanning a region
#[derive(Debug, Clone)]
pub struct ScanResult<const N: usize> {
    /// Latest intact record per id
    pub table: LookupTable<N>,
    /// Index of the first blank slot (capacity if the region is full)
    pub next_slot: usize,
    /// Written slots that failed to decode
    pub skipped: usize,
}

/// Scan a region's record stream
///
/// Walks record slots from the start of the region and stops at the first
/// slot whose status byte is blank, or at the end of the region. Records that
/// fail to decode are counted in [`ScanResult::skipped`] and do not stop the
/// scan; a later record for an id replaces an earlier one.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if a read fails, or [`StoreError::StoreFull`] if
/// the region holds more distinct ids than the table can index.
pub fn scan<F: FlashInterface, const P: usize, const N: usize>(
    regions: &mut RegionPair<F>,
    region: RegionId,
) -> Result<ScanResult<N>, StoreError> {
    let slots = regions.config().capacity(P);
    let mut result = ScanResult {
        table: LookupTable::new(),
        next_slot: slots,
        skipped: 0,
    };

    let mut buf = [0u8; MAX_RECORD_SIZE];
    let raw = &mut buf[..Record::<P>::SIZE];

    for slot in 0..slots {
        let offset = record_offset(slot, P);
        regions.read(region, offset, raw)?;

        if RecordStatus::from_byte(raw[0]) == RecordStatus::Blank {
            result.next_slot = slot;
            break;
        }

        match Record::<P>::decode(raw) {
            Some(record) => result.table.insert(record.id, offset as u32)?,
            None => {
                crate::log_warn!("Skipping damaged record in slot {} of region {:?}", slot, region);
                result.skipped += 1;
            }
        }
    }

    crate::log_debug!(
        "Scanned region {:?}: {} ids, next slot {}",
        region,
        result.table.len(),
        result.next_slot
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;
    use flash_eeprom_core::eeprom::StoreConfig;

    const P: usize = 8;

    fn pair() -> RegionPair<MockFlash> {
        RegionPair::new(
            MockFlash::with_geometry(256, 64),
            StoreConfig::new(64, 128, 64),
        )
    }

    fn append(regions: &mut RegionPair<MockFlash>, slot: usize, id: u16, data: &[u8]) {
        let record = Record::<P>::new(id, data).unwrap();
        regions
            .write(RegionId::A, record_offset(slot, P), &record.encode())
            .unwrap();
    }

    #[test]
    fn test_lookup_table_basics() {
        let mut table = LookupTable::<4>::new();
        assert!(table.is_empty());

        table.insert(7, 3).unwrap();
        table.insert(9, 15).unwrap();
        table.insert(7, 27).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(7), Some(27));
        assert_eq!(table.get(9), Some(15));
        assert_eq!(table.get(1), None);
        assert!(table.contains(9));

        // Re-pointing keeps the first insertion position
        let mut ids = table.ids();
        assert_eq!(ids.next(), Some(7));
        assert_eq!(ids.next(), Some(9));
        assert_eq!(ids.next(), None);
    }

    #[test]
    fn test_lookup_table_overflow() {
        let mut table = LookupTable::<2>::new();
        table.insert(1, 0).unwrap();
        table.insert(2, 0).unwrap();

        assert_eq!(table.insert(3, 0), Err(StoreError::StoreFull));
        // Existing ids can still be re-pointed
        assert!(table.insert(1, 12).is_ok());
    }

    #[test]
    fn test_scan_empty_region() {
        let mut regions = pair();
        let result = scan::<_, P, 8>(&mut regions, RegionId::A).unwrap();

        assert!(result.table.is_empty());
        assert_eq!(result.next_slot, 0);
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_scan_last_writer_wins() {
        let mut regions = pair();
        append(&mut regions, 0, 1, &[0x10]);
        append(&mut regions, 1, 2, &[0x20]);
        append(&mut regions, 2, 1, &[0x11]);

        let result = scan::<_, P, 8>(&mut regions, RegionId::A).unwrap();

        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.get(1), Some(record_offset(2, P) as u32));
        assert_eq!(result.table.get(2), Some(record_offset(1, P) as u32));
        assert_eq!(result.next_slot, 3);
    }

    #[test]
    fn test_scan_skips_damaged_record() {
        let mut regions = pair();
        append(&mut regions, 0, 1, &[0x10]);
        append(&mut regions, 1, 2, &[0x20]);
        append(&mut regions, 2, 3, &[0x30]);

        // Corrupt the payload of slot 1
        let payload = 64 + record_offset(1, P) as u32 + 3;
        regions.flash_mut().flip_bit(payload, 0);

        let result = scan::<_, P, 8>(&mut regions, RegionId::A).unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.table.get(2), None);
        assert!(result.table.contains(1));
        assert!(result.table.contains(3));
        assert_eq!(result.next_slot, 3);
    }

    #[test]
    fn test_scan_full_region() {
        let mut regions = pair();
        for slot in 0..5 {
            append(&mut regions, slot, slot as u16, &[slot as u8]);
        }

        let result = scan::<_, P, 8>(&mut regions, RegionId::A).unwrap();

        assert_eq!(result.table.len(), 5);
        assert_eq!(result.next_slot, 5);
    }

    #[test]
    fn test_scan_table_overflow() {
        let mut regions = pair();
        for slot in 0..3 {
            append(&mut regions, slot, slot as u16, &[0x01]);
        }

        let result = scan::<_, P, 2>(&mut regions, RegionId::A);
        assert!(matches!(result, Err(StoreError::StoreFull)));
    }
}
