//! Region access over the flash interface
//!
//! [`RegionPair`] owns the flash device and translates `(region, offset)`
//! pairs into absolute addresses. Every access is bounds checked against the
//! region size, so a store can never touch flash outside its two regions.

use super::error::StoreError;
use crate::platform::{FlashError, FlashInterface};
use flash_eeprom_core::eeprom::{HeaderState, HeaderTransition, RegionId, StoreConfig, HEADER_SIZE};

/// Chunk size for write verification reads
const VERIFY_CHUNK: usize = 32;

/// The two regions of a store on one flash device
#[derive(Debug)]
pub struct RegionPair<F: FlashInterface> {
    /// Flash interface
    flash: F,
    /// Region placement
    config: StoreConfig,
}

impl<F: FlashInterface> RegionPair<F> {
    /// Create a region pair
    ///
    /// The configuration is not validated here; see [`StoreConfig::validate`].
    pub fn new(flash: F, config: StoreConfig) -> Self {
        Self { flash, config }
    }

    /// Region placement
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Size of each region in bytes
    pub fn region_size(&self) -> usize {
        self.config.region_size as usize
    }

    /// Absolute address of `len` bytes at `offset` in `region`
    fn address(&self, region: RegionId, offset: usize, len: usize) -> Result<u32, StoreError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.region_size() => {
                Ok(self.config.base(region) + offset as u32)
            }
            _ => Err(FlashError::InvalidAddress.into()),
        }
    }

    /// Read `buf.len()` bytes at `offset`
    pub fn read(&mut self, region: RegionId, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let address = self.address(region, offset, buf.len())?;
        self.flash.read(address, buf)?;
        Ok(())
    }

    /// Program `data` at `offset` without verification
    pub fn write(&mut self, region: RegionId, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        let address = self.address(region, offset, data.len())?;
        self.flash.write(address, data)?;
        Ok(())
    }

    /// Program `data` at `offset` and read it back
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteVerifyFailed`] if any byte reads back
    /// differently, or [`StoreError::Io`] if the driver reports a failure.
    pub fn write_verified(
        &mut self,
        region: RegionId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        self.write(region, offset, data)?;

        let mut readback = [0u8; VERIFY_CHUNK];
        for (i, expected) in data.chunks(VERIFY_CHUNK).enumerate() {
            let actual = &mut readback[..expected.len()];
            self.read(region, offset + i * VERIFY_CHUNK, actual)?;
            if actual != expected {
                return Err(StoreError::WriteVerifyFailed);
            }
        }

        Ok(())
    }

    /// Erase a whole region and check that it reads back blank
    ///
    /// # Errors
    ///
    /// Returns `FlashError::EraseFailed` if any byte is still programmed after
    /// the erase.
    pub fn erase(&mut self, region: RegionId) -> Result<(), StoreError> {
        let base = self.config.base(region);
        self.flash.erase(base, self.config.region_size)?;

        if !self.verify_erased(region)? {
            crate::log_error!("Region {:?} not blank after erase", region);
            return Err(FlashError::EraseFailed.into());
        }

        Ok(())
    }

    /// Whether every byte of the region is erased
    ///
    /// Stricter than an `Empty` header: an erase interrupted after the header
    /// was reset can leave programmed bytes behind it.
    pub fn verify_erased(&mut self, region: RegionId) -> Result<bool, StoreError> {
        let base = self.config.base(region);
        Ok(self.flash.verify_erased(base, self.config.region_size)?)
    }

    /// Read and decode a region header
    pub fn read_header(&mut self, region: RegionId) -> Result<HeaderState, StoreError> {
        let mut buf = [0u8; HEADER_SIZE];
        self.read(region, 0, &mut buf)?;
        Ok(HeaderState::decode(&buf))
    }

    /// Advance a region header
    pub fn write_header(
        &mut self,
        region: RegionId,
        transition: HeaderTransition,
    ) -> Result<(), StoreError> {
        self.write_verified(region, 0, &transition.encode())
    }

    /// Flash interface reference
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Mutable flash interface reference (for testing)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the flash interface
    pub fn into_flash(self) -> F {
        self.flash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;
    use flash_eeprom_core::eeprom::RegionFlag;

    fn pair() -> RegionPair<MockFlash> {
        RegionPair::new(
            MockFlash::with_geometry(256, 64),
            StoreConfig::new(64, 128, 64),
        )
    }

    #[test]
    fn test_offsets_are_region_relative() {
        let mut regions = pair();

        regions.write(RegionId::A, 3, &[0x12]).unwrap();
        regions.write(RegionId::B, 3, &[0x34]).unwrap();

        assert_eq!(regions.flash().get_contents(67, 1), [0x12]);
        assert_eq!(regions.flash().get_contents(131, 1), [0x34]);

        let mut buf = [0u8; 1];
        regions.read(RegionId::B, 3, &mut buf).unwrap();
        assert_eq!(buf, [0x34]);
    }

    #[test]
    fn test_out_of_region_access_rejected() {
        let mut regions = pair();
        let mut buf = [0u8; 4];

        assert_eq!(
            regions.read(RegionId::A, 62, &mut buf),
            Err(FlashError::InvalidAddress.into())
        );
        assert_eq!(
            regions.write(RegionId::B, 64, &[0]),
            Err(FlashError::InvalidAddress.into())
        );
        assert_eq!(
            regions.read(RegionId::A, usize::MAX, &mut buf),
            Err(FlashError::InvalidAddress.into())
        );
    }

    #[test]
    fn test_header_round_trip() {
        let mut regions = pair();

        assert_eq!(regions.read_header(RegionId::A).unwrap(), HeaderState::EMPTY);

        regions
            .write_header(RegionId::A, HeaderTransition::Begin)
            .unwrap();
        assert_eq!(
            regions.read_header(RegionId::A).unwrap(),
            HeaderState::Flag(RegionFlag::Initializing)
        );

        regions
            .write_header(RegionId::A, HeaderTransition::Commit)
            .unwrap();
        assert_eq!(
            regions.read_header(RegionId::A).unwrap(),
            HeaderState::Flag(RegionFlag::Valid)
        );

        // Region B untouched
        assert_eq!(regions.read_header(RegionId::B).unwrap(), HeaderState::EMPTY);
    }

    #[test]
    fn test_write_verified_detects_stuck_bits() {
        let mut regions = pair();
        regions.flash_mut().stick_bits(64 + 40, 0x80);

        assert!(regions.write_verified(RegionId::A, 0, &[0x00; 39]).is_ok());
        assert_eq!(
            regions.write_verified(RegionId::A, 39, &[0x00; 4]),
            Err(StoreError::WriteVerifyFailed)
        );
    }

    #[test]
    fn test_erase_and_verify() {
        let mut regions = pair();

        regions.write(RegionId::A, 10, &[0x00]).unwrap();
        assert!(!regions.verify_erased(RegionId::A).unwrap());
        assert!(regions.verify_erased(RegionId::B).unwrap());

        regions.erase(RegionId::A).unwrap();
        assert!(regions.verify_erased(RegionId::A).unwrap());
        assert_eq!(regions.flash().get_erase_count(64), 1);
        assert_eq!(regions.flash().get_erase_count(128), 0);
    }

    #[test]
    fn test_erase_reports_power_loss() {
        let mut regions = pair();
        regions.write(RegionId::A, 0, &[0x00; 8]).unwrap();

        regions.flash_mut().simulate_power_loss_after(4);
        assert_eq!(
            regions.erase(RegionId::A),
            Err(FlashError::EraseFailed.into())
        );
    }
}
