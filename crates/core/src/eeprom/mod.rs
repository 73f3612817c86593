//! EEPROM emulation types and utilities
//!
//! This module provides the flash-independent half of the variable store:
//! geometry and configuration, the record and region header codecs, and the
//! crash-recovery decision table. Flash access, the lookup table scan and the
//! store engine are in the root crate.

pub mod checksum;
pub mod header;
pub mod layout;
pub mod record;
pub mod recovery;

pub use checksum::{calculate_checksum, validate_checksum};
pub use header::{HeaderState, HeaderTransition, RegionFlag};
pub use layout::{
    capacity, record_offset, record_size, ConfigError, RegionId, StoreConfig, DEFAULT_PAYLOAD_SIZE,
    DEFAULT_REGION_A, DEFAULT_REGION_B, DEFAULT_REGION_SIZE, DEFAULT_TABLE_SIZE, HEADER_SIZE,
    MAX_PAYLOAD_SIZE, MAX_RECORD_SIZE, RECORD_OVERHEAD,
};
pub use record::{Record, RecordBytes, RecordStatus};
pub use recovery::{resolve, RepairAction, Resolution, MAX_REPAIR_ACTIONS};
