//! Flash-backed variable store (EEPROM emulation)
//!
//! This module provides byte-addressable, rewritable variable storage on top of
//! block-erasable flash, using two regions in a ping-pong arrangement for wear
//! leveling and power-loss recovery.
//!
//! Flash-independent types (codecs, geometry, recovery table) are provided by
//! `flash_eeprom_core::eeprom`.

pub mod error;
pub mod region;
pub mod store;
pub mod table;


// Re-export core types
pub use flash_eeprom_core::eeprom::{
    capacity, resolve, ConfigError, HeaderState, HeaderTransition, Record, RegionFlag, RegionId,
    RepairAction, Resolution, StoreConfig, DEFAULT_PAYLOAD_SIZE, DEFAULT_TABLE_SIZE, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
pub use error::StoreError;
pub use region::RegionPair;
pub use store::{DefaultFlashStore, FlashStore, Payload, StoreStats};
pub use table::{scan, LookupTable, ScanResult};
