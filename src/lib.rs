#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! flash_eeprom - Power-loss-safe EEPROM emulation on NOR flash
//!
//! This library stores small fixed-size variables, addressed by a 16-bit id,
//! in two erasable flash regions used in a ping-pong arrangement. Writes are
//! appended; a full region is compacted into the other one, which spreads
//! erase cycles over both. Region headers record each step of a compaction so
//! that power loss at any byte is recovered on the next `init()`.
//!
//! # Example
//!
//! ```ignore
//! use flash_eeprom::platform::mock::MockFlash;
//! use flash_eeprom::{DefaultFlashStore, StoreConfig};
//!
//! let mut store = DefaultFlashStore::new(MockFlash::new(), StoreConfig::default())?;
//! store.init()?;
//!
//! store.set(0x0001, &42u32.to_le_bytes())?;
//! let value = store.get(0x0001, 4)?;
//! ```

// Platform abstraction layer (flash access)
pub mod platform;

// Variable store and logging
pub mod core;

pub use crate::core::eeprom::{
    DefaultFlashStore, FlashStore, Payload, RegionId, StoreConfig, StoreError, StoreStats,
};
pub use platform::{FlashError, FlashInterface, PlatformError};
