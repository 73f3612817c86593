//! flash_eeprom_core - Pure no_std logic for flash-backed EEPROM emulation
//!
//! This crate contains the parts of the variable store that never touch flash,
//! so they can be tested on host without any platform or feature flags.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` on business logic
//! - **Pure no_std**: No std library dependencies
//! - **Byte-oriented codecs**: Bounds-checked slicing, never struct reinterpretation
//!
//! # Modules
//!
//! - [`eeprom`]: Region geometry, record and header codecs, crash-recovery table

#![no_std]

pub mod eeprom;
