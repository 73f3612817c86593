//! Core store functionality
//!
//! This module contains the flash-backed variable store and the logging
//! infrastructure it reports through.

pub mod eeprom;
pub mod logging;
