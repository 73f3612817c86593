//! Platform abstraction layer
//!
//! This module provides the hardware abstraction the store is built on. All
//! device-specific code stays behind [`FlashInterface`].

pub mod error;
pub mod traits;

#[cfg(feature = "embedded-storage")]
pub mod nor_flash;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{FlashError, PlatformError, Result};
pub use traits::FlashInterface;
