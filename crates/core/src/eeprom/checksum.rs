//! Record checksum
//!
//! An 8-bit two's-complement checksum over a record's id and payload. It
//! detects torn and bit-flipped records; it does not correct them.

/// Calculate the checksum of a record
///
/// Returns the two's complement of the byte-wise sum (mod 256) of the
/// little-endian id bytes and every payload byte, so that the sum of id,
/// payload and checksum is zero.
///
/// # Example
///
/// ```
/// use flash_eeprom_core::eeprom::calculate_checksum;
///
/// // 0x01 + 0x00 + 0xAA = 0xAB, two's complement = 0x55
/// assert_eq!(calculate_checksum(1, &[0xAA]), 0x55);
/// ```
pub fn calculate_checksum(id: u16, payload: &[u8]) -> u8 {
    let sum = id
        .to_le_bytes()
        .iter()
        .chain(payload.iter())
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum.wrapping_neg()
}

/// Validate a record against its stored checksum
///
/// Returns `true` if the checksum matches.
pub fn validate_checksum(id: u16, payload: &[u8], checksum: u8) -> bool {
    calculate_checksum(id, payload) == checksum
}
