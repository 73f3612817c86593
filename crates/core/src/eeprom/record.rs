//! Variable record codec
//!
//! A record is the append-only unit stored in a region:
//! `status | id (LE16) | payload (P bytes, zero padded) | checksum`.
//! Records are never modified in place; a newer record with the same id
//! shadows older ones.

use super::checksum::{calculate_checksum, validate_checksum};
use super::layout::{record_size, MAX_PAYLOAD_SIZE, MAX_RECORD_SIZE};

/// Serialized record buffer
pub type RecordBytes = heapless::Vec<u8, MAX_RECORD_SIZE>;

/// Raw status byte of a record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordStatus {
    /// Erased slot; marks the end of the written prefix
    Blank,
    /// Slot holds a written record
    Valid,
    /// Any other value (torn or corrupted status byte)
    Unknown(u8),
}

impl RecordStatus {
    /// Status byte of an erased slot
    pub const BLANK: u8 = 0xFF;

    /// Status byte of a written record
    pub const VALID: u8 = 0xAA;

    /// Classify a raw status byte
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            Self::BLANK => RecordStatus::Blank,
            Self::VALID => RecordStatus::Valid,
            other => RecordStatus::Unknown(other),
        }
    }
}

/// Decoded variable record
///
/// `P` is the fixed payload size chosen at build time.
///
/// # Example
///
/// ```
/// use flash_eeprom_core::eeprom::Record;
///
/// let record = Record::<8>::new(0x0102, &[1, 2, 3]).unwrap();
/// let bytes = record.encode();
/// assert_eq!(bytes.len(), Record::<8>::SIZE);
///
/// let decoded = Record::<8>::decode(&bytes).unwrap();
/// assert_eq!(decoded.id, 0x0102);
/// assert_eq!(&decoded.payload[..3], &[1, 2, 3]);
/// assert_eq!(&decoded.payload[3..], &[0; 5]);
/// ```
///
/// Payloads above [`MAX_PAYLOAD_SIZE`] are rejected at build time:
///
/// ```compile_fail
/// use flash_eeprom_core::eeprom::Record;
///
/// let record = Record::<253>::new(1, &[]).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<const P: usize> {
    /// Variable identifier
    pub id: u16,
    /// Payload, zero padded to `P` bytes
    pub payload: [u8; P],
}

impl<const P: usize> Record<P> {
    /// Size of an encoded record in bytes
    pub const SIZE: usize = record_size(P);

    /// Evaluated on use; fails the build when `P` exceeds [`MAX_PAYLOAD_SIZE`]
    const PAYLOAD_FITS: () = assert!(P <= MAX_PAYLOAD_SIZE, "payload size exceeds MAX_PAYLOAD_SIZE");

    /// Byte offset of the id within a record
    const ID_OFFSET: usize = 1;

    /// Byte offset of the payload within a record
    const PAYLOAD_OFFSET: usize = 3;

    /// Byte offset of the checksum within a record
    const CHECKSUM_OFFSET: usize = 3 + P;

    /// Create a record, zero padding `data` to `P` bytes
    ///
    /// Returns `None` if `data` is longer than `P`.
    pub fn new(id: u16, data: &[u8]) -> Option<Self> {
        let () = Self::PAYLOAD_FITS;
        if data.len() > P {
            return None;
        }

        let mut payload = [0u8; P];
        payload[..data.len()].copy_from_slice(data);
        Some(Self { id, payload })
    }

    /// Checksum of this record's id and payload
    pub fn checksum(&self) -> u8 {
        calculate_checksum(self.id, &self.payload)
    }

    /// Serialize to bytes with status set to valid
    pub fn encode(&self) -> RecordBytes {
        let () = Self::PAYLOAD_FITS;
        let mut buf = RecordBytes::new();
        // SIZE <= MAX_RECORD_SIZE, checked by PAYLOAD_FITS
        buf.push(RecordStatus::VALID).ok();
        buf.extend_from_slice(&self.id.to_le_bytes()).ok();
        buf.extend_from_slice(&self.payload).ok();
        buf.push(self.checksum()).ok();
        buf
    }

    /// Deserialize from bytes
    ///
    /// Returns `None` if `buf` is shorter than [`Self::SIZE`], the status byte
    /// is not valid, or the checksum does not match. Never panics, whatever
    /// the input.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let () = Self::PAYLOAD_FITS;
        let raw = buf.get(..Self::SIZE)?;

        if RecordStatus::from_byte(raw[0]) != RecordStatus::Valid {
            return None;
        }

        let id = u16::from_le_bytes([raw[Self::ID_OFFSET], raw[Self::ID_OFFSET + 1]]);

        let mut payload = [0u8; P];
        payload.copy_from_slice(&raw[Self::PAYLOAD_OFFSET..Self::CHECKSUM_OFFSET]);

        if !validate_checksum(id, &payload, raw[Self::CHECKSUM_OFFSET]) {
            return None;
        }

        Some(Self { id, payload })
    }

    /// Whether this record already stores `data` (compared zero padded)
    pub fn holds(&self, data: &[u8]) -> bool {
        data.len() <= P
            && self.payload[..data.len()] == *data
            && self.payload[data.len()..].iter().all(|&b| b == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let record = Record::<4>::new(0x1234, &[0xAA]).unwrap();
        let bytes = record.encode();

        assert_eq!(Record::<4>::SIZE, 8);
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes[0], RecordStatus::VALID);
        assert_eq!(&bytes[1..3], &[0x34, 0x12]);
        assert_eq!(&bytes[3..7], &[0xAA, 0, 0, 0]);
        // 0x34 + 0x12 + 0xAA = 0xF0, two's complement = 0x10
        assert_eq!(bytes[7], 0x10);
    }

    #[test]
    fn test_new_rejects_oversized_payload() {
        assert!(Record::<4>::new(1, &[0; 4]).is_some());
        assert!(Record::<4>::new(1, &[0; 5]).is_none());
    }

    #[test]
    fn test_largest_payload_encodes_whole_record() {
        let record = Record::<MAX_PAYLOAD_SIZE>::new(0xFFFF, &[0x5A; MAX_PAYLOAD_SIZE]).unwrap();
        let bytes = record.encode();

        assert_eq!(bytes.len(), MAX_RECORD_SIZE);
        assert_eq!(bytes[MAX_RECORD_SIZE - 1], record.checksum());
        assert_eq!(Record::<MAX_PAYLOAD_SIZE>::decode(&bytes), Some(record));
    }

    #[test]
    fn test_decode_blank_slot() {
        assert_eq!(Record::<4>::decode(&[0xFF; 8]), None);
    }

    #[test]
    fn test_decode_short_buffer() {
        let bytes = Record::<4>::new(1, &[1]).unwrap().encode();
        assert_eq!(Record::<4>::decode(&bytes[..7]), None);
        assert_eq!(Record::<4>::decode(&[]), None);
    }

    #[test]
    fn test_decode_bad_status() {
        let mut bytes = Record::<4>::new(1, &[1]).unwrap().encode();
        bytes[0] = 0x00;
        assert_eq!(Record::<4>::decode(&bytes), None);
    }

    #[test]
    fn test_decode_detects_payload_corruption() {
        let mut bytes = Record::<4>::new(1, &[0xAA]).unwrap().encode();
        bytes[3] ^= 0x01;
        assert_eq!(Record::<4>::decode(&bytes), None);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let record = Record::<4>::new(9, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&record.encode());
        assert_eq!(Record::<4>::decode(&buf), Some(record));
    }

    #[test]
    fn test_decode_garbage_never_panics() {
        let mut buf = [0u8; 8];
        for seed in 0..=255u8 {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = seed.wrapping_mul(31).wrapping_add(i as u8 * 17);
            }
            buf[0] = RecordStatus::VALID;
            // Either decodes consistently or is rejected; must not panic
            if let Some(record) = Record::<4>::decode(&buf) {
                assert_eq!(record.checksum(), buf[7]);
            }
        }
    }

    #[test]
    fn test_holds() {
        let record = Record::<4>::new(1, &[1, 2]).unwrap();
        assert!(record.holds(&[1, 2]));
        assert!(record.holds(&[1, 2, 0]));
        assert!(record.holds(&[1, 2, 0, 0]));
        assert!(!record.holds(&[1]));
        assert!(!record.holds(&[1, 2, 3]));
        assert!(!record.holds(&[1, 2, 0, 0, 0]));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(RecordStatus::from_byte(0xFF), RecordStatus::Blank);
        assert_eq!(RecordStatus::from_byte(0xAA), RecordStatus::Valid);
        assert_eq!(RecordStatus::from_byte(0xA8), RecordStatus::Unknown(0xA8));
    }
}
