//! Region header codec
//!
//! The header holds a region's lifecycle flag as a 3-byte pattern. Each
//! successive flag clears more bits than the one before it, so every forward
//! transition is a plain flash write and never needs an erase:
//!
//! ```text
//! Empty         FF FF FF
//! Initializing  AA FF FF
//! Valid         AA AA FF
//! Invalid       AA AA AA
//! ```
//!
//! A write interrupted by power loss can leave a byte half programmed. Any
//! pattern outside the four above decodes as [`HeaderState::Unrecognized`].

use super::layout::HEADER_SIZE;

/// Byte value of an unprogrammed header byte
const ERASED: u8 = 0xFF;

/// Byte value of a programmed header byte
const MARKED: u8 = 0xAA;

/// Region lifecycle flag, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionFlag {
    /// Erased region, no data
    Empty,
    /// Region is receiving a copy of the live data set
    Initializing,
    /// Region holds the live data set
    Valid,
    /// Region has been superseded and awaits erasure
    Invalid,
}

impl RegionFlag {
    /// On-flash pattern of this flag
    pub const fn pattern(self) -> [u8; HEADER_SIZE] {
        match self {
            RegionFlag::Empty => [ERASED, ERASED, ERASED],
            RegionFlag::Initializing => [MARKED, ERASED, ERASED],
            RegionFlag::Valid => [MARKED, MARKED, ERASED],
            RegionFlag::Invalid => [MARKED, MARKED, MARKED],
        }
    }

    /// Whether `transition` moves this flag forward
    pub fn can_apply(self, transition: HeaderTransition) -> bool {
        transition.target() > self
    }
}

/// Decoded region header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderState {
    /// One of the four defined patterns
    Flag(RegionFlag),
    /// Any other pattern; the region must be erased before use
    Unrecognized,
}

impl HeaderState {
    /// Header of a freshly erased region
    pub const EMPTY: HeaderState = HeaderState::Flag(RegionFlag::Empty);

    /// Decode a header
    ///
    /// Returns [`HeaderState::Unrecognized`] for any pattern other than the
    /// four defined ones, including buffers shorter than [`HEADER_SIZE`].
    ///
    /// # Example
    ///
    /// ```
    /// use flash_eeprom_core::eeprom::{HeaderState, RegionFlag};
    ///
    /// assert_eq!(
    ///     HeaderState::decode(&[0xAA, 0xAA, 0xFF]),
    ///     HeaderState::Flag(RegionFlag::Valid)
    /// );
    /// assert_eq!(HeaderState::decode(&[0xAA, 0xEF, 0xFF]), HeaderState::Unrecognized);
    /// ```
    pub fn decode(buf: &[u8]) -> Self {
        let Some(raw) = buf.get(..HEADER_SIZE) else {
            return HeaderState::Unrecognized;
        };

        [
            RegionFlag::Empty,
            RegionFlag::Initializing,
            RegionFlag::Valid,
            RegionFlag::Invalid,
        ]
        .into_iter()
        .find(|flag| flag.pattern()[..] == *raw)
        .map_or(HeaderState::Unrecognized, HeaderState::Flag)
    }
}

/// Forward header transition
///
/// There is no transition to [`RegionFlag::Empty`]; only a region erase
/// goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderTransition {
    /// Mark a region as receiving a copy (`Initializing`)
    Begin,
    /// Mark a region as holding the live data set (`Valid`)
    Commit,
    /// Mark a region as superseded (`Invalid`)
    Retire,
}

impl HeaderTransition {
    /// Flag after this transition
    pub const fn target(self) -> RegionFlag {
        match self {
            HeaderTransition::Begin => RegionFlag::Initializing,
            HeaderTransition::Commit => RegionFlag::Valid,
            HeaderTransition::Retire => RegionFlag::Invalid,
        }
    }

    /// Bytes to program for this transition
    ///
    /// The full target pattern is written. Bytes already programmed by an
    /// earlier transition are rewritten with the same value, which leaves
    /// them unchanged.
    pub const fn encode(self) -> [u8; HEADER_SIZE] {
        self.target().pattern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS: [RegionFlag; 4] = [
        RegionFlag::Empty,
        RegionFlag::Initializing,
        RegionFlag::Valid,
        RegionFlag::Invalid,
    ];

    #[test]
    fn test_decode_defined_patterns() {
        for flag in FLAGS {
            assert_eq!(HeaderState::decode(&flag.pattern()), HeaderState::Flag(flag));
        }
    }

    #[test]
    fn test_decode_partial_patterns() {
        // Half-programmed first byte of Empty -> Initializing
        assert_eq!(HeaderState::decode(&[0xEF, 0xFF, 0xFF]), HeaderState::Unrecognized);
        // Torn erase that reset only the first byte of Invalid
        assert_eq!(HeaderState::decode(&[0xFF, 0xAA, 0xAA]), HeaderState::Unrecognized);
        // Arbitrary garbage
        assert_eq!(HeaderState::decode(&[0x00, 0x00, 0x00]), HeaderState::Unrecognized);
        assert_eq!(HeaderState::decode(&[0xAA, 0xFF, 0xAA]), HeaderState::Unrecognized);
    }

    #[test]
    fn test_decode_short_buffer() {
        assert_eq!(HeaderState::decode(&[0xAA, 0xAA]), HeaderState::Unrecognized);
        assert_eq!(HeaderState::decode(&[]), HeaderState::Unrecognized);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        assert_eq!(
            HeaderState::decode(&[0xAA, 0xFF, 0xFF, 0x00]),
            HeaderState::Flag(RegionFlag::Initializing)
        );
    }

    #[test]
    fn test_patterns_only_clear_bits() {
        // Every later pattern must be reachable from every earlier one by
        // clearing bits only
        for (i, earlier) in FLAGS.iter().enumerate() {
            for later in &FLAGS[i..] {
                let from = earlier.pattern();
                let to = later.pattern();
                for (a, b) in from.iter().zip(to.iter()) {
                    assert_eq!(a & b, *b, "{:?} -> {:?}", earlier, later);
                }
            }
        }
    }

    #[test]
    fn test_transition_targets() {
        assert_eq!(HeaderTransition::Begin.target(), RegionFlag::Initializing);
        assert_eq!(HeaderTransition::Commit.target(), RegionFlag::Valid);
        assert_eq!(HeaderTransition::Retire.target(), RegionFlag::Invalid);
        assert_eq!(HeaderTransition::Commit.encode(), [0xAA, 0xAA, 0xFF]);
    }

    #[test]
    fn test_transition_programmed_over_current_flag() {
        // Programming a forward transition over the current pattern (1 -> 0
        // only) yields exactly the target pattern
        for flag in FLAGS {
            for transition in [
                HeaderTransition::Begin,
                HeaderTransition::Commit,
                HeaderTransition::Retire,
            ] {
                if !flag.can_apply(transition) {
                    continue;
                }
                let current = flag.pattern();
                let written = transition.encode();
                let mut result = [0u8; HEADER_SIZE];
                for i in 0..HEADER_SIZE {
                    result[i] = current[i] & written[i];
                }
                assert_eq!(HeaderState::decode(&result), HeaderState::Flag(transition.target()));
            }
        }
    }

    #[test]
    fn test_can_apply_forward_only() {
        assert!(RegionFlag::Empty.can_apply(HeaderTransition::Begin));
        assert!(RegionFlag::Empty.can_apply(HeaderTransition::Commit));
        assert!(RegionFlag::Initializing.can_apply(HeaderTransition::Commit));
        assert!(RegionFlag::Valid.can_apply(HeaderTransition::Retire));
        assert!(!RegionFlag::Valid.can_apply(HeaderTransition::Begin));
        assert!(!RegionFlag::Valid.can_apply(HeaderTransition::Commit));
        assert!(!RegionFlag::Invalid.can_apply(HeaderTransition::Commit));
    }
}
