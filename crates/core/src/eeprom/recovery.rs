//! Region state machine
//!
//! Decides, from the two region headers alone, which region holds the live
//! data and which repairs must run before the store is usable. Every write or
//! erase the store performs leaves the pair of headers in a combination this
//! table resolves, so an interruption at any point is recovered on the next
//! initialization.
//!
//! Rules, in priority order:
//!
//! 1. An unrecognized header is erased and then treated as `Empty`.
//! 2. A single `Valid` region is authoritative; the other is erased unless
//!    already `Empty`. Two `Valid` regions: A wins.
//! 3. An `Initializing` region next to an `Empty`/`Invalid` one finished its
//!    copy: the other is erased and the `Initializing` region promoted. Two
//!    `Initializing` regions: A is promoted.
//! 4. `Valid` next to `Initializing`: the copy never completed, the
//!    `Initializing` region is erased (covered by rule 2).
//! 5. Both `Empty` or both `Invalid`: both are cleared and A is promoted.
//! 6. `Empty` next to `Invalid`: the `Invalid` region is erased and promoted.

use super::header::{HeaderState, RegionFlag};
use super::layout::RegionId;

/// Maximum number of repair actions a resolution can contain
pub const MAX_REPAIR_ACTIONS: usize = 4;

/// Repair step to run before the store is usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepairAction {
    /// Erase the region (header becomes `Empty`)
    Erase(RegionId),
    /// Program the region header to `Valid`
    Promote(RegionId),
}

/// Outcome of [`resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Region holding the live data once the actions have run
    pub authoritative: RegionId,
    /// Repairs, in execution order
    pub actions: heapless::Vec<RepairAction, MAX_REPAIR_ACTIONS>,
}

impl Resolution {
    /// True when no repair is needed
    pub fn is_clean(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Collects repair actions while the table is evaluated
#[derive(Default)]
struct Plan {
    actions: heapless::Vec<RepairAction, MAX_REPAIR_ACTIONS>,
}

impl Plan {
    /// Queue an erase, once per region
    fn erase(&mut self, region: RegionId) {
        let action = RepairAction::Erase(region);
        if !self.actions.contains(&action) {
            // At most two erases and one promotion are ever queued
            self.actions.push(action).ok();
        }
    }

    fn promote(&mut self, region: RegionId) {
        self.actions.push(RepairAction::Promote(region)).ok();
    }

    /// Rule 1: force unrecognized headers to `Empty`
    fn normalize(&mut self, region: RegionId, state: HeaderState) -> RegionFlag {
        match state {
            HeaderState::Flag(flag) => flag,
            HeaderState::Unrecognized => {
                self.erase(region);
                RegionFlag::Empty
            }
        }
    }
}

/// Resolve the authoritative region from both region headers
///
/// Total over every combination of header states, including combinations no
/// sequence of complete operations produces.
///
/// # Example
///
/// ```
/// use flash_eeprom_core::eeprom::{
///     resolve, HeaderState, RegionFlag, RegionId, RepairAction,
/// };
///
/// // Power lost after the old region was retired but before the new one
/// // was committed: the fully copied region wins.
/// let resolution = resolve(
///     HeaderState::Flag(RegionFlag::Invalid),
///     HeaderState::Flag(RegionFlag::Initializing),
/// );
/// assert_eq!(resolution.authoritative, RegionId::B);
/// assert_eq!(
///     resolution.actions.as_slice(),
///     &[RepairAction::Erase(RegionId::A), RepairAction::Promote(RegionId::B)]
/// );
/// ```
pub fn resolve(a: HeaderState, b: HeaderState) -> Resolution {
    use RegionFlag::{Empty, Initializing, Invalid, Valid};
    use RegionId::{A, B};

    let mut plan = Plan::default();
    let flag_a = plan.normalize(A, a);
    let flag_b = plan.normalize(B, b);

    let authoritative = match (flag_a, flag_b) {
        // Rules 2 and 4
        (Valid, Valid) => {
            plan.erase(B);
            A
        }
        (Valid, other) => {
            if other != Empty {
                plan.erase(B);
            }
            A
        }
        (other, Valid) => {
            if other != Empty {
                plan.erase(A);
            }
            B
        }

        // Rule 3
        (Initializing, Initializing) => {
            plan.erase(B);
            plan.promote(A);
            A
        }
        (Initializing, other) => {
            if other != Empty {
                plan.erase(B);
            }
            plan.promote(A);
            A
        }
        (other, Initializing) => {
            if other != Empty {
                plan.erase(A);
            }
            plan.promote(B);
            B
        }

        // Rule 5
        (Empty, Empty) => {
            plan.erase(A);
            plan.promote(A);
            A
        }
        (Invalid, Invalid) => {
            plan.erase(B);
            plan.erase(A);
            plan.promote(A);
            A
        }

        // Rule 6
        (Empty, Invalid) => {
            plan.erase(B);
            plan.promote(B);
            B
        }
        (Invalid, Empty) => {
            plan.erase(A);
            plan.promote(A);
            A
        }
    };

    Resolution {
        authoritative,
        actions: plan.actions,
    }
}
