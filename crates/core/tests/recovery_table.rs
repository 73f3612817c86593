//! Exhaustive checks of the region state machine
//!
//! Applies every resolution to a simulated pair of headers and checks the
//! outcome for all 25 combinations of header states.

use flash_eeprom_core::eeprom::{resolve, HeaderState, RegionFlag, RegionId, RepairAction};

const STATES: [HeaderState; 5] = [
    HeaderState::Flag(RegionFlag::Empty),
    HeaderState::Flag(RegionFlag::Initializing),
    HeaderState::Flag(RegionFlag::Valid),
    HeaderState::Flag(RegionFlag::Invalid),
    HeaderState::Unrecognized,
];

/// Apply repair actions to a pair of header states
fn apply(mut headers: [HeaderState; 2], actions: &[RepairAction]) -> [HeaderState; 2] {
    for action in actions {
        match *action {
            RepairAction::Erase(region) => {
                headers[region.index()] = HeaderState::Flag(RegionFlag::Empty);
            }
            RepairAction::Promote(region) => {
                let current = headers[region.index()];
                assert!(
                    matches!(
                        current,
                        HeaderState::Flag(RegionFlag::Empty | RegionFlag::Initializing)
                    ),
                    "promotion over {:?} would need an erase first",
                    current
                );
                headers[region.index()] = HeaderState::Flag(RegionFlag::Valid);
            }
        }
    }
    headers
}

#[test]
fn every_combination_settles() {
    for a in STATES {
        for b in STATES {
            let resolution = resolve(a, b);
            let settled = apply([a, b], &resolution.actions);

            let winner = resolution.authoritative;
            assert_eq!(
                settled[winner.index()],
                HeaderState::Flag(RegionFlag::Valid),
                "({:?}, {:?}) authoritative region not valid",
                a,
                b
            );
            assert_eq!(
                settled[winner.other().index()],
                HeaderState::Flag(RegionFlag::Empty),
                "({:?}, {:?}) other region not empty",
                a,
                b
            );
        }
    }
}

#[test]
fn resolution_is_idempotent() {
    for a in STATES {
        for b in STATES {
            let first = resolve(a, b);
            let settled = apply([a, b], &first.actions);

            let second = resolve(settled[0], settled[1]);
            assert!(second.is_clean(), "({:?}, {:?}) not settled", a, b);
            assert_eq!(second.authoritative, first.authoritative);
        }
    }
}

#[test]
fn valid_region_is_never_erased() {
    for other in STATES {
        let resolution = resolve(HeaderState::Flag(RegionFlag::Valid), other);
        assert_eq!(resolution.authoritative, RegionId::A);
        assert!(!resolution.actions.contains(&RepairAction::Erase(RegionId::A)));

        if other != HeaderState::Flag(RegionFlag::Valid) {
            let resolution = resolve(other, HeaderState::Flag(RegionFlag::Valid));
            assert_eq!(resolution.authoritative, RegionId::B);
            assert!(!resolution.actions.contains(&RepairAction::Erase(RegionId::B)));
        }
    }
}

#[test]
fn completed_copy_is_promoted() {
    let partners = [
        HeaderState::Flag(RegionFlag::Empty),
        HeaderState::Flag(RegionFlag::Invalid),
        HeaderState::Unrecognized,
    ];

    for partner in partners {
        let resolution = resolve(HeaderState::Flag(RegionFlag::Initializing), partner);
        assert_eq!(resolution.authoritative, RegionId::A);
        assert_eq!(
            resolution.actions.last(),
            Some(&RepairAction::Promote(RegionId::A))
        );
        assert!(!resolution.actions.contains(&RepairAction::Erase(RegionId::A)));

        let resolution = resolve(partner, HeaderState::Flag(RegionFlag::Initializing));
        assert_eq!(resolution.authoritative, RegionId::B);
        assert_eq!(
            resolution.actions.last(),
            Some(&RepairAction::Promote(RegionId::B))
        );
        assert!(!resolution.actions.contains(&RepairAction::Erase(RegionId::B)));
    }
}

#[test]
fn erases_precede_promotion() {
    for a in STATES {
        for b in STATES {
            let resolution = resolve(a, b);
            let promotions = resolution
                .actions
                .iter()
                .filter(|action| matches!(action, RepairAction::Promote(_)))
                .count();
            assert!(promotions <= 1);

            if let Some(position) = resolution
                .actions
                .iter()
                .position(|action| matches!(action, RepairAction::Promote(_)))
            {
                assert_eq!(position, resolution.actions.len() - 1);
            }
        }
    }
}
