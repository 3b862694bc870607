use super::*;
use proptest::prelude::*;

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

fn safe_address() -> Address {
    Address::repeat_byte(0x5a)
}

fn registry(owners: &[u8], threshold: u64) -> OwnerRegistry {
    OwnerRegistry::new(
        safe_address(),
        owners.iter().copied().map(addr).collect(),
        threshold,
        PredecessorPolicy::Sorted,
    )
    .expect("registry")
}

#[test]
fn remove_middle_owner_uses_sorted_predecessor() {
    let registry = registry(&[0xcc, 0xaa, 0xbb], 2);
    let change = registry.remove_owner(addr(0xbb), None).expect("remove");
    assert_eq!(
        change,
        OwnerChange::RemoveOwner {
            prev_owner: addr(0xaa),
            owner: addr(0xbb),
            threshold: 2,
        }
    );
}

#[test]
fn remove_smallest_owner_points_at_sentinel() {
    let before = registry(&[0xaa, 0xbb, 0xcc], 2);
    let add = before.add_owner(addr(0xdd), Some(3)).expect("add");
    assert_eq!(
        add,
        OwnerChange::AddOwner {
            owner: addr(0xdd),
            threshold: 3,
        }
    );
    // Once executed the contract links the new owner in at the head.
    let registry = registry(&[0xdd, 0xaa, 0xbb, 0xcc], 3);

    let change = registry.remove_owner(addr(0xaa), None).expect("remove");
    match change {
        OwnerChange::RemoveOwner {
            prev_owner,
            threshold,
            ..
        } => {
            assert_eq!(prev_owner, SENTINEL_OWNERS);
            assert_eq!(threshold, 3);
        }
        other => panic!("unexpected change: {other:?}"),
    }
}

#[test]
fn remove_missing_owner_fails() {
    let registry = registry(&[0xaa, 0xbb], 1);
    let err = registry.remove_owner(addr(0xee), None).expect_err("must fail");
    assert!(matches!(err, SafeError::OwnerNotFound(owner) if owner == addr(0xee)));
}

#[test]
fn remove_below_threshold_fails() {
    let registry = registry(&[0xaa, 0xbb], 2);
    let err = registry.remove_owner(addr(0xaa), None).expect_err("must fail");
    assert!(matches!(
        err,
        SafeError::ThresholdViolation {
            threshold: 2,
            owners: 1
        }
    ));

    // Lowering the threshold in the same call is allowed.
    registry.remove_owner(addr(0xaa), Some(1)).expect("remove with threshold");
}

#[test]
fn add_existing_owner_fails() {
    let registry = registry(&[0xaa, 0xbb], 1);
    let err = registry.add_owner(addr(0xbb), None).expect_err("must fail");
    assert!(matches!(err, SafeError::OwnerExists(_)));
}

#[test]
fn add_owner_keeps_threshold_when_omitted() {
    let registry = registry(&[0xaa, 0xbb], 2);
    let change = registry.add_owner(addr(0xcc), None).expect("add");
    assert_eq!(
        change,
        OwnerChange::AddOwner {
            owner: addr(0xcc),
            threshold: 2
        }
    );
}

#[test]
fn add_sentinel_or_zero_is_rejected() {
    let registry = registry(&[0xaa], 1);
    assert!(matches!(
        registry.add_owner(SENTINEL_OWNERS, None),
        Err(SafeError::InvalidOwner(_))
    ));
    assert!(matches!(
        registry.add_owner(Address::ZERO, None),
        Err(SafeError::InvalidOwner(_))
    ));
}

#[test]
fn swap_checks_both_sides() {
    let registry = registry(&[0xaa, 0xbb, 0xcc], 2);
    assert!(matches!(
        registry.swap_owner(addr(0xee), addr(0xdd)),
        Err(SafeError::OwnerNotFound(_))
    ));
    assert!(matches!(
        registry.swap_owner(addr(0xaa), addr(0xbb)),
        Err(SafeError::OwnerExists(_))
    ));
    let change = registry.swap_owner(addr(0xcc), addr(0xdd)).expect("swap");
    assert_eq!(
        change,
        OwnerChange::SwapOwner {
            prev_owner: addr(0xbb),
            old_owner: addr(0xcc),
            new_owner: addr(0xdd),
        }
    );
}

#[test]
fn on_chain_policy_follows_insertion_order() {
    let registry = OwnerRegistry::new(
        safe_address(),
        vec![addr(0xcc), addr(0xaa), addr(0xbb)],
        1,
        PredecessorPolicy::OnChain,
    )
    .expect("registry");
    assert_eq!(registry.predecessor(&addr(0xaa)).expect("prev"), addr(0xcc));
    assert_eq!(registry.predecessor(&addr(0xcc)).expect("prev"), SENTINEL_OWNERS);
}

#[test]
fn strict_policy_rejects_disagreeing_views() {
    let registry = OwnerRegistry::new(
        safe_address(),
        vec![addr(0xcc), addr(0xaa), addr(0xbb)],
        1,
        PredecessorPolicy::Strict,
    )
    .expect("registry");
    let err = registry.remove_owner(addr(0xaa), None).expect_err("must fail");
    assert!(matches!(err, SafeError::PredecessorMismatch { .. }));

    // 0xbb is preceded by 0xaa in both orders.
    registry.remove_owner(addr(0xbb), None).expect("agreeing views");
}

#[test]
fn duplicate_owner_list_is_rejected() {
    let err = OwnerRegistry::new(
        safe_address(),
        vec![addr(1), addr(1)],
        1,
        PredecessorPolicy::Sorted,
    )
    .expect_err("must fail");
    assert!(matches!(err, SafeError::OwnerExists(_)));
}

#[test]
fn are_owners_requires_every_address() {
    let registry = registry(&[0xaa, 0xbb], 1);
    assert!(registry.are_owners(&[addr(0xaa), addr(0xbb)]));
    assert!(!registry.are_owners(&[addr(0xaa), addr(0xcc)]));
}

#[test]
fn calldata_targets_owner_manager_methods() {
    let change = OwnerChange::RemoveOwner {
        prev_owner: SENTINEL_OWNERS,
        owner: addr(0xaa),
        threshold: 1,
    };
    let data = change.calldata();
    assert_eq!(&data[..4], &[0xf8, 0xdc, 0x5d, 0xd9]);
    assert_eq!(change.method(), "removeOwner");
}

fn owner_set() -> impl Strategy<Value = Vec<Address>> {
    proptest::collection::btree_set(any::<[u8; 20]>(), 1..8)
        .prop_map(|set| set.into_iter().map(Address::from).collect())
}

proptest! {
    #[test]
    fn sorted_predecessor_is_previous_lowercase_hex(owners in owner_set(), pick in any::<prop::sample::Index>()) {
        let registry = OwnerRegistry::new(
            safe_address(),
            owners.clone(),
            1,
            PredecessorPolicy::Sorted,
        ).expect("registry");
        let target = owners[pick.index(owners.len())];

        let mut sorted: Vec<String> = owners.iter().map(lower_hex).collect();
        sorted.sort();
        let position = sorted.iter().position(|hex| *hex == lower_hex(&target)).expect("present");
        let expected = if position == 0 {
            lower_hex(&SENTINEL_OWNERS)
        } else {
            sorted[position - 1].clone()
        };

        let prev = registry.predecessor(&target).expect("predecessor");
        prop_assert_eq!(lower_hex(&prev), expected);
    }

    #[test]
    fn change_threshold_accepts_exactly_one_to_owner_count(owners in owner_set(), threshold in 0u64..12) {
        let registry = OwnerRegistry::new(
            safe_address(),
            owners.clone(),
            1,
            PredecessorPolicy::Sorted,
        ).expect("registry");
        let result = registry.change_threshold(threshold);
        let valid = threshold >= 1 && threshold as usize <= owners.len();
        prop_assert_eq!(result.is_ok(), valid);
        if !valid {
            let is_violation = matches!(result, Err(SafeError::ThresholdViolation { .. }));
            prop_assert!(is_violation);
        }
    }
}
