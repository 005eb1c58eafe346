mod common;

use anyhow::Result;
use common::{assert_close, entry, ledger_with, EPSILON};
use proptest::prelude::*;
use tabsplit::domain::{Cents, Ledger, ParticipantId, Share};

#[test]
fn test_pizza_and_salad_split() -> Result<()> {
    let (mut ledger, ids) = ledger_with(&["Alice", "Bob"])?;
    let pizza = ledger.add_item("Pizza", 2000)?;
    let salad = ledger.add_item("Salad", 1000)?;
    ledger.toggle_participation(pizza.id, ids[0])?;
    ledger.toggle_participation(pizza.id, ids[1])?;
    ledger.toggle_participation(salad.id, ids[0])?;
    ledger.set_surcharge(400)?;

    let settlement = ledger.compute_settlement();

    let alice = entry(&settlement, "Alice");
    assert_eq!(alice.total_owed, 2200.0);
    assert_eq!(alice.surcharge_share, 200.0);
    assert_eq!(alice.line_items.len(), 2);
    assert_eq!(alice.line_items[0].item_name, "Pizza");
    assert_eq!(alice.line_items[0].share, 1000.0);
    assert_eq!(alice.line_items[1].item_name, "Salad");
    assert_eq!(alice.line_items[1].share, 1000.0);

    let bob = entry(&settlement, "Bob");
    assert_eq!(bob.total_owed, 1200.0);
    assert_eq!(bob.line_items.len(), 1);

    Ok(())
}

#[test]
fn test_unassigned_item_is_charged_to_nobody() -> Result<()> {
    let (mut ledger, _) = ledger_with(&["Alice", "Bob", "Cara"])?;
    ledger.add_item("Coffee", 900)?;
    ledger.set_surcharge(0)?;

    let settlement = ledger.compute_settlement();

    assert_eq!(settlement.len(), 3);
    for e in &settlement {
        assert_eq!(e.total_owed, 0.0);
        assert!(e.line_items.is_empty());
    }

    Ok(())
}

#[test]
fn test_no_participants_no_division() -> Result<()> {
    let mut ledger = Ledger::new();
    let coffee = ledger.add_item("Coffee", 900)?;
    ledger.set_surcharge(300)?;

    assert!(ledger.compute_settlement().is_empty());
    assert!(ledger.item(coffee.id).is_some());

    Ok(())
}

#[test]
fn test_settlement_follows_participant_insertion_order() -> Result<()> {
    let (ledger, _) = ledger_with(&["Cara", "Alice", "Bob"])?;

    let names: Vec<String> = ledger
        .compute_settlement()
        .into_iter()
        .map(|e| e.participant)
        .collect();

    assert_eq!(names, vec!["Cara", "Alice", "Bob"]);
    Ok(())
}

#[test]
fn test_removed_participant_disappears_from_settlement() -> Result<()> {
    let (mut ledger, ids) = ledger_with(&["Alice", "Bob"])?;
    let pizza = ledger.add_item("Pizza", 2000)?;
    ledger.assign_all_current_participants(pizza.id)?;
    ledger.set_surcharge(400)?;

    ledger.remove_participant(ids[1]);
    let settlement = ledger.compute_settlement();

    assert_eq!(settlement.len(), 1);
    assert!(settlement.iter().all(|e| e.participant_id != ids[1]));
    // Alice now carries the whole pizza and the whole surcharge
    assert_eq!(settlement[0].total_owed, 2400.0);

    Ok(())
}

#[test]
fn test_compute_is_pure() -> Result<()> {
    let (mut ledger, ids) = ledger_with(&["Alice", "Bob"])?;
    let pizza = ledger.add_item("Pizza", 2000)?;
    ledger.toggle_participation(pizza.id, ids[0])?;

    let first = ledger.compute_settlement();
    let second = ledger.compute_settlement();

    assert_eq!(first, second);
    assert_eq!(ledger.item(pizza.id).unwrap().participants(), &[ids[0]]);
    Ok(())
}

#[test]
fn test_rejected_item_leaves_ledger_unchanged() -> Result<()> {
    let (mut ledger, _) = ledger_with(&["Alice"])?;
    ledger.add_item("Pizza", 2000)?;

    assert!(ledger.add_item("Water", 0).is_err());
    assert!(ledger.add_item("Water", -500).is_err());
    assert!(ledger.add_item("Water", -500).is_err());

    assert_eq!(ledger.items().len(), 1);
    Ok(())
}

/// A generated bill: amounts in cents, plus a bitmask of who shares each item
fn build_ledger(
    people: usize,
    items: &[(Cents, u8)],
    surcharge: Cents,
) -> (Ledger, Vec<ParticipantId>) {
    let mut ledger = Ledger::new();
    let ids: Vec<ParticipantId> = (0..people)
        .map(|i| ledger.add_participant(&format!("P{}", i)).unwrap().id)
        .collect();

    for (n, (amount, mask)) in items.iter().enumerate() {
        let item = ledger.add_item(&format!("Item {}", n), *amount).unwrap();
        for (bit, id) in ids.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                ledger.toggle_participation(item.id, *id).unwrap();
            }
        }
    }
    ledger.set_surcharge(surcharge).unwrap();

    (ledger, ids)
}

proptest! {
    #[test]
    fn test_allocated_cost_is_conserved(
        people in 0usize..=6,
        items in prop::collection::vec((1i64..100_000, any::<u8>()), 0..10),
        surcharge in 0i64..50_000,
    ) {
        let (ledger, _) = build_ledger(people, &items, surcharge);
        let settlement = ledger.compute_settlement();

        let allocated: Cents = ledger
            .items()
            .iter()
            .filter(|i| !i.is_unassigned())
            .map(|i| i.amount_cents)
            .sum();
        let charged: Share = settlement.iter().map(|e| e.items_total()).sum();

        prop_assert_eq!(settlement.len(), people);
        prop_assert!((charged - allocated as Share).abs() < EPSILON);
    }

    #[test]
    fn test_surcharge_split_by_headcount(
        people in 1usize..=6,
        surcharge in 0i64..1_000_000,
    ) {
        let (ledger, _) = build_ledger(people, &[], surcharge);
        let settlement = ledger.compute_settlement();

        let expected = surcharge as Share / people as Share;
        for e in &settlement {
            prop_assert_eq!(e.surcharge_share, expected);
            prop_assert_eq!(e.total_owed, expected);
        }
        let total: Share = settlement.iter().map(|e| e.surcharge_share).sum();
        prop_assert!((total - surcharge as Share).abs() < EPSILON);
    }

    #[test]
    fn test_total_is_items_plus_surcharge(
        people in 1usize..=6,
        items in prop::collection::vec((1i64..100_000, any::<u8>()), 0..10),
        surcharge in 0i64..50_000,
    ) {
        let (ledger, _) = build_ledger(people, &items, surcharge);

        for e in ledger.compute_settlement() {
            prop_assert!((e.total_owed - (e.items_total() + e.surcharge_share)).abs() < EPSILON);
        }
    }

    #[test]
    fn test_toggle_is_its_own_inverse(
        people in 1usize..=6,
        mask in any::<u8>(),
        pick in 0usize..6,
    ) {
        let (mut ledger, ids) = build_ledger(people, &[(1000, mask)], 0);
        let item_id = ledger.items()[0].id;
        let participant = ids[pick % people];
        let before = ledger.items()[0].participants().to_vec();

        ledger.toggle_participation(item_id, participant).unwrap();
        ledger.toggle_participation(item_id, participant).unwrap();

        let mut after = ledger.items()[0].participants().to_vec();
        let mut before_sorted = before.clone();
        after.sort();
        before_sorted.sort();
        prop_assert_eq!(after, before_sorted);
    }

    #[test]
    fn test_remove_participant_cascades(
        people in 1usize..=6,
        items in prop::collection::vec((1i64..100_000, any::<u8>()), 1..10),
        pick in 0usize..6,
    ) {
        let (mut ledger, ids) = build_ledger(people, &items, 100);
        let removed = ids[pick % people];

        prop_assert!(ledger.remove_participant(removed).is_some());

        prop_assert_eq!(ledger.items().len(), items.len());
        for item in ledger.items() {
            prop_assert!(!item.is_shared_by(removed));
        }
        for e in ledger.compute_settlement() {
            prop_assert_ne!(e.participant_id, removed);
        }
    }
}

#[test]
fn test_shares_sum_for_three_way_split() -> Result<()> {
    let (mut ledger, _) = ledger_with(&["Alice", "Bob", "Cara"])?;
    let cake = ledger.add_item("Cake", 1000)?;
    ledger.assign_all_current_participants(cake.id)?;
    ledger.set_surcharge(100)?;

    let settlement = ledger.compute_settlement();
    let total: Share = settlement.iter().map(|e| e.total_owed).sum();

    assert_close(total, 1100.0);
    assert_close(settlement[0].total_owed, 1100.0 / 3.0);
    Ok(())
}
