//! Station and service scenarios: shared-timer re-arming, stove fires,
//! washing replacement, and seat exhaustion.

use galley_core::engine::Kitchen;
use galley_core::event::EventKind;
use galley_core::id::StationId;
use galley_core::interact::Interactable;
use galley_core::test_utils::*;

fn interact_at(kitchen: &mut Kitchen, target: Interactable) {
    kitchen.zone_entered(target);
    kitchen.request_interact();
    kitchen.step();
    kitchen.zone_exited(target);
}

fn chop_held(kitchen: &mut Kitchen, board: StationId) {
    kitchen.zone_entered(Interactable::Station(board));
    kitchen.request_interact();
    kitchen.step();
    for _ in 0..TestKitchen::CUT_DURATION {
        kitchen.step();
    }
    kitchen.request_interact();
    kitchen.step();
    kitchen.zone_exited(Interactable::Station(board));
}

#[test]
fn second_placement_rearms_the_shared_timer() {
    let TestKitchen {
        mut kitchen,
        cutting_board,
        stove,
        onion,
        carrot,
        stew,
        ..
    } = small_kitchen();

    // First onion: chop, cook to completion. Half a stew matches nothing.
    kitchen.spawn_into_hand(onion).unwrap();
    chop_held(&mut kitchen, cutting_board);
    interact_at(&mut kitchen, Interactable::Station(stove));
    for _ in 0..TestKitchen::COOK_DURATION {
        kitchen.step();
    }
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::RecipeMatched), 0);

    // The carrot: placing it starts a full cook from scratch.
    kitchen.spawn_into_hand(carrot).unwrap();
    chop_held(&mut kitchen, cutting_board);
    interact_at(&mut kitchen, Interactable::Station(stove));

    for _ in 0..TestKitchen::COOK_DURATION - 1 {
        kitchen.step();
    }
    // One tick short of the full duration: nothing has matched yet.
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::RecipeMatched), 0);

    kitchen.step();
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::RecipeMatched), 1);

    // Onion and carrot collapsed into one stew in the first slot.
    let st = kitchen.station(stove).unwrap();
    assert_eq!(st.occupied_count(), 1);
    let (slot, product) = st.occupants().next().unwrap();
    assert_eq!(slot, 0);
    assert_eq!(kitchen.item(product).unwrap().template, stew);
}

#[test]
fn unmatched_full_stove_catches_fire_and_recovers() {
    let TestKitchen {
        mut kitchen,
        cutting_board,
        stove,
        meat,
        ..
    } = small_kitchen();

    // Two cooked meats match no recipe.
    for _ in 0..2 {
        kitchen.spawn_into_hand(meat).unwrap();
        chop_held(&mut kitchen, cutting_board);
        interact_at(&mut kitchen, Interactable::Station(stove));
        for _ in 0..TestKitchen::COOK_DURATION {
            kitchen.step();
        }
    }
    assert!(kitchen.station(stove).unwrap().is_failure_pending());
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::FireStarted), 1);

    // Interacting with a burning stove while empty-handed does nothing.
    kitchen.zone_entered(Interactable::Station(stove));
    kitchen.request_interact();
    kitchen.step();
    kitchen.zone_exited(Interactable::Station(stove));
    assert!(kitchen.player().hands_free());

    for _ in 0..TestKitchen::FAILURE_TIMEOUT + 1 {
        kitchen.step();
    }
    let st = kitchen.station(stove).unwrap();
    assert_eq!(st.occupied_count(), 0);
    assert!(!st.is_failure_pending());
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::StoveCleared), 1);
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::FireCleared), 1);
}

#[test]
fn washing_replaces_the_dirty_plate() {
    let TestKitchen {
        mut kitchen,
        sink,
        plate,
        dirty_plate,
        ..
    } = small_kitchen();

    let dirty = kitchen.spawn_into_hand(dirty_plate).unwrap();
    kitchen.zone_entered(Interactable::Station(sink));
    kitchen.request_interact();
    kitchen.step();
    for _ in 0..TestKitchen::WASH_DURATION {
        kitchen.step();
    }
    kitchen.request_interact();
    kitchen.step();
    kitchen.zone_exited(Interactable::Station(sink));

    // A fresh clean plate came out; the dirty one is gone.
    let clean = kitchen.player().held().unwrap();
    assert_ne!(clean, dirty);
    assert!(kitchen.item(dirty).is_none());
    assert_eq!(kitchen.item(clean).unwrap().template, plate);
    assert_eq!(kitchen.station(sink).unwrap().occupied_count(), 0);
}

#[test]
fn spawn_beats_skip_when_all_seats_are_taken() {
    let TestKitchen { mut kitchen, .. } = small_kitchen();

    // Two seats, beats at 20/40/60. The third beat finds no free seat.
    for _ in 0..70 {
        kitchen.step();
    }
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::NpcSpawned), 2);
    assert_eq!(kitchen.npc_ids().len(), 2);
    assert_eq!(kitchen.endpoints().occupied_count(), 2);
}

#[test]
fn unseated_customers_eventually_order() {
    let TestKitchen { mut kitchen, .. } = small_kitchen();

    for _ in 0..120 {
        kitchen.step();
    }
    // Both customers made it to a seat and placed an order.
    assert_eq!(kitchen.event_bus.total_emitted(EventKind::NpcSeated), 2);
    let orders: Vec<_> = kitchen
        .npc_ids()
        .iter()
        .filter_map(|&id| kitchen.npc(id).and_then(|n| n.order()))
        .collect();
    assert_eq!(orders.len(), 2);
}
