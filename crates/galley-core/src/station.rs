//! Processing stations: cutting board, stove, washing station.
//!
//! All three share one structure: a fixed-capacity ordered slot array, a
//! single shared countdown timer, and a kind-specific transformation applied
//! when the timer crosses zero. The timer is per station, not per slot: it is
//! re-armed to the full duration whenever a new item is placed and gates the
//! most recently placed item. Items already mid-process when another arrives
//! do not get an independent countdown — intentional source behavior, kept
//! pending a product decision on per-item timers.

use crate::fixed::{Fixed64, Ticks};
use crate::id::{ItemId, ItemTypeId, StationId};
use crate::item::{AttachPoint, Item};
use crate::vec2::Vec2;
use slotmap::SlotMap;

/// What a station does to an item when its timer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StationKind {
    CuttingBoard,
    Stove,
    WashingStation,
}

/// Construction-time configuration for one station instance.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub kind: StationKind,
    pub capacity: usize,
    /// Ticks from placement to completion.
    pub duration: Ticks,
    /// One anchor per slot; items snapped to a slot track its anchor.
    /// Padded/truncated to `capacity` at construction.
    pub slot_anchors: Vec<Vec2>,
    /// Washing station only: template of the clean replacement instance.
    pub output_template: Option<ItemTypeId>,
}

/// Why a station refused an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StationError {
    /// Capability flag false, or the corresponding state flag already set.
    #[error("item is not eligible for this station")]
    NotEligible,
    /// All slots occupied.
    #[error("no free slot")]
    NoFreeSlot,
}

/// A station instance. Slot occupancy and the shared timer live here; the
/// cross-cutting completion effects (state transition, recipe evaluation,
/// clean-item replacement) are driven by the engine, which owns the item
/// arena.
#[derive(Debug)]
pub struct Station {
    id: StationId,
    pub kind: StationKind,
    duration: Ticks,
    slot_anchors: Vec<Vec2>,
    slots: Vec<Option<ItemId>>,
    /// Remaining ticks; 0 means idle.
    timer: Ticks,
    /// The item the shared timer currently gates (most recently placed).
    active: Option<ItemId>,
    /// Stove only: a no-recipe failure sequence is pending; suppresses
    /// re-triggering until the scheduled clear fires.
    pub(crate) failure_pending: bool,
    /// Washing station only: clean replacement template.
    pub(crate) output_template: Option<ItemTypeId>,
}

impl Station {
    pub fn new(id: StationId, config: StationConfig) -> Self {
        let capacity = config.capacity.max(1);
        let mut anchors = config.slot_anchors;
        anchors.resize(capacity, Vec2::ZERO);
        Self {
            id,
            kind: config.kind,
            duration: config.duration,
            slot_anchors: anchors,
            slots: vec![None; capacity],
            timer: 0,
            active: None,
            failure_pending: false,
            output_template: config.output_template,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn duration(&self) -> Ticks {
        self.duration
    }

    pub fn slot_anchor(&self, slot: usize) -> Vec2 {
        self.slot_anchors.get(slot).copied().unwrap_or(Vec2::ZERO)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// True iff any slot is unoccupied.
    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        !self.has_free_slot()
    }

    /// Occupants in ascending slot order.
    pub fn occupants(&self) -> impl Iterator<Item = (usize, ItemId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|id| (i, id)))
    }

    pub fn item_in_slot(&self, slot: usize) -> Option<ItemId> {
        self.slots.get(slot).copied().flatten()
    }

    fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Can this station still process the item (capability true, state flag
    /// not yet set)?
    pub fn accepts(&self, item: &Item) -> bool {
        match self.kind {
            StationKind::CuttingBoard => item.is_cuttable() && !item.is_cut(),
            StationKind::Stove => item.is_cookable() && !item.is_cooked(),
            StationKind::WashingStation => item.is_washable() && !item.is_washed(),
        }
    }

    /// The completion predicate for this station's transformation.
    ///
    /// For the washing station this is "nothing left to wash": the clean
    /// replacement instance spawned on completion is typically not washable
    /// itself and still has to count as done so it can be picked up.
    pub fn is_completed(&self, item: &Item) -> bool {
        match self.kind {
            StationKind::CuttingBoard => item.is_cut(),
            StationKind::Stove => item.is_cooked(),
            StationKind::WashingStation => item.is_washed() || !item.is_washable(),
        }
    }

    /// First slot-order occupant satisfying `pred`, without removing it.
    /// Removal is a separate, explicit [`Station::release_slot`] call.
    pub fn extract_first(
        &self,
        items: &SlotMap<ItemId, Item>,
        pred: impl Fn(&Item) -> bool,
    ) -> Option<ItemId> {
        self.occupants()
            .find(|&(_, id)| items.get(id).is_some_and(&pred))
            .map(|(_, id)| id)
    }

    /// Progress of the shared timer as a 0..1 ratio, or `None` when idle.
    /// Presentation polls this (UI-signal contract).
    pub fn progress(&self) -> Option<Fixed64> {
        if self.active.is_none() || self.duration == 0 {
            return None;
        }
        let elapsed = self.duration - self.timer;
        Some(Fixed64::from_num(elapsed) / Fixed64::from_num(self.duration))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Accept an item into the first free slot (ascending index), snap it to
    /// that slot's anchor, and arm the shared timer to the full duration.
    ///
    /// Re-validates both eligibility and capacity even though the arbiter is
    /// expected to have pre-checked; failures are no-ops for the caller.
    pub fn begin_processing(
        &mut self,
        item_id: ItemId,
        item: &mut Item,
    ) -> Result<usize, StationError> {
        if !self.accepts(item) {
            tracing::debug!(station = ?self.kind, "begin_processing: not eligible");
            return Err(StationError::NotEligible);
        }
        let Some(slot) = self.first_free_slot() else {
            tracing::debug!(station = ?self.kind, "begin_processing: no free slot");
            return Err(StationError::NoFreeSlot);
        };
        self.slots[slot] = Some(item_id);
        item.snap_to(AttachPoint::StationSlot {
            station: self.id,
            slot,
        });
        item.position = self.slot_anchor(slot);
        self.timer = self.duration;
        self.active = Some(item_id);
        Ok(slot)
    }

    /// Place an already-transformed item into a slot without arming the
    /// timer (finished products, freshly cleaned dishes).
    pub(crate) fn place_in_slot(&mut self, slot: usize, item_id: ItemId, item: &mut Item) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(item_id);
            item.snap_to(AttachPoint::StationSlot {
                station: self.id,
                slot,
            });
            item.position = self.slot_anchor(slot);
        }
    }

    /// Advance the shared timer by one tick. Returns the gated item when the
    /// timer crosses zero this tick; the engine then applies the transform.
    ///
    /// The timer only counts down while an occupant exists.
    pub fn tick_timer(&mut self) -> Option<ItemId> {
        if self.timer == 0 || self.occupied_count() == 0 {
            return None;
        }
        self.timer -= 1;
        if self.timer == 0 {
            return self.active.take();
        }
        None
    }

    /// Remove an item from whichever slot holds it. Cancels the pending
    /// transition if that item was the one being timed — the only
    /// cancellation path in the engine.
    pub fn release_slot(&mut self, item_id: ItemId) -> bool {
        for entry in &mut self.slots {
            if *entry == Some(item_id) {
                *entry = None;
                if self.active == Some(item_id) {
                    self.active = None;
                    self.timer = 0;
                }
                return true;
            }
        }
        false
    }

    /// Empty every slot, returning the evicted items. Resets the timer and
    /// the stove failure latch.
    pub(crate) fn clear_all(&mut self) -> Vec<ItemId> {
        let evicted: Vec<ItemId> = self.slots.iter().filter_map(|s| *s).collect();
        for entry in &mut self.slots {
            *entry = None;
        }
        self.timer = 0;
        self.active = None;
        self.failure_pending = false;
        evicted
    }

    /// Swap the occupant of `slot` for a new item (washing-station
    /// replacement). Returns the displaced occupant.
    pub(crate) fn replace_in_slot(
        &mut self,
        slot: usize,
        new_item: ItemId,
        item: &mut Item,
    ) -> Option<ItemId> {
        let old = self.slots.get(slot).copied().flatten();
        self.place_in_slot(slot, new_item, item);
        if self.active == old {
            self.active = None;
        }
        old
    }

    /// Which slot currently holds `item_id`, if any.
    pub fn slot_of(&self, item_id: ItemId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(item_id))
    }

    /// Remaining ticks on the shared timer (0 when idle). State-hash input.
    pub fn timer_remaining(&self) -> Ticks {
        self.timer
    }

    /// Stove only: whether a no-recipe failure sequence is pending.
    pub fn is_failure_pending(&self) -> bool {
        self.failure_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemTypeId;
    use crate::registry::ItemTemplateDef;
    use slotmap::SlotMap;

    fn cuttable_def() -> ItemTemplateDef {
        ItemTemplateDef {
            name: "carrot".into(),
            cuttable: true,
            washable: false,
            cookable: false,
            is_plate: false,
            can_become_cookable_after_cut: false,
            product_of: None,
            plated_product_of: None,
            signatures: [None; 4],
        }
    }

    fn arena_with(n: usize) -> (SlotMap<ItemId, Item>, Vec<ItemId>) {
        let def = cuttable_def();
        let mut items = SlotMap::with_key();
        let ids = (0..n)
            .map(|_| items.insert(Item::from_template(ItemTypeId(0), &def, Vec2::ZERO)))
            .collect();
        (items, ids)
    }

    fn board(capacity: usize, duration: Ticks) -> Station {
        let mut stations: SlotMap<StationId, Station> = SlotMap::with_key();
        let key = stations.insert_with_key(|k| {
            Station::new(
                k,
                StationConfig {
                    kind: StationKind::CuttingBoard,
                    capacity,
                    duration,
                    slot_anchors: Vec::new(),
                    output_template: None,
                },
            )
        });
        stations.remove(key).unwrap()
    }

    #[test]
    fn begin_then_complete_after_duration() {
        let (mut items, ids) = arena_with(1);
        let mut st = board(1, 3);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        assert_eq!(st.tick_timer(), None);
        assert_eq!(st.tick_timer(), None);
        // Third tick crosses zero.
        assert_eq!(st.tick_timer(), Some(ids[0]));
        // Timer idle afterwards.
        assert_eq!(st.tick_timer(), None);
    }

    #[test]
    fn ineligible_item_leaves_slot_empty() {
        let def = ItemTemplateDef {
            cuttable: false,
            ..cuttable_def()
        };
        let mut items: SlotMap<ItemId, Item> = SlotMap::with_key();
        let id = items.insert(Item::from_template(ItemTypeId(0), &def, Vec2::ZERO));
        let mut st = board(1, 3);
        assert_eq!(
            st.begin_processing(id, &mut items[id]),
            Err(StationError::NotEligible)
        );
        assert_eq!(st.occupied_count(), 0);
    }

    #[test]
    fn full_station_rejects_with_no_free_slot() {
        let (mut items, ids) = arena_with(2);
        let mut st = board(1, 3);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        assert_eq!(
            st.begin_processing(ids[1], &mut items[ids[1]]),
            Err(StationError::NoFreeSlot)
        );
    }

    #[test]
    fn placement_rearms_shared_timer() {
        let (mut items, ids) = arena_with(2);
        let mut st = board(2, 5);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        st.tick_timer();
        st.tick_timer();
        // New placement re-arms to the full duration and gates the new item.
        st.begin_processing(ids[1], &mut items[ids[1]]).unwrap();
        for _ in 0..4 {
            assert_eq!(st.tick_timer(), None);
        }
        assert_eq!(st.tick_timer(), Some(ids[1]));
    }

    #[test]
    fn release_cancels_pending_transition() {
        let (mut items, ids) = arena_with(1);
        let mut st = board(1, 3);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        assert!(st.release_slot(ids[0]));
        assert_eq!(st.occupied_count(), 0);
        // Timer was zeroed; nothing ever completes.
        for _ in 0..10 {
            assert_eq!(st.tick_timer(), None);
        }
    }

    #[test]
    fn release_of_absent_item_is_noop() {
        let (_items, ids) = arena_with(1);
        let mut st = board(1, 3);
        assert!(!st.release_slot(ids[0]));
    }

    #[test]
    fn slots_fill_in_ascending_order() {
        let (mut items, ids) = arena_with(3);
        let mut st = board(3, 1);
        assert_eq!(st.begin_processing(ids[0], &mut items[ids[0]]), Ok(0));
        assert_eq!(st.begin_processing(ids[1], &mut items[ids[1]]), Ok(1));
        st.release_slot(ids[0]);
        // Freed slot 0 is reused before slot 2.
        assert_eq!(st.begin_processing(ids[2], &mut items[ids[2]]), Ok(0));
    }

    #[test]
    fn extract_first_returns_slot_order_match() {
        let (mut items, ids) = arena_with(2);
        let mut st = board(2, 1);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        st.begin_processing(ids[1], &mut items[ids[1]]).unwrap();
        items[ids[1]].cut();
        assert_eq!(st.extract_first(&items, Item::is_cut), Some(ids[1]));
        items[ids[0]].cut();
        // Slot order, not completion order.
        assert_eq!(st.extract_first(&items, Item::is_cut), Some(ids[0]));
        // Non-removing: both still occupy slots.
        assert_eq!(st.occupied_count(), 2);
    }

    #[test]
    fn progress_ratio_advances() {
        let (mut items, ids) = arena_with(1);
        let mut st = board(1, 4);
        assert_eq!(st.progress(), None);
        st.begin_processing(ids[0], &mut items[ids[0]]).unwrap();
        assert_eq!(st.progress(), Some(Fixed64::ZERO));
        st.tick_timer();
        assert_eq!(st.progress(), Some(Fixed64::from_num(0.25)));
    }

    #[test]
    fn washing_counts_unwashable_occupant_as_done() {
        let sink = {
            let mut stations: SlotMap<StationId, Station> = SlotMap::with_key();
            let key = stations.insert_with_key(|k| {
                Station::new(
                    k,
                    StationConfig {
                        kind: StationKind::WashingStation,
                        capacity: 1,
                        duration: 4,
                        slot_anchors: Vec::new(),
                        output_template: Some(ItemTypeId(1)),
                    },
                )
            });
            stations.remove(key).unwrap()
        };

        // The clean replacement template: a plate with nothing to wash.
        let clean_def = ItemTemplateDef {
            name: "plate".into(),
            cuttable: false,
            washable: false,
            cookable: false,
            is_plate: true,
            can_become_cookable_after_cut: false,
            product_of: None,
            plated_product_of: None,
            signatures: [None; 4],
        };
        let clean = Item::from_template(ItemTypeId(1), &clean_def, Vec2::ZERO);
        assert!(!sink.accepts(&clean));
        assert!(sink.is_completed(&clean));

        // A washable item is only done once actually washed.
        let mut dirty_def = clean_def;
        dirty_def.washable = true;
        let mut dirty = Item::from_template(ItemTypeId(0), &dirty_def, Vec2::ZERO);
        assert!(sink.accepts(&dirty));
        assert!(!sink.is_completed(&dirty));
        dirty.wash();
        assert!(sink.is_completed(&dirty));
    }

    #[test]
    fn timer_holds_while_station_empty() {
        let mut st = board(1, 3);
        // No occupant: ticking does nothing even if somehow armed.
        assert_eq!(st.tick_timer(), None);
    }
}
