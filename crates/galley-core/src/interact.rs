//! Player interaction: nearby-interactable tracking and the request queue.
//!
//! The arbiter tracks at most one nearby interactable — the most recent
//! trigger-zone entry not yet exited, fed in by presentation as the player
//! moves. Interaction itself is edge-triggered: `request_interact` enqueues a
//! discrete request, and each queued request is consumed exactly once during
//! the interaction phase of the step it is drained in. Holding a button down
//! therefore performs one action per press, not one per frame.

use crate::id::{ItemId, NpcId, StationId};
use crate::station::StationError;
use crate::vec2::Vec2;

/// Anything the player can stand next to and interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interactable {
    Station(StationId),
    Npc(NpcId),
    /// Index into the kitchen's ingredient crate list.
    IngredientCrate(usize),
    /// Index into the kitchen's trash can list.
    TrashCan(usize),
    /// Index into the kitchen's plate rack list.
    PlateRack(usize),
}

/// Why an interaction request did nothing. Absorbed at the engine boundary
/// as a logged no-op — expected play-flow conditions, never failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InteractError {
    #[error("nothing nearby to interact with")]
    NothingNearby,
    #[error("item is not eligible here")]
    NotEligible,
    #[error("no free slot")]
    NoFreeSlot,
    #[error("hands are full")]
    HandsFull,
    #[error("hands are empty")]
    HandsEmpty,
    #[error("held item does not match the open order")]
    WrongOrder,
}

impl From<StationError> for InteractError {
    fn from(e: StationError) -> Self {
        match e {
            StationError::NotEligible => InteractError::NotEligible,
            StationError::NoFreeSlot => InteractError::NoFreeSlot,
        }
    }
}

/// The player: one pair of hands and a floor position (driven by
/// presentation; the core never moves the player itself).
#[derive(Debug, Default, Clone)]
pub struct Player {
    held: Option<ItemId>,
    pub position: Vec2,
}

impl Player {
    pub fn held(&self) -> Option<ItemId> {
        self.held
    }

    pub fn hands_free(&self) -> bool {
        self.held.is_none()
    }

    pub(crate) fn take_held(&mut self) -> Option<ItemId> {
        self.held.take()
    }

    pub(crate) fn hold(&mut self, item: ItemId) {
        self.held = Some(item);
    }
}

/// Nearby-interactable tracker plus the edge-triggered request queue.
#[derive(Debug, Default)]
pub struct InteractionArbiter {
    current: Option<Interactable>,
    pending: u32,
}

impl InteractionArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The player's trigger zone entered `target`. Overwrites any previous
    /// candidate: most recent entry wins.
    pub fn zone_entered(&mut self, target: Interactable) {
        self.current = Some(target);
    }

    /// The player's trigger zone left `target`. Only clears the candidate if
    /// it is still the current one; a stale exit is ignored.
    pub fn zone_exited(&mut self, target: Interactable) {
        if self.current == Some(target) {
            self.current = None;
        }
    }

    /// The interactable the player would act on right now.
    pub fn current(&self) -> Option<Interactable> {
        self.current
    }

    /// Queue one interaction request for the next interaction phase.
    pub fn request_interact(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Take all queued requests, leaving the queue empty.
    pub(crate) fn drain_requests(&mut self) -> u32 {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn station() -> StationId {
        let mut sm = SlotMap::<StationId, ()>::with_key();
        sm.insert(())
    }

    #[test]
    fn most_recent_entry_wins() {
        let a = Interactable::Station(station());
        let b = Interactable::TrashCan(0);
        let mut arb = InteractionArbiter::new();
        arb.zone_entered(a);
        arb.zone_entered(b);
        assert_eq!(arb.current(), Some(b));
    }

    #[test]
    fn stale_exit_is_ignored() {
        let a = Interactable::Station(station());
        let b = Interactable::TrashCan(0);
        let mut arb = InteractionArbiter::new();
        arb.zone_entered(a);
        arb.zone_entered(b);
        // Leaving the overwritten zone must not clear the current one.
        arb.zone_exited(a);
        assert_eq!(arb.current(), Some(b));
        arb.zone_exited(b);
        assert_eq!(arb.current(), None);
    }

    #[test]
    fn requests_drain_once() {
        let mut arb = InteractionArbiter::new();
        arb.request_interact();
        arb.request_interact();
        assert_eq!(arb.drain_requests(), 2);
        assert_eq!(arb.drain_requests(), 0);
    }

    #[test]
    fn player_hands() {
        let mut p = Player::default();
        assert!(p.hands_free());
        let mut sm = SlotMap::<ItemId, ()>::with_key();
        let id = sm.insert(());
        p.hold(id);
        assert_eq!(p.held(), Some(id));
        assert_eq!(p.take_held(), Some(id));
        assert!(p.hands_free());
    }
}
