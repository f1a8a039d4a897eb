//! Stateful processable items: ingredients, plates, and finished dishes.
//!
//! An item is instantiated from an immutable registry template and carries
//! its own capability flags so operations can be validated without a
//! registry lookup. The processing flags (`cut`, `washed`, `cooked`) are
//! monotonic: once set they are never cleared by this engine.

use crate::id::{ItemTypeId, RecipeId, StationId};
use crate::registry::ItemTemplateDef;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// The representation an item currently shows, chosen by the highest-priority
/// true flag: cooked > cut > washed > raw. Exactly one at a time.
///
/// Also indexes the template's per-state signature table, so a cooked
/// ingredient matches recipes by its cooked signature, not its raw one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Raw = 0,
    Washed = 1,
    Cut = 2,
    Cooked = 3,
}

/// Where an item is currently snapped. At most one attachment at a time;
/// the station/arbiter exchange protocol enforces single ownership (the
/// item itself performs no check, matching the spawn contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachPoint {
    /// Occupying a station slot.
    StationSlot { station: StationId, slot: usize },
    /// Held by the player.
    PlayerHand,
}

/// A live item instance.
#[derive(Debug, Clone)]
pub struct Item {
    pub template: ItemTypeId,

    // Capabilities, copied from the template at spawn. `cookable` is the one
    // capability that can be granted after creation (by cutting).
    cuttable: bool,
    washable: bool,
    cookable: bool,
    is_plate: bool,
    can_become_cookable_after_cut: bool,

    // Recipe-result tags. Fixed at creation, classification only.
    product_of: Option<RecipeId>,
    plated_product_of: Option<RecipeId>,

    // Monotonic processing state.
    cut: bool,
    washed: bool,
    cooked: bool,

    attachment: Option<AttachPoint>,
    pub position: Vec2,
}

impl Item {
    /// Instantiate an item from its template (the spawn contract).
    pub fn from_template(template: ItemTypeId, def: &ItemTemplateDef, position: Vec2) -> Self {
        Self {
            template,
            cuttable: def.cuttable,
            washable: def.washable,
            cookable: def.cookable,
            is_plate: def.is_plate,
            can_become_cookable_after_cut: def.can_become_cookable_after_cut,
            product_of: def.product_of,
            plated_product_of: def.plated_product_of,
            cut: false,
            washed: false,
            cooked: false,
            attachment: None,
            position,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn is_cuttable(&self) -> bool {
        self.cuttable
    }

    pub fn is_washable(&self) -> bool {
        self.washable
    }

    pub fn is_cookable(&self) -> bool {
        self.cookable
    }

    pub fn is_plate(&self) -> bool {
        self.is_plate
    }

    pub fn is_cut(&self) -> bool {
        self.cut
    }

    pub fn is_washed(&self) -> bool {
        self.washed
    }

    pub fn is_cooked(&self) -> bool {
        self.cooked
    }

    /// The recipe this item is the raw finished dish of, if any.
    pub fn product_of(&self) -> Option<RecipeId> {
        self.product_of
    }

    /// The recipe this item is the plated (deliverable) dish of, if any.
    pub fn plated_product_of(&self) -> Option<RecipeId> {
        self.plated_product_of
    }

    /// Highest-priority true flag wins: cooked > cut > washed > raw.
    pub fn visual_state(&self) -> VisualState {
        if self.cooked {
            VisualState::Cooked
        } else if self.cut {
            VisualState::Cut
        } else if self.washed {
            VisualState::Washed
        } else {
            VisualState::Raw
        }
    }

    pub fn attachment(&self) -> Option<AttachPoint> {
        self.attachment
    }

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    /// Cut the item. Requires `cuttable && !cut`; otherwise a logged no-op.
    ///
    /// Cutting an item with `can_become_cookable_after_cut` additionally
    /// grants the `cookable` capability.
    ///
    /// Returns true if the state changed (callers refresh visuals on true).
    pub fn cut(&mut self) -> bool {
        if self.cuttable && !self.cut {
            self.cut = true;
            if self.can_become_cookable_after_cut {
                self.cookable = true;
            }
            true
        } else {
            tracing::debug!(already_cut = self.cut, "cut rejected");
            false
        }
    }

    /// Wash the item. Requires `washable && !washed`; otherwise a logged no-op.
    pub fn wash(&mut self) -> bool {
        if self.washable && !self.washed {
            self.washed = true;
            true
        } else {
            tracing::debug!(already_washed = self.washed, "wash rejected");
            false
        }
    }

    /// Cook the item. Requires `cookable && !cooked`; otherwise a logged no-op.
    pub fn cook(&mut self) -> bool {
        if self.cookable && !self.cooked {
            self.cooked = true;
            true
        } else {
            tracing::debug!(already_cooked = self.cooked, "cook rejected");
            false
        }
    }

    /// Snap the item to an attachment point. Unconditional: the caller is
    /// responsible for having released any previous owner first.
    pub fn snap_to(&mut self, point: AttachPoint) {
        self.attachment = Some(point);
    }

    /// Detach the item from its current owner.
    pub fn unsnap(&mut self) {
        self.attachment = None;
    }
}
