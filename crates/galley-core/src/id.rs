use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a live item instance in the kitchen.
    pub struct ItemId;

    /// Identifies a processing station instance (cutting board, stove, washing station).
    pub struct StationId;

    /// Identifies a live NPC instance.
    pub struct NpcId;
}

/// Identifies an item template in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Identifies a recipe in the registry. Declaration order doubles as
/// match-evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a visual signature used for recipe set-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureId(pub u32);

/// Identifies a seating endpoint in the fixed endpoint registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub u32);
