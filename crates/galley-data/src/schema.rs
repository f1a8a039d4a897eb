//! Serde data file structs for kitchen content definitions.
//!
//! These structs define the on-disk format for items, recipes, and the
//! kitchen layout. They are deserialized from RON, JSON, or TOML data files
//! and then resolved into engine types by the loader.

use serde::Deserialize;

/// A 2D position in a data file, in world units.
pub type PositionData = (f64, f64);

// ===========================================================================
// Items
// ===========================================================================

/// An item template definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub cuttable: bool,
    #[serde(default)]
    pub washable: bool,
    #[serde(default)]
    pub cookable: bool,
    #[serde(default)]
    pub is_plate: bool,
    /// Cutting this item also makes it cookable.
    #[serde(default)]
    pub cookable_after_cut: bool,
    #[serde(default)]
    pub signatures: SignatureSetData,
}

/// Per-visual-state signature names. An absent entry means the item presents
/// no signature in that state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureSetData {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub washed: Option<String>,
    #[serde(default)]
    pub cut: Option<String>,
    #[serde(default)]
    pub cooked: Option<String>,
}

/// Wrapper for TOML item files, where the list lives under an `items` key.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file. Declaration order is match order.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    /// Signature names the stove contents must present, one per slot.
    pub signatures: Vec<String>,
    pub product: String,
    pub plated_product: String,
}

// ===========================================================================
// Layout
// ===========================================================================

/// The kitchen floor plan and service parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutData {
    pub stations: Vec<StationData>,
    #[serde(default)]
    pub endpoints: Vec<PositionData>,
    pub npc: NpcData,
    #[serde(default = "default_failure_timeout")]
    pub stove_failure_timeout: u64,
    #[serde(default)]
    pub crates: Vec<CrateData>,
    #[serde(default)]
    pub trash_cans: Vec<PositionData>,
    #[serde(default)]
    pub plate_racks: Vec<PlateRackData>,
    /// Item handed to the player when a delivered dish is consumed.
    #[serde(default)]
    pub dirty_plate: Option<String>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub strategy: Option<StrategyData>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKindData {
    CuttingBoard,
    Stove,
    WashingStation,
}

/// A station instance in the layout.
#[derive(Debug, Clone, Deserialize)]
pub struct StationData {
    pub kind: StationKindData,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    pub duration: u64,
    pub slot_anchors: Vec<PositionData>,
    /// Item that replaces a finished wash, by name.
    #[serde(default)]
    pub output: Option<String>,
}

/// Customer spawn parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct NpcData {
    pub spawn_interval: u64,
    pub spawn_position: PositionData,
    pub speed: f64,
    pub waypoints: Vec<PositionData>,
}

/// An ingredient crate in the layout.
#[derive(Debug, Clone, Deserialize)]
pub struct CrateData {
    pub item: String,
    pub position: PositionData,
}

/// A plate rack in the layout, pre-stocked with one plate per slot.
#[derive(Debug, Clone, Deserialize)]
pub struct PlateRackData {
    pub plate: String,
    pub slots: Vec<PositionData>,
}

/// Time-stepping strategy selection.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyData {
    Tick,
    Delta { fixed_timestep: u64 },
}

fn default_capacity() -> usize {
    1
}

fn default_failure_timeout() -> u64 {
    60
}

fn default_event_capacity() -> usize {
    1024
}
