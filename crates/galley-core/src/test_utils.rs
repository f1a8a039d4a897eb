//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available both to this crate's unit tests and, via the `test-utils`
//! feature, to the integration-test crate.

use crate::engine::{CrateConfig, Kitchen, KitchenConfig, PlateRackConfig};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{ItemTypeId, RecipeId, StationId};
use crate::npc::NpcConfig;
use crate::registry::{ItemTemplateDef, Registry, RegistryBuilder};
use crate::sim::SimulationStrategy;
use crate::station::{StationConfig, StationKind};
use crate::vec2::Vec2;

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

fn blank(name: &str) -> ItemTemplateDef {
    ItemTemplateDef {
        name: name.to_string(),
        cuttable: false,
        washable: false,
        cookable: false,
        is_plate: false,
        can_become_cookable_after_cut: false,
        product_of: None,
        plated_product_of: None,
        signatures: [None; 4],
    }
}

/// A frozen registry for a two-recipe onion kitchen, plus the IDs tests need.
pub struct TestRegistry {
    pub registry: Registry,
    pub onion: ItemTypeId,
    pub meat: ItemTypeId,
    pub carrot: ItemTypeId,
    /// Clean plate: not washable, so it counts as clean from the start.
    pub plate: ItemTypeId,
    /// Handed back on delivery; washing replaces it with a clean `plate`.
    pub dirty_plate: ItemTypeId,
    pub soup: ItemTypeId,
    pub soup_plated: ItemTypeId,
    pub stew: ItemTypeId,
    pub stew_plated: ItemTypeId,
    pub onion_soup: RecipeId,
    pub carrot_stew: RecipeId,
}

/// Three ingredients, two recipes sized for a two-slot stove, and the plate
/// pair. Ingredients become cookable only after cutting, and present their
/// matching signature only in the cooked state. Each recipe wants two
/// distinct signatures, so a half-full stove can never match early.
pub fn onion_soup_registry() -> TestRegistry {
    let mut b = RegistryBuilder::new();
    let onion_cooked = b.register_signature("onion_cooked");
    let meat_cooked = b.register_signature("meat_cooked");
    let carrot_cooked = b.register_signature("carrot_cooked");

    let mut onion_def = blank("onion");
    onion_def.cuttable = true;
    onion_def.can_become_cookable_after_cut = true;
    onion_def.signatures[3] = Some(onion_cooked);
    let onion = b.register_template(onion_def).expect("register onion");

    let mut meat_def = blank("meat");
    meat_def.cuttable = true;
    meat_def.can_become_cookable_after_cut = true;
    meat_def.signatures[3] = Some(meat_cooked);
    let meat = b.register_template(meat_def).expect("register meat");

    let mut carrot_def = blank("carrot");
    carrot_def.cuttable = true;
    carrot_def.can_become_cookable_after_cut = true;
    carrot_def.signatures[3] = Some(carrot_cooked);
    let carrot = b.register_template(carrot_def).expect("register carrot");

    let mut plate_def = blank("plate");
    plate_def.is_plate = true;
    let plate = b.register_template(plate_def).expect("register plate");

    let mut dirty_def = blank("dirty_plate");
    dirty_def.is_plate = true;
    dirty_def.washable = true;
    let dirty_plate = b.register_template(dirty_def).expect("register dirty plate");

    let soup = b.register_template(blank("soup")).expect("register soup");
    let soup_plated = b
        .register_template(blank("soup_plated"))
        .expect("register plated soup");
    let stew = b.register_template(blank("stew")).expect("register stew");
    let stew_plated = b
        .register_template(blank("stew_plated"))
        .expect("register plated stew");

    let onion_soup = b
        .register_recipe("onion_soup", vec![onion_cooked, meat_cooked], soup, soup_plated)
        .expect("register onion_soup");
    let carrot_stew = b
        .register_recipe(
            "carrot_stew",
            vec![onion_cooked, carrot_cooked],
            stew,
            stew_plated,
        )
        .expect("register carrot_stew");

    TestRegistry {
        registry: b.build().expect("build registry"),
        onion,
        meat,
        carrot,
        plate,
        dirty_plate,
        soup,
        soup_plated,
        stew,
        stew_plated,
        onion_soup,
        carrot_stew,
    }
}

/// A fully furnished small kitchen: one cutting board, one two-slot stove,
/// one washing station, two seats, three ingredient crates, a trash can, and
/// a stocked plate rack.
pub struct TestKitchen {
    pub kitchen: Kitchen,
    pub cutting_board: StationId,
    pub stove: StationId,
    pub sink: StationId,
    pub onion: ItemTypeId,
    pub meat: ItemTypeId,
    pub carrot: ItemTypeId,
    pub plate: ItemTypeId,
    pub dirty_plate: ItemTypeId,
    pub soup: ItemTypeId,
    pub soup_plated: ItemTypeId,
    pub stew: ItemTypeId,
    pub stew_plated: ItemTypeId,
    pub onion_soup: RecipeId,
    pub carrot_stew: RecipeId,
}

impl TestKitchen {
    pub const CUT_DURATION: Ticks = 3;
    pub const COOK_DURATION: Ticks = 5;
    pub const WASH_DURATION: Ticks = 4;
    pub const FAILURE_TIMEOUT: Ticks = 10;
    pub const SPAWN_INTERVAL: Ticks = 20;
}

/// Build the standard test kitchen with the given seed.
pub fn small_kitchen_seeded(seed: u64) -> TestKitchen {
    let reg = onion_soup_registry();
    let config = KitchenConfig {
        stations: vec![
            StationConfig {
                kind: StationKind::CuttingBoard,
                capacity: 1,
                duration: TestKitchen::CUT_DURATION,
                slot_anchors: vec![Vec2::from_f64(1.0, 0.0)],
                output_template: None,
            },
            StationConfig {
                kind: StationKind::Stove,
                capacity: 2,
                duration: TestKitchen::COOK_DURATION,
                slot_anchors: vec![Vec2::from_f64(2.0, 0.0), Vec2::from_f64(2.5, 0.0)],
                output_template: None,
            },
            StationConfig {
                kind: StationKind::WashingStation,
                capacity: 1,
                duration: TestKitchen::WASH_DURATION,
                slot_anchors: vec![Vec2::from_f64(3.0, 0.0)],
                output_template: Some(reg.plate),
            },
        ],
        endpoints: vec![Vec2::from_f64(10.0, 4.0), Vec2::from_f64(10.0, 6.0)],
        npc: NpcConfig {
            spawn_interval: TestKitchen::SPAWN_INTERVAL,
            spawn_position: Vec2::from_f64(0.0, 5.0),
            speed: fixed(1.0),
            waypoints: vec![Vec2::from_f64(4.0, 5.0), Vec2::from_f64(8.0, 5.0)],
        },
        stove_failure_timeout: TestKitchen::FAILURE_TIMEOUT,
        crates: vec![
            CrateConfig {
                template: reg.onion,
                position: Vec2::from_f64(0.0, 1.0),
            },
            CrateConfig {
                template: reg.meat,
                position: Vec2::from_f64(0.0, 2.0),
            },
            CrateConfig {
                template: reg.carrot,
                position: Vec2::from_f64(0.0, 2.5),
            },
        ],
        trash_cans: vec![Vec2::from_f64(0.0, 3.0)],
        plate_racks: vec![PlateRackConfig {
            plate_template: reg.plate,
            slots: vec![Vec2::from_f64(4.0, 0.0), Vec2::from_f64(4.5, 0.0)],
        }],
        dirty_plate_template: Some(reg.dirty_plate),
        event_capacity: 256,
        seed,
        strategy: SimulationStrategy::Tick,
    };
    let kitchen = Kitchen::new(reg.registry, config);
    let ids = kitchen.station_ids();
    let (cutting_board, stove, sink) = (ids[0], ids[1], ids[2]);
    TestKitchen {
        kitchen,
        cutting_board,
        stove,
        sink,
        onion: reg.onion,
        meat: reg.meat,
        carrot: reg.carrot,
        plate: reg.plate,
        dirty_plate: reg.dirty_plate,
        soup: reg.soup,
        soup_plated: reg.soup_plated,
        stew: reg.stew,
        stew_plated: reg.stew_plated,
        onion_soup: reg.onion_soup,
        carrot_stew: reg.carrot_stew,
    }
}

/// The standard test kitchen with the default seed.
pub fn small_kitchen() -> TestKitchen {
    small_kitchen_seeded(42)
}
