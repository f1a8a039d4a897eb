//! The kitchen engine: owns all runtime state and orchestrates the
//! five-phase simulation pipeline.
//!
//! # Architecture
//!
//! The `Kitchen` owns:
//! - The frozen [`Registry`] of templates, recipes, and signatures
//! - Arena storage for live [`Item`]s, [`Station`]s, and [`Npc`]s
//! - The [`EndpointRegistry`], [`NpcSpawner`], [`Player`], and
//!   [`InteractionArbiter`]
//! - A [`Scheduler`] for deferred one-shots and an [`EventBus`]
//! - A [`SimState`] (tick counter, accumulator) and a [`SimulationStrategy`]
//!
//! # Five-Phase Pipeline
//!
//! Each `step()` runs:
//! 1. **Stations** -- shared timers tick; completed items transform; stoves
//!    run recipe evaluation and the no-match failure check
//! 2. **Scheduled** -- due one-shot actions fire independently
//! 3. **NPCs** -- spawner beat, movement, phase transitions
//! 4. **Interactions** -- queued player requests are consumed
//! 5. **Bookkeeping** -- attached items track their anchors, the tick counter
//!    advances, buffered events are delivered, the state hash is recomputed

use crate::endpoint::EndpointRegistry;
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{EndpointId, ItemId, ItemTypeId, NpcId, StationId};
use crate::interact::{InteractError, Interactable, InteractionArbiter, Player};
use crate::item::{AttachPoint, Item, VisualState};
use crate::npc::{Npc, NpcConfig, NpcSpawner};
use crate::recipe::RecipeMatcher;
use crate::registry::Registry;
use crate::rng::SimRng;
use crate::schedule::{ScheduledAction, Scheduler};
use crate::sim::{AdvanceResult, SimState, SimulationStrategy, StateHash};
use crate::station::{Station, StationConfig, StationKind};
use crate::vec2::Vec2;
use slotmap::{Key, SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// An ingredient crate: a fixture that hands out fresh instances of one
/// template on interaction.
#[derive(Debug, Clone)]
pub struct CrateConfig {
    pub template: ItemTypeId,
    pub position: Vec2,
}

/// A plate rack: pre-stocked clean plates, one per slot position. Plates can
/// be taken out and clean plates put back.
#[derive(Debug, Clone)]
pub struct PlateRackConfig {
    pub plate_template: ItemTypeId,
    pub slots: Vec<Vec2>,
}

/// Everything the kitchen layout declares at construction. The graph of
/// stations, fixtures, seats, and routes is fixed for the instance lifetime.
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    pub stations: Vec<StationConfig>,
    /// Seat positions; registration order is the reservation scan order.
    pub endpoints: Vec<Vec2>,
    pub npc: NpcConfig,
    /// Ticks between a stove failure triggering and its clear actions firing.
    pub stove_failure_timeout: Ticks,
    pub crates: Vec<CrateConfig>,
    pub trash_cans: Vec<Vec2>,
    pub plate_racks: Vec<PlateRackConfig>,
    /// Template handed back on delivery. `None` disables the dirty-plate
    /// return (logged once at construction).
    pub dirty_plate_template: Option<ItemTypeId>,
    pub event_capacity: usize,
    pub seed: u64,
    pub strategy: SimulationStrategy,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            endpoints: Vec::new(),
            npc: NpcConfig {
                spawn_interval: 0,
                spawn_position: Vec2::ZERO,
                speed: Fixed64::ZERO,
                waypoints: Vec::new(),
            },
            stove_failure_timeout: 60,
            crates: Vec::new(),
            trash_cans: Vec::new(),
            plate_racks: Vec::new(),
            dirty_plate_template: None,
            event_capacity: 256,
            seed: 0,
            strategy: SimulationStrategy::Tick,
        }
    }
}

#[derive(Debug)]
struct PlateRack {
    plate_template: ItemTypeId,
    positions: Vec<Vec2>,
    slots: Vec<Option<ItemId>>,
}

// ---------------------------------------------------------------------------
// Kitchen
// ---------------------------------------------------------------------------

/// The core simulation engine for one kitchen service.
#[derive(Debug)]
pub struct Kitchen {
    registry: Registry,

    items: SlotMap<ItemId, Item>,
    stations: SlotMap<StationId, Station>,
    /// Station processing order (construction order).
    station_order: Vec<StationId>,
    /// Per-stove recipe matcher state.
    matchers: SecondaryMap<StationId, RecipeMatcher>,

    endpoints: EndpointRegistry,
    npcs: SlotMap<NpcId, Npc>,
    /// NPC processing order (spawn order).
    npc_order: Vec<NpcId>,
    spawner: NpcSpawner,

    player: Player,
    arbiter: InteractionArbiter,

    crates: Vec<CrateConfig>,
    trash_cans: Vec<Vec2>,
    plate_racks: Vec<PlateRack>,
    dirty_plate_template: Option<ItemTypeId>,
    stove_failure_timeout: Ticks,

    scheduler: Scheduler,
    pub event_bus: EventBus,
    rng: SimRng,

    pub sim_state: SimState,
    strategy: SimulationStrategy,
    paused: bool,
    last_state_hash: u64,
}

impl Kitchen {
    /// Build a kitchen from a frozen registry and a layout config.
    ///
    /// Construction never fails: a fixture referencing a template the
    /// registry does not know is disabled for the instance lifetime with a
    /// logged warning, and the rest of the kitchen runs without it.
    pub fn new(registry: Registry, config: KitchenConfig) -> Self {
        let mut stations = SlotMap::with_key();
        let mut station_order = Vec::with_capacity(config.stations.len());
        let mut matchers = SecondaryMap::new();
        for station_config in config.stations {
            let kind = station_config.kind;
            let capacity = station_config.capacity.max(1);
            let id = stations.insert_with_key(|k| Station::new(k, station_config));
            if kind == StationKind::Stove {
                matchers.insert(id, RecipeMatcher::new(&registry, capacity));
            }
            station_order.push(id);
        }

        let crates: Vec<CrateConfig> = config
            .crates
            .into_iter()
            .filter(|c| {
                let known = registry.get_template(c.template).is_some();
                if !known {
                    tracing::warn!(template = ?c.template, "ingredient crate references unknown template; crate disabled");
                }
                known
            })
            .collect();

        let dirty_plate_template = config.dirty_plate_template.filter(|t| {
            let known = registry.get_template(*t).is_some();
            if !known {
                tracing::warn!(template = ?t, "dirty plate template unknown; dirty-plate return disabled");
            }
            known
        });
        if dirty_plate_template.is_none() {
            tracing::warn!("no dirty plate template configured; deliveries hand nothing back");
        }

        let spawner = NpcSpawner::new(config.npc, registry.recipe_count());

        let mut kitchen = Self {
            endpoints: EndpointRegistry::new(&config.endpoints),
            items: SlotMap::with_key(),
            stations,
            station_order,
            matchers,
            npcs: SlotMap::with_key(),
            npc_order: Vec::new(),
            spawner,
            player: Player::default(),
            arbiter: InteractionArbiter::new(),
            crates,
            trash_cans: config.trash_cans,
            plate_racks: Vec::new(),
            dirty_plate_template,
            stove_failure_timeout: config.stove_failure_timeout,
            scheduler: Scheduler::new(),
            event_bus: EventBus::new(config.event_capacity),
            rng: SimRng::new(config.seed),
            sim_state: SimState::new(),
            strategy: config.strategy,
            paused: false,
            last_state_hash: 0,
            registry,
        };

        // Pre-stock the plate racks.
        for rack_config in config.plate_racks {
            if kitchen.registry.get_template(rack_config.plate_template).is_none() {
                tracing::warn!(
                    template = ?rack_config.plate_template,
                    "plate rack references unknown template; rack disabled"
                );
                continue;
            }
            let mut slots = Vec::with_capacity(rack_config.slots.len());
            for &position in &rack_config.slots {
                slots.push(kitchen.spawn_item(rack_config.plate_template, position));
            }
            kitchen.plate_racks.push(PlateRack {
                plate_template: rack_config.plate_template,
                positions: rack_config.slots,
                slots,
            });
        }

        kitchen
    }

    // -----------------------------------------------------------------------
    // Spawning (the spawn contract)
    // -----------------------------------------------------------------------

    /// Instantiate an item from its registry template at `position`.
    /// `None` (logged) when the template is unknown.
    pub fn spawn_item(&mut self, template: ItemTypeId, position: Vec2) -> Option<ItemId> {
        let Some(def) = self.registry.get_template(template) else {
            tracing::warn!(?template, "spawn_item: unknown template");
            return None;
        };
        let item = Item::from_template(template, def, position);
        let id = self.items.insert(item);
        self.event_bus.emit(Event::ItemSpawned {
            item: id,
            template,
            tick: self.sim_state.tick,
        });
        Some(id)
    }

    /// Instantiate an item directly into the player's hands. Fails quietly
    /// when the hands are full or the template is unknown.
    pub fn spawn_into_hand(&mut self, template: ItemTypeId) -> Option<ItemId> {
        if !self.player.hands_free() {
            tracing::debug!("spawn_into_hand: hands are full");
            return None;
        }
        let position = self.player.position;
        let id = self.spawn_item(template, position)?;
        if let Some(item) = self.items.get_mut(id) {
            item.snap_to(AttachPoint::PlayerHand);
        }
        self.player.hold(id);
        Some(id)
    }

    fn destroy_item(&mut self, id: ItemId) {
        if self.items.remove(id).is_some() {
            self.event_bus.emit(Event::ItemDestroyed {
                item: id,
                tick: self.sim_state.tick,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Presentation inputs
    // -----------------------------------------------------------------------

    /// Presentation moves the player; held items follow during bookkeeping.
    pub fn set_player_position(&mut self, position: Vec2) {
        self.player.position = position;
    }

    /// The player's trigger zone entered `target` (most recent entry wins).
    pub fn zone_entered(&mut self, target: Interactable) {
        self.arbiter.zone_entered(target);
    }

    /// The player's trigger zone left `target`.
    pub fn zone_exited(&mut self, target: Interactable) {
        self.arbiter.zone_exited(target);
    }

    /// Queue one edge-triggered interaction request, consumed during the
    /// next interaction phase.
    pub fn request_interact(&mut self) {
        self.arbiter.request_interact();
    }

    /// Register a passive event listener.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance the simulation according to the configured strategy.
    ///
    /// - **Tick mode**: `dt` is ignored; exactly one step runs.
    /// - **Delta mode**: `dt` is accumulated; as many fixed steps run as fit.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        let mut result = AdvanceResult::default();

        match self.strategy.clone() {
            SimulationStrategy::Tick => {
                self.step_internal(&mut result);
            }
            SimulationStrategy::Delta { fixed_timestep } => {
                self.sim_state.accumulator += dt;
                let step_size = fixed_timestep.max(1);
                while self.sim_state.accumulator >= step_size {
                    self.sim_state.accumulator -= step_size;
                    self.step_internal(&mut result);
                }
            }
        }

        result
    }

    /// Run a single simulation step (convenience for tick mode).
    pub fn step(&mut self) -> AdvanceResult {
        self.advance(0)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        self.phase_stations();
        self.phase_scheduled();
        self.phase_npcs();
        self.phase_interactions();
        self.phase_bookkeeping();
        result.steps_run += 1;
    }

    // -----------------------------------------------------------------------
    // Phase 1: Stations
    // -----------------------------------------------------------------------

    fn phase_stations(&mut self) {
        let order = self.station_order.clone();
        for station_id in order {
            let Some(station) = self.stations.get_mut(station_id) else {
                continue;
            };
            let Some(done) = station.tick_timer() else {
                continue;
            };
            let kind = station.kind;
            match kind {
                StationKind::CuttingBoard => self.finish_cut(station_id, done),
                StationKind::WashingStation => self.finish_wash(station_id, done),
                StationKind::Stove => {
                    self.finish_cook(station_id, done);
                    self.evaluate_stove(station_id);
                }
            }
        }
    }

    fn finish_cut(&mut self, station: StationId, item_id: ItemId) {
        let tick = self.sim_state.tick;
        if let Some(item) = self.items.get_mut(item_id)
            && item.cut()
        {
            let state = item.visual_state();
            self.event_bus.emit(Event::ItemStateChanged {
                item: item_id,
                state,
                tick,
            });
            self.event_bus.emit(Event::ProcessingCompleted {
                station,
                item: item_id,
                tick,
            });
        }
    }

    fn finish_cook(&mut self, station: StationId, item_id: ItemId) {
        let tick = self.sim_state.tick;
        if let Some(item) = self.items.get_mut(item_id)
            && item.cook()
        {
            let state = item.visual_state();
            self.event_bus.emit(Event::ItemStateChanged {
                item: item_id,
                state,
                tick,
            });
            self.event_bus.emit(Event::ProcessingCompleted {
                station,
                item: item_id,
                tick,
            });
        }
    }

    /// Washing both sets the flag and, when the station has a replacement
    /// template, swaps the original for a freshly instantiated clean item in
    /// the same slot, destroying the original.
    fn finish_wash(&mut self, station_id: StationId, item_id: ItemId) {
        let tick = self.sim_state.tick;
        if let Some(item) = self.items.get_mut(item_id)
            && item.wash()
        {
            let state = item.visual_state();
            self.event_bus.emit(Event::ItemStateChanged {
                item: item_id,
                state,
                tick,
            });
            self.event_bus.emit(Event::ProcessingCompleted {
                station: station_id,
                item: item_id,
                tick,
            });
        }

        let Some(station) = self.stations.get(station_id) else {
            return;
        };
        let (Some(replacement), Some(slot)) = (station.output_template, station.slot_of(item_id))
        else {
            return;
        };
        let anchor = station.slot_anchor(slot);
        self.destroy_item(item_id);
        let Some(new_id) = self.spawn_item(replacement, anchor) else {
            // Unknown replacement template: the slot is simply left empty.
            if let Some(st) = self.stations.get_mut(station_id) {
                st.release_slot(item_id);
            }
            return;
        };
        if let (Some(st), Some(new_item)) =
            (self.stations.get_mut(station_id), self.items.get_mut(new_id))
        {
            st.replace_in_slot(slot, new_id, new_item);
        }
    }

    /// Recipe evaluation over a stove's occupants, run after a cook
    /// completion. First declaration-order full match wins; a full stove
    /// matching nothing starts the failure sequence.
    fn evaluate_stove(&mut self, station_id: StationId) {
        let tick = self.sim_state.tick;
        let Some(station) = self.stations.get(station_id) else {
            return;
        };
        if station.failure_pending || station.occupied_count() == 0 {
            return;
        }
        let Some(matcher) = self.matchers.get(station_id) else {
            return;
        };

        let present: Vec<_> = station
            .occupants()
            .filter_map(|(_, id)| {
                let item = self.items.get(id)?;
                self.registry
                    .get_template(item.template)?
                    .signature_for(item.visual_state())
            })
            .collect();

        if let Some(recipe_id) = matcher.evaluate(&self.registry, &present) {
            let Some(product_template) = self
                .registry
                .get_recipe(recipe_id)
                .map(|r| r.product)
            else {
                return;
            };
            let Some(station) = self.stations.get_mut(station_id) else {
                return;
            };
            let anchor = station.slot_anchor(0);
            let evicted = station.clear_all();
            for id in evicted {
                self.destroy_item(id);
            }
            let Some(product) = self.spawn_item(product_template, anchor) else {
                return;
            };
            if let (Some(st), Some(item)) = (
                self.stations.get_mut(station_id),
                self.items.get_mut(product),
            ) {
                st.place_in_slot(0, product, item);
            }
            self.event_bus.emit(Event::RecipeMatched {
                station: station_id,
                recipe: recipe_id,
                product,
                tick,
            });
        } else if station.is_full() {
            let Some(station) = self.stations.get_mut(station_id) else {
                return;
            };
            station.failure_pending = true;
            self.event_bus.emit(Event::FireStarted {
                station: station_id,
                tick,
            });
            self.scheduler.schedule_in(
                tick,
                self.stove_failure_timeout,
                ScheduledAction::ClearStove {
                    station: station_id,
                },
            );
            self.scheduler.schedule_in(
                tick,
                self.stove_failure_timeout,
                ScheduledAction::ClearFireEffect {
                    station: station_id,
                },
            );
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Scheduled actions
    // -----------------------------------------------------------------------

    fn phase_scheduled(&mut self) {
        let tick = self.sim_state.tick;
        for action in self.scheduler.drain_due(tick) {
            match action {
                ScheduledAction::ClearStove { station } => {
                    let Some(st) = self.stations.get_mut(station) else {
                        continue;
                    };
                    let evicted = st.clear_all();
                    for id in evicted {
                        self.destroy_item(id);
                    }
                    self.event_bus.emit(Event::StoveCleared { station, tick });
                }
                ScheduledAction::ClearFireEffect { station } => {
                    self.event_bus.emit(Event::FireCleared { station, tick });
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: NPCs
    // -----------------------------------------------------------------------

    fn phase_npcs(&mut self) {
        let tick = self.sim_state.tick;

        if let Some(npc) = self.spawner.step(&mut self.endpoints, &mut self.rng) {
            let endpoint = npc.endpoint();
            let id = self.npcs.insert(npc);
            self.npc_order.push(id);
            if let Some(endpoint) = endpoint {
                self.event_bus.emit(Event::NpcSpawned {
                    npc: id,
                    endpoint,
                    tick,
                });
            }
        }

        let order = self.npc_order.clone();
        for npc_id in order {
            let Some(npc) = self.npcs.get_mut(npc_id) else {
                continue;
            };
            let step = npc.step(&mut self.endpoints);
            if let Some((endpoint, order)) = step.seated {
                self.event_bus.emit(Event::NpcSeated {
                    npc: npc_id,
                    endpoint,
                    order,
                    tick,
                });
            }
            if let Some(endpoint) = step.released {
                self.event_bus.emit(Event::EndpointReleased { endpoint, tick });
            }
            if step.departed {
                self.npcs.remove(npc_id);
                self.npc_order.retain(|&n| n != npc_id);
                self.event_bus.emit(Event::NpcDeparted { npc: npc_id, tick });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 4: Interactions
    // -----------------------------------------------------------------------

    fn phase_interactions(&mut self) {
        let requests = self.arbiter.drain_requests();
        for _ in 0..requests {
            if let Err(error) = self.perform_interaction() {
                tracing::debug!(%error, "interaction ignored");
            }
        }
    }

    fn perform_interaction(&mut self) -> Result<(), InteractError> {
        let target = self.arbiter.current().ok_or(InteractError::NothingNearby)?;
        match target {
            Interactable::Station(id) => self.interact_station(id),
            Interactable::Npc(id) => self.interact_npc(id),
            Interactable::IngredientCrate(index) => self.interact_crate(index),
            Interactable::TrashCan(_) => self.interact_trash(),
            Interactable::PlateRack(index) => self.interact_rack(index),
        }
    }

    fn interact_station(&mut self, station_id: StationId) -> Result<(), InteractError> {
        let kind = self
            .stations
            .get(station_id)
            .ok_or(InteractError::NothingNearby)?
            .kind;

        match self.player.held() {
            Some(held) => {
                if kind == StationKind::Stove && self.is_clean_plate(held) {
                    return self.collect_plated(station_id, held);
                }
                let item = self
                    .items
                    .get_mut(held)
                    .ok_or(InteractError::NotEligible)?;
                let station = self
                    .stations
                    .get_mut(station_id)
                    .ok_or(InteractError::NothingNearby)?;
                let slot = station.begin_processing(held, item)?;
                self.player.take_held();
                self.event_bus.emit(Event::ProcessingStarted {
                    station: station_id,
                    item: held,
                    slot,
                    tick: self.sim_state.tick,
                });
                Ok(())
            }
            None => {
                // Empty-handed pickup of a completed item. The stove keeps
                // its contents; finished food leaves it only on a plate.
                if kind == StationKind::Stove {
                    return Err(InteractError::HandsEmpty);
                }
                let station = self
                    .stations
                    .get(station_id)
                    .ok_or(InteractError::NothingNearby)?;
                let done = station
                    .extract_first(&self.items, |item| station.is_completed(item))
                    .ok_or(InteractError::NotEligible)?;
                if let Some(st) = self.stations.get_mut(station_id) {
                    st.release_slot(done);
                }
                if let Some(item) = self.items.get_mut(done) {
                    item.snap_to(AttachPoint::PlayerHand);
                    item.position = self.player.position;
                }
                self.player.hold(done);
                Ok(())
            }
        }
    }

    fn is_clean_plate(&self, id: ItemId) -> bool {
        self.items
            .get(id)
            .is_some_and(|item| item.is_plate() && (item.is_washed() || !item.is_washable()))
    }

    /// Exchange a clean plate plus a finished product on the stove for the
    /// plated dish in hand.
    fn collect_plated(&mut self, station_id: StationId, plate: ItemId) -> Result<(), InteractError> {
        let station = self
            .stations
            .get(station_id)
            .ok_or(InteractError::NothingNearby)?;
        let product = station
            .extract_first(&self.items, |item| item.product_of().is_some())
            .ok_or(InteractError::NotEligible)?;
        let recipe = self
            .items
            .get(product)
            .and_then(Item::product_of)
            .ok_or(InteractError::NotEligible)?;
        let plated_template = self
            .registry
            .get_recipe(recipe)
            .map(|r| r.plated_product)
            .ok_or(InteractError::NotEligible)?;

        if let Some(st) = self.stations.get_mut(station_id) {
            st.release_slot(product);
        }
        self.player.take_held();
        self.destroy_item(plate);
        self.destroy_item(product);
        // spawn_into_hand re-checks free hands; they were just emptied.
        self.spawn_into_hand(plated_template);
        Ok(())
    }

    fn interact_npc(&mut self, npc_id: NpcId) -> Result<(), InteractError> {
        let held = self.player.held().ok_or(InteractError::HandsEmpty)?;
        let order = self
            .npcs
            .get(npc_id)
            .ok_or(InteractError::NothingNearby)?
            .order()
            .ok_or(InteractError::WrongOrder)?;
        let plated_of = self
            .items
            .get(held)
            .and_then(Item::plated_product_of)
            .ok_or(InteractError::WrongOrder)?;
        if plated_of != order {
            return Err(InteractError::WrongOrder);
        }

        let Some(npc) = self.npcs.get_mut(npc_id) else {
            return Err(InteractError::NothingNearby);
        };
        let Some(recipe) = npc.fulfill() else {
            return Err(InteractError::WrongOrder);
        };
        self.player.take_held();
        self.destroy_item(held);
        self.event_bus.emit(Event::OrderDelivered {
            npc: npc_id,
            recipe,
            tick: self.sim_state.tick,
        });
        if let Some(template) = self.dirty_plate_template {
            self.spawn_into_hand(template);
        }
        Ok(())
    }

    fn interact_crate(&mut self, index: usize) -> Result<(), InteractError> {
        if !self.player.hands_free() {
            return Err(InteractError::HandsFull);
        }
        let template = self
            .crates
            .get(index)
            .ok_or(InteractError::NothingNearby)?
            .template;
        self.spawn_into_hand(template);
        Ok(())
    }

    fn interact_trash(&mut self) -> Result<(), InteractError> {
        let held = self.player.take_held().ok_or(InteractError::HandsEmpty)?;
        self.destroy_item(held);
        Ok(())
    }

    fn interact_rack(&mut self, index: usize) -> Result<(), InteractError> {
        if self.plate_racks.get(index).is_none() {
            return Err(InteractError::NothingNearby);
        }
        match self.player.held() {
            None => {
                // Take a stocked plate.
                let rack = &mut self.plate_racks[index];
                let slot = rack
                    .slots
                    .iter()
                    .position(|s| s.is_some())
                    .ok_or(InteractError::NotEligible)?;
                let Some(plate) = rack.slots[slot].take() else {
                    return Err(InteractError::NotEligible);
                };
                if let Some(item) = self.items.get_mut(plate) {
                    item.snap_to(AttachPoint::PlayerHand);
                    item.position = self.player.position;
                }
                self.player.hold(plate);
                Ok(())
            }
            Some(held) => {
                // Put a clean plate back.
                if !self.is_clean_plate(held) {
                    return Err(InteractError::NotEligible);
                }
                let rack = &mut self.plate_racks[index];
                let slot = rack
                    .slots
                    .iter()
                    .position(|s| s.is_none())
                    .ok_or(InteractError::NoFreeSlot)?;
                rack.slots[slot] = Some(held);
                let position = rack.positions.get(slot).copied().unwrap_or(Vec2::ZERO);
                if let Some(item) = self.items.get_mut(held) {
                    item.unsnap();
                    item.position = position;
                }
                self.player.take_held();
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 5: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self) {
        // Attached items track their anchor every step.
        let player_position = self.player.position;
        for (_, item) in self.items.iter_mut() {
            match item.attachment() {
                Some(AttachPoint::StationSlot { station, slot }) => {
                    if let Some(st) = self.stations.get(station) {
                        item.position = st.slot_anchor(slot);
                    }
                }
                Some(AttachPoint::PlayerHand) => {
                    item.position = player_position;
                }
                None => {}
            }
        }

        self.sim_state.tick += 1;
        self.event_bus.deliver();
        self.last_state_hash = self.compute_state_hash();
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// The state hash computed at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Compute a deterministic hash of the current simulation state.
    ///
    /// Arena iteration order is deterministic for identical construction and
    /// mutation histories, which is exactly the property the hash verifies.
    fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();

        hasher.write_u64(self.sim_state.tick);
        hasher.write_u64(self.rng.state());

        for (id, item) in self.items.iter() {
            hasher.write_u64(id.data().as_ffi());
            hasher.write_u32(item.template.0);
            hasher.write_u32(
                (item.is_cut() as u32) | (item.is_washed() as u32) << 1
                    | (item.is_cooked() as u32) << 2,
            );
            hasher.write_fixed64(item.position.x);
            hasher.write_fixed64(item.position.y);
        }

        for &station_id in &self.station_order {
            let Some(station) = self.stations.get(station_id) else {
                continue;
            };
            hasher.write_u64(station.timer_remaining());
            hasher.write_u32(station.failure_pending as u32);
            for (slot, item) in station.occupants() {
                hasher.write_u32(slot as u32);
                hasher.write_u64(item.data().as_ffi());
            }
        }

        for index in 0..self.endpoints.len() {
            hasher.write_u32(self.endpoints.is_occupied(EndpointId(index as u32)) as u32);
        }

        for &npc_id in &self.npc_order {
            let Some(npc) = self.npcs.get(npc_id) else {
                continue;
            };
            hasher.write_u64(npc_id.data().as_ffi());
            hasher.write_u32(npc.phase() as u32);
            hasher.write_fixed64(npc.position.x);
            hasher.write_fixed64(npc.position.y);
            if let Some(order) = npc.order() {
                hasher.write_u32(order.0);
            }
        }

        hasher.write_fixed64(self.player.position.x);
        hasher.write_fixed64(self.player.position.y);
        if let Some(held) = self.player.held() {
            hasher.write_u64(held.data().as_ffi());
        }

        hasher.finish()
    }

    // -----------------------------------------------------------------------
    // Query API (read-only)
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Stations in construction order.
    pub fn station_ids(&self) -> &[StationId] {
        &self.station_order
    }

    /// Shared-timer progress for one station (UI-signal contract).
    pub fn station_progress(&self, id: StationId) -> Option<Fixed64> {
        self.stations.get(id)?.progress()
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(id)
    }

    /// Live NPCs in spawn order.
    pub fn npc_ids(&self) -> &[NpcId] {
        &self.npc_order
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Would an interaction request do anything right now? Presentation
    /// polls this to show or hide the prompt (UI-signal contract).
    pub fn interaction_hint(&self) -> bool {
        let Some(target) = self.arbiter.current() else {
            return false;
        };
        match target {
            Interactable::Station(id) => self.station_hint(id),
            Interactable::Npc(id) => self
                .player
                .held()
                .zip(self.npcs.get(id).and_then(Npc::order))
                .is_some_and(|(held, order)| {
                    self.items
                        .get(held)
                        .and_then(Item::plated_product_of)
                        .is_some_and(|r| r == order)
                }),
            Interactable::IngredientCrate(index) => {
                self.player.hands_free() && index < self.crates.len()
            }
            Interactable::TrashCan(_) => self.player.held().is_some(),
            Interactable::PlateRack(index) => self.rack_hint(index),
        }
    }

    fn station_hint(&self, station_id: StationId) -> bool {
        let Some(station) = self.stations.get(station_id) else {
            return false;
        };
        match self.player.held() {
            Some(held) => {
                if station.kind == StationKind::Stove
                    && self.is_clean_plate(held)
                    && station
                        .extract_first(&self.items, |item| item.product_of().is_some())
                        .is_some()
                {
                    return true;
                }
                station.has_free_slot()
                    && self.items.get(held).is_some_and(|item| station.accepts(item))
            }
            None => {
                station.kind != StationKind::Stove
                    && station
                        .extract_first(&self.items, |item| station.is_completed(item))
                        .is_some()
            }
        }
    }

    fn rack_hint(&self, index: usize) -> bool {
        let Some(rack) = self.plate_racks.get(index) else {
            return false;
        };
        match self.player.held() {
            None => rack.slots.iter().any(Option::is_some),
            Some(held) => self.is_clean_plate(held) && rack.slots.iter().any(Option::is_none),
        }
    }

    /// Number of plates currently stocked in a rack.
    pub fn rack_stock(&self, index: usize) -> usize {
        self.plate_racks
            .get(index)
            .map(|r| r.slots.iter().filter(|s| s.is_some()).count())
            .unwrap_or(0)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixed, onion_soup_registry, small_kitchen, TestKitchen};

    fn chop(kitchen: &mut Kitchen, board: StationId, template: ItemTypeId) -> ItemId {
        let id = kitchen.spawn_into_hand(template).unwrap();
        kitchen.zone_entered(Interactable::Station(board));
        kitchen.request_interact();
        kitchen.step();
        for _ in 0..TestKitchen::CUT_DURATION {
            kitchen.step();
        }
        // Empty-handed pickup of the finished item.
        kitchen.request_interact();
        kitchen.step();
        kitchen.zone_exited(Interactable::Station(board));
        id
    }

    #[test]
    fn chop_an_onion_end_to_end() {
        let TestKitchen {
            mut kitchen,
            cutting_board,
            onion,
            ..
        } = small_kitchen();

        let id = chop(&mut kitchen, cutting_board, onion);
        let item = kitchen.item(id).unwrap();
        assert!(item.is_cut());
        assert_eq!(item.visual_state(), VisualState::Cut);
        // Cutting granted the cookable capability.
        assert!(item.is_cookable());
        assert_eq!(kitchen.player().held(), Some(id));
    }

    #[test]
    fn placing_ineligible_item_is_a_noop() {
        let TestKitchen {
            mut kitchen,
            cutting_board,
            plate,
            ..
        } = small_kitchen();

        let id = kitchen.spawn_into_hand(plate).unwrap();
        kitchen.zone_entered(Interactable::Station(cutting_board));
        kitchen.request_interact();
        kitchen.step();
        // Still holding the plate; nothing changed, nothing panicked.
        assert_eq!(kitchen.player().held(), Some(id));
        assert_eq!(kitchen.station(cutting_board).unwrap().occupied_count(), 0);
    }

    #[test]
    fn interaction_without_nearby_target_is_a_noop() {
        let TestKitchen { mut kitchen, .. } = small_kitchen();
        kitchen.request_interact();
        kitchen.step();
        assert!(kitchen.player().hands_free());
    }

    #[test]
    fn stove_failure_clears_after_timeout() {
        let TestKitchen {
            mut kitchen,
            stove,
            plate: _,
            onion,
            meat,
            ..
        } = small_kitchen();

        // Fill the two-slot stove with cuttable-then-cookable items whose
        // cooked signatures match no recipe together with a raw partner.
        for template in [onion, meat] {
            let id = kitchen.spawn_into_hand(template).unwrap();
            if let Some(item) = kitchen.items.get_mut(id) {
                item.cut();
            }
            kitchen.zone_entered(Interactable::Station(stove));
            kitchen.request_interact();
            kitchen.step();
        }
        // meat was placed last and is gated by the shared timer; onion stays
        // raw, so after cooking completes the full stove matches nothing.
        for _ in 0..TestKitchen::COOK_DURATION {
            kitchen.step();
        }
        assert!(kitchen.station(stove).unwrap().is_failure_pending());
        let fires = kitchen.event_bus.total_emitted(EventKind::FireStarted);
        assert_eq!(fires, 1);

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
    fn matching_recipe_replaces_contents_with_product() {
        let TestKitchen {
            mut kitchen,
            stove,
            cutting_board,
            onion,
            meat,
            soup,
            ..
        } = small_kitchen();

        for template in [onion, meat] {
            chop(&mut kitchen, cutting_board, template);
            kitchen.zone_entered(Interactable::Station(stove));
            kitchen.request_interact();
            kitchen.step();
            kitchen.zone_exited(Interactable::Station(stove));
            // Let each item finish cooking before the next placement re-arms
            // the shared timer.
            for _ in 0..TestKitchen::COOK_DURATION {
                kitchen.step();
            }
        }

        let st = kitchen.station(stove).unwrap();
        assert_eq!(st.occupied_count(), 1);
        let (_, product) = st.occupants().next().unwrap();
        assert_eq!(kitchen.item(product).unwrap().template, soup);
        assert_eq!(kitchen.event_bus.total_emitted(EventKind::RecipeMatched), 1);
        assert!(!st.is_failure_pending());
    }

    #[test]
    fn washed_replacement_can_be_picked_up() {
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
        // The replacement plate is not itself washable, but it still counts
        // as finished: an empty-handed interact takes it out of the sink.
        assert!(kitchen.interaction_hint());
        kitchen.request_interact();
        kitchen.step();

        let clean = kitchen.player().held().expect("clean plate in hand");
        assert_ne!(clean, dirty);
        assert!(kitchen.item(dirty).is_none());
        assert_eq!(kitchen.item(clean).unwrap().template, plate);
        assert_eq!(kitchen.station(sink).unwrap().occupied_count(), 0);
    }

    #[test]
    fn crate_trash_round_trip() {
        let TestKitchen { mut kitchen, .. } = small_kitchen();

        kitchen.zone_entered(Interactable::IngredientCrate(0));
        kitchen.request_interact();
        kitchen.step();
        let held = kitchen.player().held().unwrap();

        // Hands full: a second pull is refused.
        kitchen.request_interact();
        kitchen.step();
        assert_eq!(kitchen.player().held(), Some(held));

        kitchen.zone_entered(Interactable::TrashCan(0));
        kitchen.request_interact();
        kitchen.step();
        assert!(kitchen.player().hands_free());
        assert!(kitchen.item(held).is_none());
    }

    #[test]
    fn plate_rack_take_and_return() {
        let TestKitchen { mut kitchen, .. } = small_kitchen();
        let stocked = kitchen.rack_stock(0);
        assert!(stocked > 0);

        kitchen.zone_entered(Interactable::PlateRack(0));
        kitchen.request_interact();
        kitchen.step();
        let plate = kitchen.player().held().unwrap();
        assert!(kitchen.item(plate).unwrap().is_plate());
        assert_eq!(kitchen.rack_stock(0), stocked - 1);

        kitchen.request_interact();
        kitchen.step();
        assert!(kitchen.player().hands_free());
        assert_eq!(kitchen.rack_stock(0), stocked);
    }

    #[test]
    fn delta_strategy_accumulates_fixed_steps() {
        let registry = onion_soup_registry();
        let config = KitchenConfig {
            strategy: SimulationStrategy::Delta { fixed_timestep: 4 },
            ..KitchenConfig::default()
        };
        let mut kitchen = Kitchen::new(registry.registry, config);

        assert_eq!(kitchen.advance(3).steps_run, 0);
        assert_eq!(kitchen.advance(3).steps_run, 1);
        assert_eq!(kitchen.advance(10).steps_run, 3);
        assert_eq!(kitchen.tick(), 4);
    }

    #[test]
    fn paused_kitchen_does_not_step() {
        let TestKitchen { mut kitchen, .. } = small_kitchen();
        kitchen.pause();
        assert_eq!(kitchen.step().steps_run, 0);
        assert_eq!(kitchen.tick(), 0);
        kitchen.resume();
        assert_eq!(kitchen.step().steps_run, 1);
    }

    #[test]
    fn held_item_follows_player() {
        let TestKitchen { mut kitchen, onion, .. } = small_kitchen();
        let id = kitchen.spawn_into_hand(onion).unwrap();
        let target = Vec2::from_f64(3.5, -1.0);
        kitchen.set_player_position(target);
        kitchen.step();
        assert_eq!(kitchen.item(id).unwrap().position, target);
    }

    #[test]
    fn progress_query_tracks_shared_timer() {
        let TestKitchen {
            mut kitchen,
            cutting_board,
            onion,
            ..
        } = small_kitchen();

        assert_eq!(kitchen.station_progress(cutting_board), None);
        kitchen.spawn_into_hand(onion).unwrap();
        kitchen.zone_entered(Interactable::Station(cutting_board));
        kitchen.request_interact();
        kitchen.step();
        let early = kitchen.station_progress(cutting_board).unwrap();
        kitchen.step();
        let later = kitchen.station_progress(cutting_board).unwrap();
        assert!(later > early || later == fixed(0.0) && early == fixed(0.0));
    }

    #[test]
    fn hint_reflects_station_eligibility() {
        let TestKitchen {
            mut kitchen,
            cutting_board,
            onion,
            plate,
            ..
        } = small_kitchen();

        kitchen.zone_entered(Interactable::Station(cutting_board));
        // Hands free, nothing completed on the board: no hint.
        assert!(!kitchen.interaction_hint());

        kitchen.spawn_into_hand(onion).unwrap();
        assert!(kitchen.interaction_hint());

        // A plate is not cuttable: no hint.
        kitchen.zone_entered(Interactable::TrashCan(0));
        kitchen.request_interact();
        kitchen.step();
        kitchen.zone_entered(Interactable::Station(cutting_board));
        kitchen.spawn_into_hand(plate).unwrap();
        assert!(!kitchen.interaction_hint());
    }
}
