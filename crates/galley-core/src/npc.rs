//! Customer NPCs: spawn, walk in, sit, order, leave.
//!
//! An NPC is a small phase machine stepped once per simulation step. Movement
//! is straight-line `move_towards` in fixed-point, so arrival is an exact
//! position match (the mover snaps onto its goal within one step's range).
//!
//! Endpoint discipline: a seat is reserved before the NPC walks to it —
//! normally by the spawner at spawn time, otherwise by per-step polling once
//! the waypoint route is exhausted — and released exactly once, when the
//! returning NPC reaches the first waypoint of its way back.

use crate::endpoint::EndpointRegistry;
use crate::fixed::{Fixed64, Ticks};
use crate::id::{EndpointId, RecipeId};
use crate::rng::SimRng;
use crate::vec2::Vec2;

/// NPC lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcPhase {
    /// Following the waypoint route toward the seating area.
    Walking,
    /// Route exhausted, seat reserved; heading for the seat.
    WalkingToEndpoint,
    /// At the seat with an open order, waiting for delivery.
    Seated,
    /// Order fulfilled; walking the route in reverse.
    Returning,
}

/// Everything that can happen to one NPC in one step. The engine translates
/// this into events and, for `departed`, removal from the arena.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NpcStepResult {
    pub seated: Option<(EndpointId, RecipeId)>,
    pub released: Option<EndpointId>,
    pub departed: bool,
}

/// A live customer.
#[derive(Debug, Clone)]
pub struct Npc {
    phase: NpcPhase,
    pub position: Vec2,
    speed: Fixed64,
    /// Outbound while walking in; reversed in place on fulfillment.
    route: Vec<Vec2>,
    cursor: usize,
    endpoint: Option<EndpointId>,
    /// What this customer will ask for, decided at creation. Becomes the
    /// open `order` on seating.
    chosen: RecipeId,
    order: Option<RecipeId>,
    endpoint_released: bool,
}

impl Npc {
    pub fn new(
        position: Vec2,
        speed: Fixed64,
        route: Vec<Vec2>,
        endpoint: Option<EndpointId>,
        chosen: RecipeId,
    ) -> Self {
        Self {
            phase: NpcPhase::Walking,
            position,
            speed,
            route,
            cursor: 0,
            endpoint,
            chosen,
            order: None,
            endpoint_released: false,
        }
    }

    pub fn phase(&self) -> NpcPhase {
        self.phase
    }

    pub fn endpoint(&self) -> Option<EndpointId> {
        self.endpoint
    }

    /// The open order, if seated with one.
    pub fn order(&self) -> Option<RecipeId> {
        self.order
    }

    /// Walk toward `target`; true when this step arrived.
    fn walk_to(&mut self, target: Vec2) -> bool {
        self.position = self.position.move_towards(target, self.speed);
        self.position == target
    }

    /// Advance one step. Needs the endpoint registry for seat polling and
    /// release.
    pub fn step(&mut self, endpoints: &mut EndpointRegistry) -> NpcStepResult {
        let mut result = NpcStepResult::default();
        match self.phase {
            NpcPhase::Walking => {
                // Pull model: an NPC that spawned without a seat keeps
                // polling until one frees up.
                if self.endpoint.is_none() {
                    self.endpoint = endpoints.reserve_free();
                }
                if self.cursor < self.route.len() {
                    let target = self.route[self.cursor];
                    if self.walk_to(target) {
                        self.cursor += 1;
                    }
                }
                if self.cursor >= self.route.len() && self.endpoint.is_some() {
                    self.phase = NpcPhase::WalkingToEndpoint;
                }
            }
            NpcPhase::WalkingToEndpoint => {
                let Some(seat) = self.endpoint else {
                    self.phase = NpcPhase::Walking;
                    return result;
                };
                let Some(target) = endpoints.position(seat) else {
                    tracing::warn!(?seat, "reserved endpoint has no position; reverting");
                    self.endpoint = None;
                    self.phase = NpcPhase::Walking;
                    return result;
                };
                if self.walk_to(target) {
                    self.order = Some(self.chosen);
                    self.phase = NpcPhase::Seated;
                    result.seated = Some((seat, self.chosen));
                }
            }
            NpcPhase::Seated => {
                // Waits for the player to deliver; nothing moves.
            }
            NpcPhase::Returning => {
                if self.cursor < self.route.len() {
                    let target = self.route[self.cursor];
                    if self.walk_to(target) {
                        if self.cursor == 0 && !self.endpoint_released {
                            // First waypoint of the way back: give the seat up,
                            // exactly once.
                            self.endpoint_released = true;
                            if let Some(seat) = self.endpoint {
                                endpoints.release(seat);
                                result.released = Some(seat);
                            }
                        }
                        self.cursor += 1;
                    }
                }
                if self.cursor >= self.route.len() {
                    result.departed = true;
                }
            }
        }
        result
    }

    /// Close the open order and start the walk back. Returns the fulfilled
    /// recipe, or `None` when there was nothing to fulfill.
    pub fn fulfill(&mut self) -> Option<RecipeId> {
        if self.phase != NpcPhase::Seated {
            return None;
        }
        let order = self.order.take()?;
        self.route.reverse();
        self.cursor = 0;
        self.phase = NpcPhase::Returning;
        Some(order)
    }
}

// ---------------------------------------------------------------------------
// Spawner
// ---------------------------------------------------------------------------

/// NPC spawn configuration (part of the kitchen layout).
#[derive(Debug, Clone)]
pub struct NpcConfig {
    /// Ticks between spawn attempts. 0 disables spawning.
    pub spawn_interval: Ticks,
    pub spawn_position: Vec2,
    /// Distance per tick.
    pub speed: Fixed64,
    /// Outbound route from spawn toward the seating area.
    pub waypoints: Vec<Vec2>,
}

/// Spawns a customer every `spawn_interval` ticks, but only when a seat can
/// be reserved up front. A beat with no free seat is skipped, not deferred.
#[derive(Debug)]
pub struct NpcSpawner {
    config: NpcConfig,
    recipe_count: usize,
    countdown: Ticks,
    enabled: bool,
}

impl NpcSpawner {
    /// `recipe_count` is checked here: with nothing to order, customers make
    /// no sense and spawning is disabled for the instance lifetime.
    pub fn new(config: NpcConfig, recipe_count: usize) -> Self {
        let enabled =
            config.spawn_interval > 0 && !config.waypoints.is_empty() && recipe_count > 0;
        if !enabled {
            tracing::warn!(
                spawn_interval = config.spawn_interval,
                waypoints = config.waypoints.len(),
                recipe_count,
                "npc spawning disabled"
            );
        }
        let countdown = config.spawn_interval;
        Self {
            config,
            recipe_count,
            countdown,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Tick the spawn countdown; on a spawn beat with a free seat, reserve
    /// it, draw the customer's recipe, and hand back the new NPC for the
    /// engine to insert.
    pub fn step(&mut self, endpoints: &mut EndpointRegistry, rng: &mut SimRng) -> Option<Npc> {
        if !self.enabled {
            return None;
        }
        self.countdown -= 1;
        if self.countdown > 0 {
            return None;
        }
        self.countdown = self.config.spawn_interval;
        let Some(seat) = endpoints.reserve_free() else {
            tracing::debug!("spawn beat skipped; no free endpoint");
            return None;
        };
        let chosen = RecipeId(rng.uniform_index(self.recipe_count) as u32);
        Some(Npc::new(
            self.config.spawn_position,
            self.config.speed,
            self.config.waypoints.clone(),
            Some(seat),
            chosen,
        ))
    }
}
