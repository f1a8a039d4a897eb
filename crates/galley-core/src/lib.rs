//! # galley-core
//!
//! Deterministic, headless gameplay core for a cooking simulation: stateful
//! items, processing stations, recipe matching, customer NPCs, and player
//! interaction, advanced by an explicit tick pipeline.
//!
//! The crate renders nothing and reads no input. Presentation drives it by
//! feeding in discrete requests ([`engine::Kitchen::zone_entered`],
//! [`engine::Kitchen::request_interact`]) and polls queries and events back
//! out. All arithmetic is Q32.32 fixed-point and all randomness flows through
//! one seeded PRNG, so a seed plus a request trace replays the same service
//! bit-for-bit on any platform.
//!
//! # Architecture
//!
//! - [`registry`] -- immutable item templates, recipes, and visual
//!   signatures (frozen at startup).
//! - [`item`] / [`station`] / [`recipe`] -- the processing model: monotonic
//!   item state, slot arrays with one shared timer each, declaration-order
//!   recipe matching.
//! - [`endpoint`] / [`npc`] -- seat allocation and the customer lifecycle.
//! - [`interact`] -- the player's hands and the edge-triggered interaction
//!   arbiter.
//! - [`engine`] -- [`engine::Kitchen`], owner of all state, running the
//!   five-phase step.
//! - [`event`] -- typed event bus with per-kind ring buffers.

pub mod endpoint;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod id;
pub mod interact;
pub mod item;
pub mod npc;
pub mod recipe;
pub mod registry;
pub mod rng;
pub mod schedule;
pub mod sim;
pub mod station;
pub mod vec2;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
