//! Data-driven kitchen definitions.
//!
//! Reads item, recipe, and layout files (RON, JSON, or TOML), resolves name
//! references, and produces a frozen [`galley_core::registry::Registry`] plus
//! a [`galley_core::engine::KitchenConfig`] ready to hand to
//! [`galley_core::engine::Kitchen::new`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, KitchenData, load_kitchen_data};
