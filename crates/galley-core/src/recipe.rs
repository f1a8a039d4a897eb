//! Recipe matching over a stove's slot contents.
//!
//! A recipe is satisfied when every required signature appears among the
//! current-visual-state signatures of the occupied slots. Recipes are tried
//! in declaration order; the first full match wins — no partial credit, no
//! multi-recipe signalling.

use crate::id::{RecipeId, SignatureId};
use crate::registry::Registry;

/// Per-stove matcher state. A recipe whose signature count differs from the
/// stove's slot count can never use every slot, and a recipe that repeats a
/// signature can never be observed by set matching; both are flagged unusable
/// at construction (configuration mismatch) and skipped forever after.
#[derive(Debug, Clone)]
pub struct RecipeMatcher {
    usable: Vec<bool>,
}

impl RecipeMatcher {
    /// Validate every registered recipe against this stove's capacity.
    /// Mismatched recipes are logged once and treated as permanently
    /// unmatchable rather than failing construction.
    pub fn new(registry: &Registry, stove_capacity: usize) -> Self {
        let mut usable = Vec::with_capacity(registry.recipe_count());
        for (_, recipe) in registry.recipes() {
            let sized = recipe.signatures.len() == stove_capacity;
            if !sized {
                tracing::error!(
                    recipe = %recipe.name,
                    required = recipe.signatures.len(),
                    stove_capacity,
                    "recipe signature count does not match stove slot count; \
                     recipe will never match"
                );
            }
            let mut sorted = recipe.signatures.clone();
            sorted.sort_unstable_by_key(|s| s.0);
            let distinct = sorted.windows(2).all(|w| w[0] != w[1]);
            if !distinct {
                tracing::error!(
                    recipe = %recipe.name,
                    "recipe repeats a signature; set matching cannot observe \
                     multiplicity, recipe will never match"
                );
            }
            usable.push(sized && distinct);
        }
        Self { usable }
    }

    /// First recipe, in declaration order, whose required signatures are all
    /// present in `present`. Returns `None` when nothing fully matches.
    pub fn evaluate(&self, registry: &Registry, present: &[SignatureId]) -> Option<RecipeId> {
        for (id, recipe) in registry.recipes() {
            if !self.usable[id.0 as usize] {
                continue;
            }
            if recipe
                .signatures
                .iter()
                .all(|required| present.contains(required))
            {
                return Some(id);
            }
        }
        None
    }

    /// Whether a given recipe survived configuration validation.
    pub fn is_usable(&self, id: RecipeId) -> bool {
        self.usable.get(id.0 as usize).copied().unwrap_or(false)
    }
}
