//! Immutable registry of item templates, recipes, and visual signatures.
//!
//! Three-phase lifecycle: registration -> validation -> frozen. Everything a
//! running kitchen instantiates comes from here; the registry itself never
//! changes after `build()`.

use crate::id::{ItemTypeId, RecipeId, SignatureId};
use crate::item::VisualState;
use std::collections::HashMap;

/// An item template definition. `product_of` / `plated_product_of` are
/// derived from recipe registrations during `build()`; they are left `None`
/// at registration time.
#[derive(Debug, Clone)]
pub struct ItemTemplateDef {
    pub name: String,
    pub cuttable: bool,
    pub washable: bool,
    pub cookable: bool,
    pub is_plate: bool,
    pub can_become_cookable_after_cut: bool,
    pub product_of: Option<RecipeId>,
    pub plated_product_of: Option<RecipeId>,
    /// Visual signature per state, indexed by [`VisualState`]. The signature
    /// an item presents for recipe matching is the one for its *current*
    /// visual state, so a cooked ingredient is a different matching token
    /// than its raw form.
    pub signatures: [Option<SignatureId>; 4],
}

impl ItemTemplateDef {
    pub fn signature_for(&self, state: VisualState) -> Option<SignatureId> {
        self.signatures[state as usize]
    }
}

/// A recipe definition: the signature set a full stove must present, plus
/// the two result templates (raw finished dish, and the dish on a plate).
#[derive(Debug, Clone)]
pub struct RecipeDef {
    pub name: String,
    /// Required signatures. Must equal the stove's slot count to ever match;
    /// validated per stove instance at kitchen construction.
    pub signatures: Vec<SignatureId>,
    pub product: ItemTypeId,
    pub plated_product: ItemTypeId,
}

/// Builder for constructing an immutable [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    templates: Vec<ItemTemplateDef>,
    template_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    signatures: Vec<String>,
    signature_name_to_id: HashMap<String, SignatureId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or look up) a visual signature by name.
    pub fn register_signature(&mut self, name: &str) -> SignatureId {
        if let Some(&id) = self.signature_name_to_id.get(name) {
            return id;
        }
        let id = SignatureId(self.signatures.len() as u32);
        self.signatures.push(name.to_string());
        self.signature_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register an item template. Returns its ID, or an error on a duplicate name.
    pub fn register_template(
        &mut self,
        def: ItemTemplateDef,
    ) -> Result<ItemTypeId, RegistryError> {
        if self.template_name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        let id = ItemTypeId(self.templates.len() as u32);
        self.template_name_to_id.insert(def.name.clone(), id);
        self.templates.push(def);
        Ok(id)
    }

    /// Register a recipe. Returns its ID; declaration order is match order.
    pub fn register_recipe(
        &mut self,
        name: &str,
        signatures: Vec<SignatureId>,
        product: ItemTypeId,
        plated_product: ItemTypeId,
    ) -> Result<RecipeId, RegistryError> {
        if self.recipe_name_to_id.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(name.to_string(), id);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            signatures,
            product,
            plated_product,
        });
        Ok(id)
    }

    pub fn template_id(&self, name: &str) -> Option<ItemTypeId> {
        self.template_name_to_id.get(name).copied()
    }

    pub fn signature_id(&self, name: &str) -> Option<SignatureId> {
        self.signature_name_to_id.get(name).copied()
    }

    /// Validate cross-references, derive the recipe-result tags onto the
    /// product templates, and freeze.
    pub fn build(mut self) -> Result<Registry, RegistryError> {
        let template_count = self.templates.len() as u32;
        let signature_count = self.signatures.len() as u32;

        for (index, recipe) in self.recipes.iter().enumerate() {
            let id = RecipeId(index as u32);
            for sig in &recipe.signatures {
                if sig.0 >= signature_count {
                    return Err(RegistryError::InvalidSignatureRef(*sig));
                }
            }
            if recipe.product.0 >= template_count {
                return Err(RegistryError::InvalidTemplateRef(recipe.product));
            }
            if recipe.plated_product.0 >= template_count {
                return Err(RegistryError::InvalidTemplateRef(recipe.plated_product));
            }
            self.templates[recipe.product.0 as usize].product_of = Some(id);
            self.templates[recipe.plated_product.0 as usize].plated_product_of = Some(id);
        }

        Ok(Registry {
            templates: self.templates,
            template_name_to_id: self.template_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            signatures: self.signatures,
            signature_name_to_id: self.signature_name_to_id,
        })
    }
}

/// Immutable registry. Frozen after `build()`.
#[derive(Debug)]
pub struct Registry {
    templates: Vec<ItemTemplateDef>,
    template_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    signatures: Vec<String>,
    signature_name_to_id: HashMap<String, SignatureId>,
}

impl Registry {
    pub fn get_template(&self, id: ItemTypeId) -> Option<&ItemTemplateDef> {
        self.templates.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    /// Recipes in declaration (match) order.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    pub fn template_id(&self, name: &str) -> Option<ItemTypeId> {
        self.template_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn signature_id(&self, name: &str) -> Option<SignatureId> {
        self.signature_name_to_id.get(name).copied()
    }

    pub fn signature_name(&self, id: SignatureId) -> Option<&str> {
        self.signatures.get(id.0 as usize).map(String::as_str)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("invalid template reference: {0:?}")]
    InvalidTemplateRef(ItemTypeId),
    #[error("invalid signature reference: {0:?}")]
    InvalidSignatureRef(SignatureId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> ItemTemplateDef {
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

    fn setup_builder() -> RegistryBuilder {
        let mut b = RegistryBuilder::new();
        let sig_onion = b.register_signature("onion_cut");
        let sig_meat = b.register_signature("meat_cooked");
        let soup = b.register_template(template("soup")).unwrap();
        let soup_plated = b.register_template(template("soup_on_plate")).unwrap();
        b.register_recipe("soup", vec![sig_onion, sig_meat], soup, soup_plated)
            .unwrap();
        b
    }

    #[test]
    fn register_and_build() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.template_count(), 2);
        assert_eq!(reg.recipe_count(), 1);
        assert_eq!(reg.signature_count(), 2);
    }

    #[test]
    fn lookup_by_name() {
        let reg = setup_builder().build().unwrap();
        assert!(reg.template_id("soup").is_some());
        assert!(reg.recipe_id("soup").is_some());
        assert!(reg.signature_id("onion_cut").is_some());
        assert!(reg.template_id("nonexistent").is_none());
    }

    #[test]
    fn build_derives_product_tags() {
        let reg = setup_builder().build().unwrap();
        let recipe = reg.recipe_id("soup").unwrap();
        let soup = reg.get_template(reg.template_id("soup").unwrap()).unwrap();
        let plated = reg
            .get_template(reg.template_id("soup_on_plate").unwrap())
            .unwrap();
        assert_eq!(soup.product_of, Some(recipe));
        assert_eq!(plated.plated_product_of, Some(recipe));
    }

    #[test]
    fn duplicate_template_name_fails() {
        let mut b = RegistryBuilder::new();
        b.register_template(template("plate")).unwrap();
        assert!(matches!(
            b.register_template(template("plate")),
            Err(RegistryError::DuplicateName(_))
        ));
    }

    #[test]
    fn duplicate_signature_returns_same_id() {
        let mut b = RegistryBuilder::new();
        let a = b.register_signature("onion_cut");
        let b2 = b.register_signature("onion_cut");
        assert_eq!(a, b2);
    }

    #[test]
    fn invalid_template_ref_in_recipe_fails() {
        let mut b = RegistryBuilder::new();
        let sig = b.register_signature("x");
        b.register_recipe("bad", vec![sig], ItemTypeId(99), ItemTypeId(99))
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidTemplateRef(_))
        ));
    }

    #[test]
    fn invalid_signature_ref_in_recipe_fails() {
        let mut b = RegistryBuilder::new();
        let soup = b.register_template(template("soup")).unwrap();
        let plated = b.register_template(template("plated")).unwrap();
        b.register_recipe("bad", vec![SignatureId(42)], soup, plated)
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidSignatureRef(_))
        ));
    }

    #[test]
    fn empty_registry_builds() {
        let reg = RegistryBuilder::new().build().unwrap();
        assert_eq!(reg.template_count(), 0);
        assert_eq!(reg.recipe_count(), 0);
    }
}
