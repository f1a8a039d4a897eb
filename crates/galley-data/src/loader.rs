//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the registry and kitchen configuration.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_kitchen_data`], the entry point that
//! turns a data directory into a ready-to-run kitchen definition.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use galley_core::engine::{CrateConfig, KitchenConfig, PlateRackConfig};
use galley_core::fixed::f64_to_fixed64;
use galley_core::id::ItemTypeId;
use galley_core::npc::NpcConfig;
use galley_core::registry::{ItemTemplateDef, Registry, RegistryBuilder};
use galley_core::sim::SimulationStrategy;
use galley_core::station::{StationConfig, StationKind};
use galley_core::vec2::Vec2;

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The definitions parsed but could not be assembled into a registry.
    #[error("invalid definitions in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without
/// extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from
/// extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => {
            let table: toml::Value =
                toml::from_str(&content).map_err(|e| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: format!("missing key '{toml_key}' in TOML file"),
                })?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: e.to_string(),
                })
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Kitchen pipeline
// ===========================================================================

/// A fully resolved kitchen definition.
pub struct KitchenData {
    pub registry: Registry,
    pub config: KitchenConfig,
}

/// Load `items`, `recipes`, and `layout` from a data directory and resolve
/// them into a registry and a kitchen configuration.
pub fn load_kitchen_data(dir: &Path) -> Result<KitchenData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let recipes_path = require_data_file(dir, "recipes")?;
    let layout_path = require_data_file(dir, "layout")?;

    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let layout: LayoutData = deserialize_file(&layout_path)?;

    let registry = build_registry(&items, &recipes, &items_path, &recipes_path)?;
    let config = resolve_layout(&layout, &registry, &layout_path)?;

    Ok(KitchenData { registry, config })
}

/// Resolve item and recipe data into a frozen registry. Signatures are
/// registered on first mention in an item's signature set.
pub fn build_registry(
    items: &[ItemData],
    recipes: &[RecipeData],
    items_file: &Path,
    recipes_file: &Path,
) -> Result<Registry, DataLoadError> {
    let mut builder = RegistryBuilder::new();
    let mut item_names: HashMap<String, ItemTypeId> = HashMap::new();

    for item in items {
        check_duplicate(&item_names, &item.name, items_file)?;
        // Index order matches visual state priority: raw, washed, cut, cooked.
        let signatures = [
            item.signatures
                .raw
                .as_deref()
                .map(|s| builder.register_signature(s)),
            item.signatures
                .washed
                .as_deref()
                .map(|s| builder.register_signature(s)),
            item.signatures
                .cut
                .as_deref()
                .map(|s| builder.register_signature(s)),
            item.signatures
                .cooked
                .as_deref()
                .map(|s| builder.register_signature(s)),
        ];
        let def = ItemTemplateDef {
            name: item.name.clone(),
            cuttable: item.cuttable,
            washable: item.washable,
            cookable: item.cookable,
            is_plate: item.is_plate,
            can_become_cookable_after_cut: item.cookable_after_cut,
            product_of: None,
            plated_product_of: None,
            signatures,
        };
        let id = builder
            .register_template(def)
            .map_err(|e| DataLoadError::Invalid {
                file: items_file.to_path_buf(),
                detail: e.to_string(),
            })?;
        item_names.insert(item.name.clone(), id);
    }

    for recipe in recipes {
        let signatures = recipe
            .signatures
            .iter()
            .map(|name| {
                builder
                    .signature_id(name)
                    .ok_or_else(|| DataLoadError::UnresolvedRef {
                        file: recipes_file.to_path_buf(),
                        name: name.clone(),
                        expected_kind: "signature",
                    })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        let product = *resolve_name(&item_names, &recipe.product, recipes_file, "item")?;
        let plated_product =
            *resolve_name(&item_names, &recipe.plated_product, recipes_file, "item")?;
        builder
            .register_recipe(&recipe.name, signatures, product, plated_product)
            .map_err(|e| DataLoadError::Invalid {
                file: recipes_file.to_path_buf(),
                detail: e.to_string(),
            })?;
    }

    builder.build().map_err(|e| DataLoadError::Invalid {
        file: recipes_file.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Resolve a layout against a frozen registry into a kitchen configuration.
pub fn resolve_layout(
    layout: &LayoutData,
    registry: &Registry,
    file: &Path,
) -> Result<KitchenConfig, DataLoadError> {
    let item = |name: &str| {
        registry
            .template_id(name)
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                file: file.to_path_buf(),
                name: name.to_string(),
                expected_kind: "item",
            })
    };

    let stations = layout
        .stations
        .iter()
        .map(|s| {
            let output_template = s.output.as_deref().map(&item).transpose()?;
            Ok(StationConfig {
                kind: match s.kind {
                    StationKindData::CuttingBoard => StationKind::CuttingBoard,
                    StationKindData::Stove => StationKind::Stove,
                    StationKindData::WashingStation => StationKind::WashingStation,
                },
                capacity: s.capacity,
                duration: s.duration,
                slot_anchors: s.slot_anchors.iter().copied().map(vec2).collect(),
                output_template,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    let crates = layout
        .crates
        .iter()
        .map(|c| {
            Ok(CrateConfig {
                template: item(&c.item)?,
                position: vec2(c.position),
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    let plate_racks = layout
        .plate_racks
        .iter()
        .map(|r| {
            Ok(PlateRackConfig {
                plate_template: item(&r.plate)?,
                slots: r.slots.iter().copied().map(vec2).collect(),
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    let dirty_plate_template = layout.dirty_plate.as_deref().map(&item).transpose()?;

    let strategy = match layout.strategy {
        None | Some(StrategyData::Tick) => SimulationStrategy::Tick,
        Some(StrategyData::Delta { fixed_timestep }) => {
            SimulationStrategy::Delta { fixed_timestep }
        }
    };

    Ok(KitchenConfig {
        stations,
        endpoints: layout.endpoints.iter().copied().map(vec2).collect(),
        npc: NpcConfig {
            spawn_interval: layout.npc.spawn_interval,
            spawn_position: vec2(layout.npc.spawn_position),
            speed: f64_to_fixed64(layout.npc.speed),
            waypoints: layout.npc.waypoints.iter().copied().map(vec2).collect(),
        },
        stove_failure_timeout: layout.stove_failure_timeout,
        crates,
        trash_cans: layout.trash_cans.iter().copied().map(vec2).collect(),
        plate_racks,
        dirty_plate_template,
        event_capacity: layout.event_capacity,
        seed: layout.seed,
        strategy,
    })
}

fn vec2((x, y): PositionData) -> Vec2 {
    Vec2::from_f64(x, y)
}

// ===========================================================================
// Tests
// ===========================================================================
