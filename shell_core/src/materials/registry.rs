//! # Lookup Registry
//!
//! The read-only lookup capability consulted during cross-referencing, and
//! an in-memory implementation keyed by id for callers that have no deck
//! model of their own.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::materials::{Material, ModelRegistry, Registry};
//!
//! let mut registry = ModelRegistry::new();
//! registry.add_material(Material::isotropic(1, 1.0e7, 3.8e6, 0.3, 0.1));
//!
//! assert!(registry.resolve_material(1).is_some());
//! assert!(registry.resolve_material(2).is_none());
//! // the basic coordinate system is always present
//! assert!(registry.resolve_coordinate_system(0).is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::{CoordinateSystem, Material};

/// Lookup capability for foreign keys.
///
/// Implementations only answer whether an id exists; the cross-reference
/// resolver turns a miss into an `UnresolvedReference` error that names the
/// property (and ply) that needed it.
pub trait Registry {
    fn resolve_material(&self, mid: i64) -> Option<Arc<Material>>;

    fn resolve_coordinate_system(&self, cid: i64) -> Option<Arc<CoordinateSystem>>;
}

/// Id-keyed in-memory registry.
///
/// Entries are stored behind `Arc` so resolved handles can be shared by many
/// properties without copying.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    materials: HashMap<i64, Arc<Material>>,
    coordinate_systems: HashMap<i64, Arc<CoordinateSystem>>,
}

impl ModelRegistry {
    /// Create a registry holding only the basic coordinate system
    pub fn new() -> Self {
        let mut coordinate_systems = HashMap::new();
        coordinate_systems.insert(
            CoordinateSystem::BASIC,
            Arc::new(CoordinateSystem::new(CoordinateSystem::BASIC)),
        );
        ModelRegistry {
            materials: HashMap::new(),
            coordinate_systems,
        }
    }

    /// Build a registry from a list of materials
    pub fn from_materials(materials: impl IntoIterator<Item = Material>) -> Self {
        let mut registry = ModelRegistry::new();
        for material in materials {
            registry.add_material(material);
        }
        registry
    }

    /// Add (or replace) a material, returning the previous entry with that id
    pub fn add_material(&mut self, material: Material) -> Option<Arc<Material>> {
        self.materials.insert(material.mid, Arc::new(material))
    }

    /// Add (or replace) a coordinate system
    pub fn add_coordinate_system(&mut self, coord: CoordinateSystem) -> Option<Arc<CoordinateSystem>> {
        self.coordinate_systems.insert(coord.cid, Arc::new(coord))
    }

    /// Remove a material by id
    pub fn remove_material(&mut self, mid: i64) -> Option<Arc<Material>> {
        self.materials.remove(&mid)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        ModelRegistry::new()
    }
}

impl Registry for ModelRegistry {
    fn resolve_material(&self, mid: i64) -> Option<Arc<Material>> {
        self.materials.get(&mid).cloned()
    }

    fn resolve_coordinate_system(&self, cid: i64) -> Option<Arc<CoordinateSystem>> {
        self.coordinate_systems.get(&cid).cloned()
    }
}
