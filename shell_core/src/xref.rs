//! # Cross-Reference Resolution
//!
//! A foreign key on a property is either the raw id read from the card or a
//! handle to the entry it names. [`XRef`] keeps the two states explicit and
//! always answers [`XRef::id`], so derived-quantity code never needs to ask
//! which state it is in.
//!
//! The per-card `cross_reference` methods resolve every slot through a
//! [`Registry`] and swap the ids for handles only once every lookup has
//! succeeded. `uncross_reference` is the exact inverse.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::materials::{Material, ModelRegistry};
//! use shell_core::xref::{resolve_material, MaterialRef};
//!
//! let registry = ModelRegistry::from_materials([Material::isotropic(7, 1.0e7, 3.8e6, 0.3, 0.1)]);
//!
//! let mut mid = MaterialRef::Unresolved(7);
//! mid = MaterialRef::Resolved(resolve_material(&registry, 7, "PSHEAR pid=1").unwrap());
//! assert_eq!(mid.id(), 7);
//! assert_eq!(mid.resolved().map(|m| m.rho), Some(0.1));
//!
//! mid.unresolve();
//! assert_eq!(mid, MaterialRef::Unresolved(7));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{PropResult, PropertyError};
use crate::materials::{CoordinateSystem, Material};

pub use crate::materials::Registry;

/// An entry addressable by an integer id.
pub trait Keyed {
    /// Human-readable entry kind, used in error messages
    const KIND: &'static str;

    fn key(&self) -> i64;
}

/// Two-state foreign key: a raw id or a resolved handle.
#[derive(Debug, Clone, PartialEq)]
pub enum XRef<T> {
    Unresolved(i64),
    Resolved(Arc<T>),
}

/// Material slot
pub type MaterialRef = XRef<Material>;

/// Coordinate system slot
pub type CoordRef = XRef<CoordinateSystem>;

impl<T: Keyed> XRef<T> {
    /// The referenced id, whichever state the slot is in
    pub fn id(&self) -> i64 {
        match self {
            XRef::Unresolved(id) => *id,
            XRef::Resolved(handle) => handle.key(),
        }
    }

    /// The resolved entry, if any
    pub fn resolved(&self) -> Option<&T> {
        match self {
            XRef::Unresolved(_) => None,
            XRef::Resolved(handle) => Some(handle),
        }
    }

    /// The resolved entry, or an `UnresolvedReference` naming `required_by`
    pub fn require(&self, required_by: impl Into<String>) -> PropResult<&T> {
        self.resolved()
            .ok_or_else(|| PropertyError::unresolved(T::KIND, self.id(), required_by))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, XRef::Resolved(_))
    }

    /// Drop the handle, keeping the id
    pub fn unresolve(&mut self) {
        *self = XRef::Unresolved(self.id());
    }
}

impl<T> From<i64> for XRef<T> {
    fn from(id: i64) -> Self {
        XRef::Unresolved(id)
    }
}

// Handles never leave the process: a reference always serializes as its id.
impl<T: Keyed> Serialize for XRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.id())
    }
}

impl<'de, T> Deserialize<'de> for XRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(XRef::Unresolved)
    }
}

/// Look up a material, tagging a miss with the property that needed it
pub fn resolve_material(registry: &dyn Registry, mid: i64, required_by: &str) -> PropResult<Arc<Material>> {
    registry
        .resolve_material(mid)
        .ok_or_else(|| PropertyError::unresolved(Material::KIND, mid, required_by))
}

/// Look up a coordinate system, tagging a miss with the property that needed it
pub fn resolve_coordinate_system(
    registry: &dyn Registry,
    cid: i64,
    required_by: &str,
) -> PropResult<Arc<CoordinateSystem>> {
    registry
        .resolve_coordinate_system(cid)
        .ok_or_else(|| PropertyError::unresolved(CoordinateSystem::KIND, cid, required_by))
}

/// Resolve a material slot by its current id
pub(crate) fn resolve_slot(registry: &dyn Registry, slot: &MaterialRef, required_by: &str) -> PropResult<MaterialRef> {
    resolve_material(registry, slot.id(), required_by).map(XRef::Resolved)
}
