//! # Materials and Coordinate Systems
//!
//! The handles a shell property resolves its foreign keys to. Only the data
//! the shell properties read is modelled: the constitutive card type (for
//! verification), the density (for mass per area) and the isotropic moduli
//! checked on MAT1 entries.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::materials::{Material, MaterialKind};
//!
//! let aluminum = Material::isotropic(1, 10.3e6, 3.9e6, 0.33, 2.59e-4);
//! assert_eq!(aluminum.kind, MaterialKind::Mat1);
//! assert_eq!(aluminum.kind.card_name(), "MAT1");
//! ```

pub mod registry;

pub use registry::{ModelRegistry, Registry};

use serde::{Deserialize, Serialize};

use crate::xref::Keyed;

/// Constitutive card type of a material entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaterialKind {
    /// Isotropic
    Mat1,
    /// Anisotropic (2D)
    Mat2,
    /// Thermal, isotropic
    Mat4,
    /// Thermal, anisotropic
    Mat5,
    /// Orthotropic (2D)
    Mat8,
    /// Hyperelastic
    Mathe,
    /// Hyperelastic (polynomial)
    Mathp,
}

impl MaterialKind {
    /// All material kinds
    pub const ALL: [MaterialKind; 7] = [
        MaterialKind::Mat1,
        MaterialKind::Mat2,
        MaterialKind::Mat4,
        MaterialKind::Mat5,
        MaterialKind::Mat8,
        MaterialKind::Mathe,
        MaterialKind::Mathp,
    ];

    /// Bulk data card name
    pub fn card_name(&self) -> &'static str {
        match self {
            MaterialKind::Mat1 => "MAT1",
            MaterialKind::Mat2 => "MAT2",
            MaterialKind::Mat4 => "MAT4",
            MaterialKind::Mat5 => "MAT5",
            MaterialKind::Mat8 => "MAT8",
            MaterialKind::Mathe => "MATHE",
            MaterialKind::Mathp => "MATHP",
        }
    }

    pub fn is_hyperelastic(&self) -> bool {
        matches!(self, MaterialKind::Mathe | MaterialKind::Mathp)
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.card_name())
    }
}

/// A material entry as seen by shell properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material id
    pub mid: i64,
    /// Card type
    pub kind: MaterialKind,
    /// Mass density
    #[serde(default)]
    pub rho: f64,
    /// Young's modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<f64>,
    /// Shear modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    /// Poisson's ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<f64>,
}

impl Material {
    /// Create a material with no density or moduli
    pub fn new(mid: i64, kind: MaterialKind) -> Self {
        Material {
            mid,
            kind,
            rho: 0.0,
            e: None,
            g: None,
            nu: None,
        }
    }

    /// Create a MAT1 entry
    pub fn isotropic(mid: i64, e: f64, g: f64, nu: f64, rho: f64) -> Self {
        Material {
            mid,
            kind: MaterialKind::Mat1,
            rho,
            e: Some(e),
            g: Some(g),
            nu: Some(nu),
        }
    }

    /// Set the density
    pub fn with_density(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Name of the first isotropic modulus missing from a MAT1 entry
    pub fn missing_isotropic_constant(&self) -> Option<&'static str> {
        if self.kind != MaterialKind::Mat1 {
            return None;
        }
        [("E", self.e), ("G", self.g), ("nu", self.nu)]
            .into_iter()
            .find(|(_, value)| value.map_or(true, |v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

impl Keyed for Material {
    const KIND: &'static str = "material";

    fn key(&self) -> i64 {
        self.mid
    }
}

/// A coordinate system entry. Only the id is needed by shell properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub cid: i64,
}

impl CoordinateSystem {
    /// The basic rectangular system, always present
    pub const BASIC: i64 = 0;

    pub fn new(cid: i64) -> Self {
        CoordinateSystem { cid }
    }
}

impl Keyed for CoordinateSystem {
    const KIND: &'static str = "coordinate system";

    fn key(&self) -> i64 {
        self.cid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_serialization() {
        let mat = Material::isotropic(3, 1.0e7, 3.8e6, 0.3, 0.1);
        let json = serde_json::to_string(&mat).unwrap();
        assert!(json.contains("\"kind\":\"MAT1\""));
        let parsed: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(mat, parsed);
    }

    #[test]
    fn test_material_defaults_from_json() {
        let mat: Material = serde_json::from_str(r#"{"mid": 300704, "kind": "MAT8", "rho": 1.5e-4}"#).unwrap();
        assert_eq!(mat.kind, MaterialKind::Mat8);
        assert_eq!(mat.e, None);
        assert_eq!(mat.missing_isotropic_constant(), None);
    }

    #[test]
    fn test_missing_isotropic_constant() {
        let mut mat = Material::isotropic(1, 1.0e7, 3.8e6, 0.3, 0.1);
        assert_eq!(mat.missing_isotropic_constant(), None);
        mat.g = None;
        assert_eq!(mat.missing_isotropic_constant(), Some("G"));
        mat.e = Some(f64::NAN);
        assert_eq!(mat.missing_isotropic_constant(), Some("E"));
    }

    #[test]
    fn test_kind_names() {
        for kind in MaterialKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.card_name()));
        }
        assert!(MaterialKind::Mathp.is_hyperelastic());
        assert!(!MaterialKind::Mat8.is_hyperelastic());
    }

    #[test]
    fn test_keys() {
        assert_eq!(Material::new(12, MaterialKind::Mat2).key(), 12);
        assert_eq!(CoordinateSystem::new(5).key(), 5);
        assert_eq!(<Material as Keyed>::KIND, "material");
    }
}
