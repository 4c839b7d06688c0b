//! # Shell Property Records
//!
//! One record type per property card plus [`ShellProperty`], the closed
//! union the rest of a model works with. Every variant answers the same
//! questions (id, thickness, mass per area, material ids, canonical fields)
//! and every answer is a `PropResult`: a query that makes no sense for a
//! card type fails with `UnsupportedOperation` instead of returning a
//! placeholder.
//!
//! ## Cards
//!
//! | card | record | notes |
//! |---|---|---|
//! | PSHELL | [`Pshell`] | up to four materials, membrane/bending/shear/coupling |
//! | PSHEAR | [`Pshear`] | single MAT1 layer |
//! | PCOMP | [`Pcomp`] | laminate, groups of 4 ply fields |
//! | PCOMPG | [`Pcompg`] | laminate with global ply ids, groups of 8 |
//! | PLPLANE | [`Plplane`] | hyperelastic plane strain, no thickness |
//!
//! ## Example
//!
//! ```rust
//! use shell_core::fields::BdfCard;
//! use shell_core::properties::ShellProperty;
//!
//! let card: BdfCard = serde_json::from_str(
//!     r#"["PCOMP", 701512, null, 0.01, null, null, null, null, null,
//!         300704, 0.037, 0.0, "YES", 300704, 0.037, 45.0, "YES"]"#,
//! ).unwrap();
//!
//! let prop = ShellProperty::parse(&card).unwrap();
//! assert_eq!(prop.card_type(), "PCOMP");
//! assert_eq!(prop.pid(), 701512);
//! assert!((prop.thickness().unwrap() - 0.074).abs() < 1e-12);
//! ```

pub mod laminate;
pub mod pcomp;
pub mod pcompg;
pub mod plplane;
pub mod pshear;
pub mod pshell;

pub use laminate::Laminate;
pub use pcomp::{Pcomp, PcompData};
pub use pcompg::Pcompg;
pub use plplane::{Plplane, StressLocation};
pub use pshear::{Pshear, PshearData};
pub use pshell::{Pshell, PshellData};

use serde::{Deserialize, Serialize};

use crate::errors::{PropResult, PropertyError};
use crate::fields::{CardPrinter, Field, FieldSource, FieldWidth};
use crate::materials::{Material, MaterialKind};
use crate::plies::{PlySelect, SmearMethod};
use crate::xref::Registry;

// ============================================================================
// Shared verification rules
// ============================================================================

/// Constitutive types a PSHELL material may have
pub const PSHELL_MATERIALS: &[MaterialKind] = &[
    MaterialKind::Mat1,
    MaterialKind::Mat2,
    MaterialKind::Mat4,
    MaterialKind::Mat5,
    MaterialKind::Mat8,
];

/// Constitutive types a PSHEAR material may have
pub const PSHEAR_MATERIALS: &[MaterialKind] = &[MaterialKind::Mat1];

/// Constitutive types a PLPLANE material may have
pub const PLPLANE_MATERIALS: &[MaterialKind] = &[MaterialKind::Mathe, MaterialKind::Mathp];

pub(crate) fn check_positive_id(pid: i64, field: &str, id: i64) -> PropResult<()> {
    if id <= 0 {
        return Err(PropertyError::validation_failed(
            pid,
            field,
            format!("{} must be positive; {}={}", field, field, id),
        ));
    }
    Ok(())
}

pub(crate) fn check_nsm(pid: i64, nsm: f64) -> PropResult<()> {
    if nsm.is_nan() || nsm < 0.0 {
        return Err(PropertyError::validation_failed(
            pid,
            "nsm",
            format!("non-structural mass must be non-negative; nsm={}", nsm),
        ));
    }
    Ok(())
}

pub(crate) fn check_material_kind(pid: i64, field: &str, material: &Material, allowed: &[MaterialKind]) -> PropResult<()> {
    if !allowed.contains(&material.kind) {
        let names: Vec<&str> = allowed.iter().map(MaterialKind::card_name).collect();
        return Err(PropertyError::validation_failed(
            pid,
            field,
            format!(
                "material {} is a {}; expected one of {}",
                material.mid,
                material.kind.card_name(),
                names.join(", ")
            ),
        ));
    }
    if let Some(constant) = material.missing_isotropic_constant() {
        return Err(PropertyError::validation_failed(
            pid,
            field,
            format!("MAT1 {} has no {}", material.mid, constant),
        ));
    }
    Ok(())
}

// ============================================================================
// Closed property union
// ============================================================================

/// Any shell property card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShellProperty {
    Pshell(Pshell),
    Pshear(Pshear),
    Pcomp(Pcomp),
    Pcompg(Pcompg),
    Plplane(Plplane),
}

impl ShellProperty {
    /// Card names this module can read
    pub const CARDS: [&'static str; 5] = [Pshell::CARD, Pshear::CARD, Pcomp::CARD, Pcompg::CARD, Plplane::CARD];

    /// Read any supported card, dispatching on the name in field 0.
    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        let name = card.card_name().trim().to_uppercase();
        match name.as_str() {
            Pshell::CARD => Pshell::parse(card).map(ShellProperty::Pshell),
            Pshear::CARD => Pshear::parse(card).map(ShellProperty::Pshear),
            Pcomp::CARD => Pcomp::parse(card).map(ShellProperty::Pcomp),
            Pcompg::CARD => Pcompg::parse(card).map(ShellProperty::Pcompg),
            Plplane::CARD => Plplane::parse(card).map(ShellProperty::Plplane),
            _ => Err(PropertyError::invalid_enum("card", name, &Self::CARDS)),
        }
    }

    pub fn card_type(&self) -> &'static str {
        match self {
            ShellProperty::Pshell(_) => Pshell::CARD,
            ShellProperty::Pshear(_) => Pshear::CARD,
            ShellProperty::Pcomp(_) => Pcomp::CARD,
            ShellProperty::Pcompg(_) => Pcompg::CARD,
            ShellProperty::Plplane(_) => Plplane::CARD,
        }
    }

    pub fn pid(&self) -> i64 {
        match self {
            ShellProperty::Pshell(p) => p.pid,
            ShellProperty::Pshear(p) => p.pid,
            ShellProperty::Pcomp(p) => p.laminate.pid,
            ShellProperty::Pcompg(p) => p.laminate.pid,
            ShellProperty::Plplane(p) => p.pid,
        }
    }

    /// The laminate behind a PCOMP or PCOMPG
    pub fn laminate(&self) -> Option<&Laminate> {
        match self {
            ShellProperty::Pcomp(p) => Some(&p.laminate),
            ShellProperty::Pcompg(p) => Some(&p.laminate),
            _ => None,
        }
    }

    fn unsupported(&self, operation: &str) -> PropertyError {
        PropertyError::unsupported(self.card_type(), operation)
    }

    pub fn nonstructural_mass(&self) -> PropResult<f64> {
        match self {
            ShellProperty::Pshell(p) => Ok(p.nsm),
            ShellProperty::Pshear(p) => Ok(p.nsm),
            ShellProperty::Pcomp(p) => Ok(p.laminate.nsm),
            ShellProperty::Pcompg(p) => Ok(p.laminate.nsm),
            ShellProperty::Plplane(_) => Err(self.unsupported("nonstructural_mass")),
        }
    }

    /// Total thickness (whole effective stack for laminates)
    pub fn thickness(&self) -> PropResult<f64> {
        match self {
            ShellProperty::Pshell(p) => p.thickness(),
            ShellProperty::Pshear(p) => Ok(p.t),
            ShellProperty::Pcomp(p) => Ok(p.laminate.total_thickness()),
            ShellProperty::Pcompg(p) => Ok(p.laminate.total_thickness()),
            ShellProperty::Plplane(_) => Err(self.unsupported("thickness")),
        }
    }

    /// Aggregate mass per area; needs resolved materials
    pub fn mass_per_area(&self) -> PropResult<f64> {
        match self {
            ShellProperty::Pshell(p) => p.mass_per_area(),
            ShellProperty::Pshear(p) => p.mass_per_area(),
            ShellProperty::Pcomp(p) => p.laminate.mass_per_area(PlySelect::All, SmearMethod::default()),
            ShellProperty::Pcompg(p) => p.laminate.mass_per_area(PlySelect::All, SmearMethod::default()),
            ShellProperty::Plplane(_) => Err(self.unsupported("mass_per_area")),
        }
    }

    /// Material ids in slot order (effective ply order for laminates)
    pub fn material_ids(&self) -> Vec<i64> {
        match self {
            ShellProperty::Pshell(p) => p.material_ids(),
            ShellProperty::Pshear(p) => vec![p.mid()],
            ShellProperty::Pcomp(p) => p.laminate.material_ids(),
            ShellProperty::Pcompg(p) => p.laminate.material_ids(),
            ShellProperty::Plplane(p) => vec![p.mid()],
        }
    }

    /// Fiber distances: `[z1, z2]` for PSHELL, ply boundaries for laminates
    pub fn z_locations(&self) -> PropResult<Vec<f64>> {
        match self {
            ShellProperty::Pshell(p) => p.z_locations().map(|z| z.to_vec()),
            ShellProperty::Pcomp(p) => Ok(p.laminate.z_locations()),
            ShellProperty::Pcompg(p) => Ok(p.laminate.z_locations()),
            ShellProperty::Pshear(_) | ShellProperty::Plplane(_) => Err(self.unsupported("z_locations")),
        }
    }

    pub fn verify(&self, xref: bool) -> PropResult<()> {
        match self {
            ShellProperty::Pshell(p) => p.verify(xref),
            ShellProperty::Pshear(p) => p.verify(xref),
            ShellProperty::Pcomp(p) => p.verify(xref),
            ShellProperty::Pcompg(p) => p.verify(xref),
            ShellProperty::Plplane(p) => p.verify(xref),
        }
    }

    /// Resolve every foreign key; the record is untouched on failure
    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        match self {
            ShellProperty::Pshell(p) => p.cross_reference(registry),
            ShellProperty::Pshear(p) => p.cross_reference(registry),
            ShellProperty::Pcomp(p) => p.cross_reference(registry),
            ShellProperty::Pcompg(p) => p.cross_reference(registry),
            ShellProperty::Plplane(p) => p.cross_reference(registry),
        }
    }

    pub fn uncross_reference(&mut self) {
        match self {
            ShellProperty::Pshell(p) => p.uncross_reference(),
            ShellProperty::Pshear(p) => p.uncross_reference(),
            ShellProperty::Pcomp(p) => p.uncross_reference(),
            ShellProperty::Pcompg(p) => p.uncross_reference(),
            ShellProperty::Plplane(p) => p.uncross_reference(),
        }
    }

    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        match self {
            ShellProperty::Pshell(p) => p.raw_fields(),
            ShellProperty::Pshear(p) => p.raw_fields(),
            ShellProperty::Pcomp(p) => p.raw_fields(),
            ShellProperty::Pcompg(p) => p.raw_fields(),
            ShellProperty::Plplane(p) => p.raw_fields(),
        }
    }

    /// Canonical fields with defaults blanked
    pub fn repr_fields(&self) -> Vec<Option<Field>> {
        match self {
            ShellProperty::Pshell(p) => p.repr_fields(),
            ShellProperty::Pshear(p) => p.repr_fields(),
            ShellProperty::Pcomp(p) => p.repr_fields(),
            ShellProperty::Pcompg(p) => p.repr_fields(),
            ShellProperty::Plplane(p) => p.raw_fields(),
        }
    }

    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        match self {
            ShellProperty::Pshell(p) => p.update_field(index, value),
            ShellProperty::Pshear(p) => p.update_field(index, value),
            ShellProperty::Pcomp(p) => p.update_field(index, value),
            ShellProperty::Pcompg(p) => p.update_field(index, value),
            ShellProperty::Plplane(p) => p.update_field(index, value),
        }
    }

    /// Render the canonical fields. PLPLANE is always written with 8-column fields.
    pub fn write_card(&self, printer: &dyn CardPrinter, width: FieldWidth) -> String {
        let width = match self {
            ShellProperty::Plplane(_) => FieldWidth::Short,
            _ => width,
        };
        printer.print_card(&self.repr_fields(), width)
    }

    /// Field-by-field equivalence, ignoring the property id
    pub fn is_same_card(&self, other: &ShellProperty) -> bool {
        match (self, other) {
            (ShellProperty::Pshell(a), ShellProperty::Pshell(b)) => a.is_same_card(b),
            (ShellProperty::Pshear(a), ShellProperty::Pshear(b)) => a.is_same_card(b),
            (ShellProperty::Pcomp(a), ShellProperty::Pcomp(b)) => a.is_same_card(b),
            (ShellProperty::Pcompg(a), ShellProperty::Pcompg(b)) => a.is_same_card(b),
            (ShellProperty::Plplane(a), ShellProperty::Plplane(b)) => a.is_same_card(b),
            _ => false,
        }
    }
}

impl From<Pshell> for ShellProperty {
    fn from(p: Pshell) -> Self {
        ShellProperty::Pshell(p)
    }
}

impl From<Pshear> for ShellProperty {
    fn from(p: Pshear) -> Self {
        ShellProperty::Pshear(p)
    }
}

impl From<Pcomp> for ShellProperty {
    fn from(p: Pcomp) -> Self {
        ShellProperty::Pcomp(p)
    }
}

impl From<Pcompg> for ShellProperty {
    fn from(p: Pcompg) -> Self {
        ShellProperty::Pcompg(p)
    }
}

impl From<Plplane> for ShellProperty {
    fn from(p: Plplane) -> Self {
        ShellProperty::Plplane(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::BdfCard;
    use crate::materials::ModelRegistry;

    fn card(json: serde_json::Value) -> BdfCard {
        serde_json::from_value(json).unwrap()
    }

    /// Joins fields with a column separator so tests can see the width
    struct PipePrinter;

    impl CardPrinter for PipePrinter {
        fn print_card_8(&self, fields: &[Option<Field>]) -> String {
            render(fields, 8)
        }

        fn print_card_16(&self, fields: &[Option<Field>]) -> String {
            render(fields, 16)
        }
    }

    fn render(fields: &[Option<Field>], width: usize) -> String {
        fields
            .iter()
            .map(|f| {
                let text = f.as_ref().map(|v| v.to_string()).unwrap_or_default();
                format!("{:<width$}", text, width = width)
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    #[test]
    fn test_dispatch_on_card_name() {
        let shell = ShellProperty::parse(&card(serde_json::json!(["PSHELL", 1, 2, 0.1]))).unwrap();
        assert_eq!(shell.card_type(), "PSHELL");
        let shear = ShellProperty::parse(&card(serde_json::json!(["pshear", 3, 4, 0.2]))).unwrap();
        assert_eq!(shear.card_type(), "PSHEAR");
        assert_eq!(shear.pid(), 3);

        let err = ShellProperty::parse(&card(serde_json::json!(["PSOLID", 1, 2]))).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidEnumValue { ref field, .. } if field == "card"));
    }

    #[test]
    fn test_unsupported_queries() {
        let plane = ShellProperty::parse(&card(serde_json::json!(["PLPLANE", 5, 6]))).unwrap();
        assert_eq!(plane.thickness().unwrap_err().error_code(), "UNSUPPORTED_OPERATION");
        assert_eq!(plane.mass_per_area().unwrap_err().error_code(), "UNSUPPORTED_OPERATION");
        assert_eq!(plane.material_ids(), vec![6]);

        let shear = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 3, 4, 0.2]))).unwrap();
        assert!(shear.z_locations().is_err());
    }

    #[test]
    fn test_laminate_queries() {
        let prop = ShellProperty::parse(&card(serde_json::json!([
            "PCOMP", 701512, null, 0.01, null, null, null, null, null,
            300704, 0.037, 0.0, "YES", 300704, 0.037, 45.0, "YES"
        ])))
        .unwrap();
        assert_eq!(prop.nonstructural_mass().unwrap(), 0.01);
        assert_eq!(prop.material_ids(), vec![300704, 300704]);
        assert_eq!(prop.laminate().map(|l| l.nplies()), Some(2));
        assert_eq!(prop.z_locations().unwrap().len(), 3);
    }

    #[test]
    fn test_cross_reference_round_trip() {
        let registry = ModelRegistry::from_materials([Material::isotropic(4, 1.0e7, 3.8e6, 0.3, 0.1)]);
        let original = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 3, 4, 0.2]))).unwrap();

        let mut prop = original.clone();
        prop.cross_reference(&registry).unwrap();
        assert!((prop.mass_per_area().unwrap() - 0.02).abs() < 1e-12);
        prop.uncross_reference();
        assert_eq!(prop, original);
    }

    #[test]
    fn test_write_card_width() {
        let shell = ShellProperty::parse(&card(serde_json::json!(["PSHELL", 1, 2, 0.1]))).unwrap();
        let long = shell.write_card(&PipePrinter, FieldWidth::Long);
        assert!(long.starts_with(&format!("{:<16}|", "PSHELL")));

        let plane = ShellProperty::parse(&card(serde_json::json!(["PLPLANE", 5, 6]))).unwrap();
        let text = plane.write_card(&PipePrinter, FieldWidth::Long);
        assert!(text.starts_with(&format!("{:<8}|", "PLPLANE")));
    }

    #[test]
    fn test_is_same_card_ignores_pid() {
        let a = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 3, 4, 0.2]))).unwrap();
        let b = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 9, 4, 0.2]))).unwrap();
        let c = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 3, 4, 0.3]))).unwrap();
        assert!(a.is_same_card(&b));
        assert!(!a.is_same_card(&c));

        let shell = ShellProperty::parse(&card(serde_json::json!(["PSHELL", 3, 4, 0.2]))).unwrap();
        assert!(!a.is_same_card(&shell));
    }

    #[test]
    fn test_json_tagged() {
        let prop = ShellProperty::parse(&card(serde_json::json!(["PSHEAR", 3, 4, 0.2]))).unwrap();
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(json["type"], "Pshear");
        assert_eq!(json["mid"], 4);
        let back: ShellProperty = serde_json::from_value(json).unwrap();
        assert_eq!(back, prop);
    }

    #[test]
    fn test_negative_nsm_fails_verify() {
        let cards = [
            serde_json::json!(["PSHELL", 1, 2, 0.1, null, null, null, null, -1.0]),
            serde_json::json!(["PSHEAR", 2, 4, 0.2, -1.0]),
            serde_json::json!(["PCOMP", 3, null, -1.0, null, null, null, null, null, 10, 0.1]),
            serde_json::json!(["PCOMPG", 4, null, -1.0, null, null, null, null, null, 1001, 10, 0.1]),
        ];
        for json in cards {
            let mut prop = ShellProperty::parse(&card(json)).unwrap();
            let err = prop.verify(false).unwrap_err();
            assert_eq!(
                err,
                PropertyError::validation_failed(prop.pid(), "nsm", "non-structural mass must be non-negative; nsm=-1")
            );

            prop.update_field(nsm_index(&prop), None).unwrap();
            prop.verify(false).unwrap();
        }
    }

    fn nsm_index(prop: &ShellProperty) -> usize {
        match prop {
            ShellProperty::Pshell(_) => 8,
            ShellProperty::Pshear(_) => 4,
            _ => 3,
        }
    }
}
