//! # PSHEAR - Shear Panel Property
//!
//! ```text
//! +--------+-----+-----+---+-----+----+----+
//! | PSHEAR | PID | MID | T | NSM | F1 | F2 |
//! +--------+-----+-----+---+-----+----+----+
//! ```
//!
//! A single isotropic (MAT1) layer of strictly positive thickness. `F1`/`F2`
//! are effectiveness factors for extensional stiffeners.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{check_material_kind, check_nsm, check_positive_id, PSHEAR_MATERIALS};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{
    apply_update, blank_if_default, fields_match, float_slot, integer_slot, optional_float, required, required_float,
    required_integer, Field, FieldMap, FieldSlot, FieldSource,
};
use crate::settings::Settings;
use crate::xref::{resolve_slot, MaterialRef, Registry};

const CARD: &str = "PSHEAR";

/// Shear panel property (CSHEAR elements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pshear {
    /// Property id
    pub pid: i64,
    /// Material (MAT1)
    pub mid: MaterialRef,
    /// Thickness, > 0
    pub t: f64,
    /// Non-structural mass per area
    pub nsm: f64,
    /// Effectiveness factor for extensional stiffeners, 1-direction
    pub f1: f64,
    /// Effectiveness factor for extensional stiffeners, 2-direction
    pub f2: f64,
}

/// Binary tuple layout `(pid, mid, t, nsm, f1, f2)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PshearData {
    pub pid: i64,
    pub mid: i64,
    pub t: f64,
    pub nsm: f64,
    pub f1: f64,
    pub f2: f64,
}

fn check_thickness(pid: i64, t: f64) -> PropResult<()> {
    if t.is_nan() || t <= 0.0 {
        return Err(PropertyError::validation_failed(
            pid,
            "t",
            format!("PSHEAR thickness must be positive; t={}", t),
        ));
    }
    Ok(())
}

static PSHEAR_FIELDS: Lazy<FieldMap<Pshear>> = Lazy::new(|| {
    let mut map: FieldMap<Pshear> = HashMap::new();
    map.insert(1, FieldSlot {
        name: "pid",
        set: |p, v| {
            p.pid = required(integer_slot(v, "pid", 1)?, CARD, "pid", 1)?;
            Ok(())
        },
    });
    map.insert(2, FieldSlot {
        name: "mid",
        set: |p, v| {
            p.mid = MaterialRef::Unresolved(required(integer_slot(v, "mid", 2)?, CARD, "mid", 2)?);
            Ok(())
        },
    });
    map.insert(3, FieldSlot {
        name: "t",
        set: |p, v| {
            let t = required(float_slot(v, "t", 3)?, CARD, "t", 3)?;
            check_thickness(p.pid, t)?;
            p.t = t;
            Ok(())
        },
    });
    map.insert(4, FieldSlot {
        name: "nsm",
        set: |p, v| {
            p.nsm = float_slot(v, "nsm", 4)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(5, FieldSlot {
        name: "f1",
        set: |p, v| {
            p.f1 = float_slot(v, "f1", 5)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(6, FieldSlot {
        name: "f2",
        set: |p, v| {
            p.f2 = float_slot(v, "f2", 6)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map
});

impl Pshear {
    pub const CARD: &'static str = CARD;

    /// Read a PSHEAR card.
    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        let pid = required_integer(card, 1, "pid")?;
        let mid = required_integer(card, 2, "mid")?;
        let t = required_float(card, 3, "t")?;
        let nsm = optional_float(card, 4, "nsm", 0.0)?;
        let f1 = optional_float(card, 5, "f1", 0.0)?;
        let f2 = optional_float(card, 6, "f2", 0.0)?;
        check_thickness(pid, t)?;
        if card.nfields() > 7 {
            return Err(PropertyError::field_mismatch(
                CARD,
                card.nfields() - 1,
                "PSHEAR has 6 fields",
            ));
        }
        tracing::debug!(pid, mid, t, "parsed PSHEAR");

        Ok(Pshear {
            pid,
            mid: MaterialRef::Unresolved(mid),
            t,
            nsm,
            f1,
            f2,
        })
    }

    /// Build from a binary tuple
    pub fn from_data(data: &PshearData, settings: &Settings) -> PropResult<Self> {
        if let Err(err) = check_thickness(data.pid, data.t) {
            if !settings.legacy_binary_thickness {
                return Err(err);
            }
            tracing::warn!(pid = data.pid, t = data.t, "accepting non-positive PSHEAR thickness from binary data");
        }
        Ok(Pshear {
            pid: data.pid,
            mid: MaterialRef::Unresolved(data.mid),
            t: data.t,
            nsm: data.nsm,
            f1: data.f1,
            f2: data.f2,
        })
    }

    fn required_by(&self) -> String {
        format!("{} pid={}", CARD, self.pid)
    }

    pub fn mid(&self) -> i64 {
        self.mid.id()
    }

    /// Density of the resolved material
    pub fn rho(&self) -> PropResult<f64> {
        Ok(self.mid.require(self.required_by())?.rho)
    }

    /// `nsm + rho * t`
    pub fn mass_per_area(&self) -> PropResult<f64> {
        Ok(self.nsm + self.rho()? * self.t)
    }

    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        self.mid = resolve_slot(registry, &self.mid, &self.required_by())?;
        tracing::debug!(pid = self.pid, mid = self.mid(), "cross-referenced PSHEAR");
        Ok(())
    }

    pub fn uncross_reference(&mut self) {
        self.mid.unresolve();
    }

    /// Check ids and thickness; with `xref`, also the resolved material.
    pub fn verify(&self, xref: bool) -> PropResult<()> {
        check_positive_id(self.pid, "pid", self.pid)?;
        check_positive_id(self.pid, "mid", self.mid())?;
        check_thickness(self.pid, self.t)?;
        check_nsm(self.pid, self.nsm)?;
        if xref {
            let material = self.mid.require(self.required_by())?;
            check_material_kind(self.pid, "mid", material, PSHEAR_MATERIALS)?;
        }
        Ok(())
    }

    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(CARD)),
            Some(Field::from(self.pid)),
            Some(Field::from(self.mid())),
            Some(Field::from(self.t)),
            Some(Field::from(self.nsm)),
            Some(Field::from(self.f1)),
            Some(Field::from(self.f2)),
        ]
    }

    pub fn repr_fields(&self) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(CARD)),
            Some(Field::from(self.pid)),
            Some(Field::from(self.mid())),
            Some(Field::from(self.t)),
            blank_if_default(self.nsm, 0.0),
            blank_if_default(self.f1, 0.0),
            blank_if_default(self.f2, 0.0),
        ]
    }

    /// Edit one field by its 1-based card position
    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        apply_update(&PSHEAR_FIELDS, CARD, self, index, value)
    }

    /// Same card content apart from the property id
    pub fn is_same_card(&self, other: &Pshear) -> bool {
        fields_match(&self.raw_fields()[2..], &other.raw_fields()[2..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::BdfCard;
    use crate::materials::{Material, MaterialKind, ModelRegistry};

    fn card(json: serde_json::Value) -> BdfCard {
        serde_json::from_value(json).unwrap()
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::from_materials([Material::isotropic(20, 1.0e7, 3.8e6, 0.3, 0.1)])
    }

    #[test]
    fn test_parse_defaults() {
        let p = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05]))).unwrap();
        assert_eq!(p.pid, 10);
        assert_eq!(p.mid(), 20);
        assert_eq!(p.t, 0.05);
        assert_eq!((p.nsm, p.f1, p.f2), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_requires_positive_thickness() {
        let err = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.0]))).unwrap_err();
        assert!(matches!(err, PropertyError::ValidationFailed { pid: 10, ref field, .. } if field == "t"));

        let err = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20]))).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_REQUIRED_FIELD");
    }

    #[test]
    fn test_parse_rejects_extra_fields() {
        let err = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05, null, null, null, 1.0]))).unwrap_err();
        assert_eq!(err.error_code(), "FIELD_COUNT_MISMATCH");
    }

    #[test]
    fn test_mass_per_area() {
        let mut p = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05, 0.2]))).unwrap();
        assert_eq!(p.mass_per_area().unwrap_err().error_code(), "UNRESOLVED_REFERENCE");

        p.cross_reference(&registry()).unwrap();
        assert!((p.mass_per_area().unwrap() - (0.2 + 0.1 * 0.05)).abs() < 1e-12);
        p.verify(true).unwrap();
    }

    #[test]
    fn test_verify_rejects_wrong_material_kind() {
        let mut p = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05]))).unwrap();
        let registry = ModelRegistry::from_materials([Material::new(20, MaterialKind::Mat8).with_density(0.1)]);
        p.cross_reference(&registry).unwrap();
        let err = p.verify(true).unwrap_err();
        assert!(matches!(err, PropertyError::ValidationFailed { ref field, .. } if field == "mid"));
        // without xref only the ids are checked
        p.verify(false).unwrap();
    }

    #[test]
    fn test_repr_blanks_defaults() {
        let p = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05, 0.0, 0.5]))).unwrap();
        let repr = p.repr_fields();
        assert_eq!(repr[4], None);
        assert_eq!(repr[5], Some(Field::Float(0.5)));
        assert_eq!(repr[6], None);
        assert_eq!(p.raw_fields()[4], Some(Field::Float(0.0)));
    }

    #[test]
    fn test_update_field() {
        let mut p = Pshear::parse(&card(serde_json::json!(["PSHEAR", 10, 20, 0.05]))).unwrap();
        p.update_field(4, Some(&Field::Float(0.3))).unwrap();
        assert_eq!(p.nsm, 0.3);
        p.update_field(4, None).unwrap();
        assert_eq!(p.nsm, 0.0);

        assert_eq!(p.update_field(3, Some(&Field::Float(-1.0))).unwrap_err().error_code(), "VALIDATION_FAILED");
        assert_eq!(p.t, 0.05);
        assert_eq!(p.update_field(7, None).unwrap_err().error_code(), "FIELD_COUNT_MISMATCH");
        assert_eq!(p.update_field(2, Some(&Field::Float(1.0))).unwrap_err().error_code(), "INVALID_FIELD_TYPE");
    }

    #[test]
    fn test_from_data_strictness() {
        let data = PshearData { pid: 1, mid: 2, t: 0.0, nsm: 0.0, f1: 0.0, f2: 0.0 };
        assert!(Pshear::from_data(&data, &Settings::default()).is_err());

        let legacy = Settings { legacy_binary_thickness: true, ..Settings::default() };
        let p = Pshear::from_data(&data, &legacy).unwrap();
        assert_eq!(p.t, 0.0);
    }
}
