//! # PSHELL - Shell Element Property
//!
//! ```text
//! +--------+-----+------+-----+------+----------+------+------+-----+
//! | PSHELL | PID | MID1 |  T  | MID2 | 12I/T**3 | MID3 | TS/T | NSM |
//! +--------+-----+------+-----+------+----------+------+------+-----+
//! |        | Z1  |  Z2  | MID4|      |          |      |      |     |
//! +--------+-----+------+-----+------+----------+------+------+-----+
//! ```
//!
//! Membrane (`MID1`), bending (`MID2`), transverse shear (`MID3`) and
//! membrane-bending coupling (`MID4`) materials, any of which may be blank.
//! `MID2 = -1` selects plane strain and is never cross-referenced.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{check_material_kind, check_nsm, check_positive_id, PSHELL_MATERIALS};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{
    apply_update, blank_if_default, fields_match, float_or_blank, float_slot, integer_or_blank, integer_slot,
    optional_float, required, required_integer, Field, FieldMap, FieldSlot, FieldSource,
};
use crate::materials::Material;
use crate::settings::Settings;
use crate::xref::{resolve_slot, MaterialRef, Registry};

const CARD: &str = "PSHELL";

/// Bending stiffness ratio `12I/t^3` when blank
pub const TWELVE_I_T3_DEFAULT: f64 = 1.0;

/// Transverse shear thickness ratio `ts/t` when blank
pub const TST_DEFAULT: f64 = 0.833333;

/// `MID2` sentinel for plane strain
pub const PLANE_STRAIN: i64 = -1;

/// Shell element property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pshell {
    pub pid: i64,
    /// Membrane material
    pub mid1: Option<MaterialRef>,
    /// Default membrane thickness, >= 0
    pub t: Option<f64>,
    /// Bending material, or -1 for plane strain
    pub mid2: Option<MaterialRef>,
    /// Bending moment of inertia ratio
    pub twelve_i_t3: f64,
    /// Transverse shear material
    pub mid3: Option<MaterialRef>,
    /// Transverse shear thickness ratio
    pub tst: f64,
    /// Non-structural mass per area
    pub nsm: f64,
    /// Fiber distance for stress recovery, bottom
    pub z1: Option<f64>,
    /// Fiber distance for stress recovery, top
    pub z2: Option<f64>,
    /// Membrane-bending coupling material
    pub mid4: Option<MaterialRef>,
}

/// Binary tuple layout
/// `(pid, mid1, t, mid2, 12I/t^3, mid3, ts/t, nsm, z1, z2, mid4)`.
///
/// A material id of 0 stands for a blank slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PshellData {
    pub pid: i64,
    pub mid1: i64,
    pub t: f64,
    pub mid2: i64,
    pub twelve_i_t3: f64,
    pub mid3: i64,
    pub tst: f64,
    pub nsm: f64,
    pub z1: f64,
    pub z2: f64,
    pub mid4: i64,
}

fn check_thickness(pid: i64, t: Option<f64>) -> PropResult<()> {
    match t {
        Some(t) if t.is_nan() || t < 0.0 => Err(PropertyError::validation_failed(
            pid,
            "t",
            format!("PSHELL thickness must be >= 0; t={}", t),
        )),
        _ => Ok(()),
    }
}

fn material_slot(id: Option<i64>) -> Option<MaterialRef> {
    id.map(MaterialRef::Unresolved)
}

fn binary_slot(id: i64) -> Option<MaterialRef> {
    (id != 0).then_some(MaterialRef::Unresolved(id))
}

fn is_plane_strain(slot: &MaterialRef) -> bool {
    matches!(slot, MaterialRef::Unresolved(PLANE_STRAIN))
}

static PSHELL_FIELDS: Lazy<FieldMap<Pshell>> = Lazy::new(|| {
    let mut map: FieldMap<Pshell> = HashMap::new();
    map.insert(1, FieldSlot {
        name: "pid",
        set: |p, v| {
            p.pid = required(integer_slot(v, "pid", 1)?, CARD, "pid", 1)?;
            Ok(())
        },
    });
    map.insert(2, FieldSlot {
        name: "mid1",
        set: |p, v| {
            p.mid1 = material_slot(integer_slot(v, "mid1", 2)?);
            Ok(())
        },
    });
    map.insert(3, FieldSlot {
        name: "t",
        set: |p, v| {
            let t = float_slot(v, "t", 3)?;
            check_thickness(p.pid, t)?;
            p.t = t;
            Ok(())
        },
    });
    map.insert(4, FieldSlot {
        name: "mid2",
        set: |p, v| {
            p.mid2 = material_slot(integer_slot(v, "mid2", 4)?);
            Ok(())
        },
    });
    map.insert(5, FieldSlot {
        name: "12I/t^3",
        set: |p, v| {
            p.twelve_i_t3 = float_slot(v, "12I/t^3", 5)?.unwrap_or(TWELVE_I_T3_DEFAULT);
            Ok(())
        },
    });
    map.insert(6, FieldSlot {
        name: "mid3",
        set: |p, v| {
            p.mid3 = material_slot(integer_slot(v, "mid3", 6)?);
            Ok(())
        },
    });
    map.insert(7, FieldSlot {
        name: "ts/t",
        set: |p, v| {
            p.tst = float_slot(v, "ts/t", 7)?.unwrap_or(TST_DEFAULT);
            Ok(())
        },
    });
    map.insert(8, FieldSlot {
        name: "nsm",
        set: |p, v| {
            p.nsm = float_slot(v, "nsm", 8)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(9, FieldSlot {
        name: "z1",
        set: |p, v| {
            p.z1 = float_slot(v, "z1", 9)?.or(p.t.map(|t| -t / 2.0));
            Ok(())
        },
    });
    map.insert(10, FieldSlot {
        name: "z2",
        set: |p, v| {
            p.z2 = float_slot(v, "z2", 10)?.or(p.t.map(|t| t / 2.0));
            Ok(())
        },
    });
    map.insert(11, FieldSlot {
        name: "mid4",
        set: |p, v| {
            p.mid4 = material_slot(integer_slot(v, "mid4", 11)?);
            Ok(())
        },
    });
    map
});

impl Pshell {
    pub const CARD: &'static str = CARD;

    /// Read a PSHELL card.
    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        let pid = required_integer(card, 1, "pid")?;
        let mid1 = integer_or_blank(card, 2, "mid1")?;
        let t = float_or_blank(card, 3, "t")?;
        check_thickness(pid, t)?;
        let mid2 = integer_or_blank(card, 4, "mid2")?;
        let twelve_i_t3 = optional_float(card, 5, "12I/t^3", TWELVE_I_T3_DEFAULT)?;
        let mid3 = integer_or_blank(card, 6, "mid3")?;
        let tst = optional_float(card, 7, "ts/t", TST_DEFAULT)?;
        let nsm = optional_float(card, 8, "nsm", 0.0)?;
        let (z1, z2) = match t {
            Some(t) => (
                Some(optional_float(card, 9, "z1", -t / 2.0)?),
                Some(optional_float(card, 10, "z2", t / 2.0)?),
            ),
            None => (float_or_blank(card, 9, "z1")?, float_or_blank(card, 10, "z2")?),
        };
        let mid4 = integer_or_blank(card, 11, "mid4")?;
        if card.nfields() > 12 {
            return Err(PropertyError::field_mismatch(
                CARD,
                card.nfields() - 1,
                "PSHELL has 11 fields",
            ));
        }
        tracing::debug!(pid, ?mid1, ?t, ?mid2, "parsed PSHELL");

        Ok(Pshell {
            pid,
            mid1: material_slot(mid1),
            t,
            mid2: material_slot(mid2),
            twelve_i_t3,
            mid3: material_slot(mid3),
            tst,
            nsm,
            z1,
            z2,
            mid4: material_slot(mid4),
        })
    }

    /// Build from a binary tuple
    pub fn from_data(data: &PshellData, settings: &Settings) -> PropResult<Self> {
        if let Err(err) = check_thickness(data.pid, Some(data.t)) {
            if !settings.legacy_binary_thickness {
                return Err(err);
            }
            tracing::warn!(pid = data.pid, t = data.t, "accepting negative PSHELL thickness from binary data");
        }
        Ok(Pshell {
            pid: data.pid,
            mid1: binary_slot(data.mid1),
            t: Some(data.t),
            mid2: binary_slot(data.mid2),
            twelve_i_t3: data.twelve_i_t3,
            mid3: binary_slot(data.mid3),
            tst: data.tst,
            nsm: data.nsm,
            z1: Some(data.z1),
            z2: Some(data.z2),
            mid4: binary_slot(data.mid4),
        })
    }

    fn required_by(&self) -> String {
        format!("{} pid={}", CARD, self.pid)
    }

    fn slots(&self) -> [(&'static str, &Option<MaterialRef>); 4] {
        [("mid1", &self.mid1), ("mid2", &self.mid2), ("mid3", &self.mid3), ("mid4", &self.mid4)]
    }

    pub fn mid1(&self) -> Option<i64> {
        self.mid1.as_ref().map(MaterialRef::id)
    }

    pub fn mid2(&self) -> Option<i64> {
        self.mid2.as_ref().map(MaterialRef::id)
    }

    pub fn mid3(&self) -> Option<i64> {
        self.mid3.as_ref().map(MaterialRef::id)
    }

    pub fn mid4(&self) -> Option<i64> {
        self.mid4.as_ref().map(MaterialRef::id)
    }

    /// Membrane material if present, else the bending material
    pub fn primary_material(&self) -> Option<&MaterialRef> {
        self.mid1.as_ref().or(self.mid2.as_ref())
    }

    /// Non-blank material ids in slot order
    pub fn material_ids(&self) -> Vec<i64> {
        self.slots()
            .iter()
            .filter_map(|(_, slot)| slot.as_ref().map(MaterialRef::id))
            .collect()
    }

    pub fn thickness(&self) -> PropResult<f64> {
        self.t.ok_or_else(|| PropertyError::missing_field(CARD, "t", 3))
    }

    /// Density of the primary material
    pub fn rho(&self) -> PropResult<f64> {
        let primary = self
            .primary_material()
            .ok_or_else(|| PropertyError::missing_field(CARD, "mid1", 2))?;
        Ok(primary.require(self.required_by())?.rho)
    }

    /// `nsm + rho * t`
    pub fn mass_per_area(&self) -> PropResult<f64> {
        let t = self.thickness()?;
        Ok(self.nsm + self.rho()? * t)
    }

    /// Fiber distances `[z1, z2]`
    pub fn z_locations(&self) -> PropResult<[f64; 2]> {
        let z1 = self.z1.ok_or_else(|| PropertyError::missing_field(CARD, "z1", 9))?;
        let z2 = self.z2.ok_or_else(|| PropertyError::missing_field(CARD, "z2", 10))?;
        Ok([z1, z2])
    }

    /// Resolve mid1..mid4, leaving blanks and the plane strain sentinel alone
    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        let required_by = self.required_by();
        let resolve = |slot: &Option<MaterialRef>| -> PropResult<Option<MaterialRef>> {
            match slot {
                Some(m) if !is_plane_strain(m) => resolve_slot(registry, m, &required_by).map(Some),
                other => Ok(other.clone()),
            }
        };
        let mid1 = resolve(&self.mid1)?;
        let mid2 = resolve(&self.mid2)?;
        let mid3 = resolve(&self.mid3)?;
        let mid4 = resolve(&self.mid4)?;

        self.mid1 = mid1;
        self.mid2 = mid2;
        self.mid3 = mid3;
        self.mid4 = mid4;
        tracing::debug!(pid = self.pid, mids = ?self.material_ids(), "cross-referenced PSHELL");
        Ok(())
    }

    pub fn uncross_reference(&mut self) {
        for slot in [&mut self.mid1, &mut self.mid2, &mut self.mid3, &mut self.mid4]
            .into_iter()
            .flatten()
        {
            slot.unresolve();
        }
    }

    /// Check ids and thickness; with `xref`, also every resolved material.
    pub fn verify(&self, xref: bool) -> PropResult<()> {
        check_positive_id(self.pid, "pid", self.pid)?;
        if self.slots().iter().all(|(_, slot)| slot.is_none()) {
            return Err(PropertyError::validation_failed(
                self.pid,
                "mid1",
                "at least one of mid1, mid2, mid3, mid4 is required",
            ));
        }
        for (name, slot) in self.slots() {
            match slot {
                Some(m) if name == "mid2" && is_plane_strain(m) => {}
                Some(m) => check_positive_id(self.pid, name, m.id())?,
                None => {}
            }
        }
        check_thickness(self.pid, self.t)?;
        check_nsm(self.pid, self.nsm)?;

        if xref {
            for (name, slot) in self.slots() {
                let Some(m) = slot else { continue };
                if is_plane_strain(m) {
                    continue;
                }
                let material: &Material = m.require(self.required_by())?;
                check_material_kind(self.pid, name, material, PSHELL_MATERIALS)?;
            }
            if self.t.is_some() {
                let mass_per_area = self.mass_per_area()?;
                if !mass_per_area.is_finite() {
                    return Err(PropertyError::validation_failed(
                        self.pid,
                        "nsm",
                        format!("mass per area is not finite: {}", mass_per_area),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(CARD)),
            Some(Field::from(self.pid)),
            self.mid1().map(Field::from),
            self.t.map(Field::from),
            self.mid2().map(Field::from),
            Some(Field::from(self.twelve_i_t3)),
            self.mid3().map(Field::from),
            Some(Field::from(self.tst)),
            Some(Field::from(self.nsm)),
            self.z1.map(Field::from),
            self.z2.map(Field::from),
            self.mid4().map(Field::from),
        ]
    }

    pub fn repr_fields(&self) -> Vec<Option<Field>> {
        let (z1, z2) = match self.t {
            Some(t) => (
                self.z1.and_then(|z| blank_if_default(z, -t / 2.0)),
                self.z2.and_then(|z| blank_if_default(z, t / 2.0)),
            ),
            None => (self.z1.map(Field::from), self.z2.map(Field::from)),
        };
        vec![
            Some(Field::from(CARD)),
            Some(Field::from(self.pid)),
            self.mid1().map(Field::from),
            self.t.map(Field::from),
            self.mid2().map(Field::from),
            blank_if_default(self.twelve_i_t3, TWELVE_I_T3_DEFAULT),
            self.mid3().map(Field::from),
            blank_if_default(self.tst, TST_DEFAULT),
            blank_if_default(self.nsm, 0.0),
            z1,
            z2,
            self.mid4().map(Field::from),
        ]
    }

    /// Edit one field by its 1-based card position
    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        apply_update(&PSHELL_FIELDS, CARD, self, index, value)
    }

    /// Same card content apart from the property id
    pub fn is_same_card(&self, other: &Pshell) -> bool {
        fields_match(&self.raw_fields()[2..], &other.raw_fields()[2..])
    }

    fn offset(&self) -> PropResult<f64> {
        self.z1.ok_or_else(|| PropertyError::missing_field(CARD, "z1", 9))
    }

    /// CalculiX `*SHELL SECTION` for the elements in `element_set`.
    ///
    /// The material is named `M<marker>_<mid>` after the primary material.
    pub fn write_calculix(&self, marker: &str, element_set: &str) -> PropResult<String> {
        let mid = self
            .primary_material()
            .map(MaterialRef::id)
            .ok_or_else(|| PropertyError::missing_field(CARD, "mid1", 2))?;
        let t = self.thickness()?;
        Ok(format!(
            "*SHELL SECTION,MATERIAL=M{}_{},ELSET={},OFFSET={:?}\n** THICKNESS\n{:?}\n\n",
            marker,
            mid,
            element_set,
            self.offset()?,
            t
        ))
    }

    /// Code_Aster `COQUE` keyword block for group `P<pid>`
    pub fn write_code_aster(&self) -> PropResult<String> {
        let t = self.thickness()?;
        let mut out = format!("    COQUE=_F(GROUP_MA='P{}', # COQUE=PSHELL\n", self.pid);
        out += &format!("              EPAIS={}, # EPAIS=thickness\n", format_g(t));
        out += "              ANGL_REP=(0.,90.),\n";
        out += &format!("              EXCENTREMENT={},  # offset-Z1\n", format_g(self.offset()?));
        out += "              COQUE_NCOU=1,  # Number of Integration Layers\n";
        out += "              CARA=('NSM'),\n";
        out += &format!("              VALE=({}),),\n", format_g(self.nsm));
        Ok(out)
    }
}

/// Six significant digits, trailing zeros dropped, exponent form outside
/// `1e-4 <= |value| < 1e6`.
fn format_g(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{:.5e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs());
    }
    let decimals = (5 - exponent).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
