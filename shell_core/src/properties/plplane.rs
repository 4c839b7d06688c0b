//! # PLPLANE - Fully Nonlinear Plane Element Property
//!
//! ```text
//! +---------+-----+-----+-----+-----+
//! | PLPLANE | PID | MID | CID | STR |
//! +---------+-----+-----+-----+-----+
//! ```
//!
//! Hyperelastic (MATHE/MATHP) plane strain elements. The card carries no
//! thickness or mass, so those queries are unsupported.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{check_material_kind, check_positive_id, PLPLANE_MATERIALS};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{
    apply_update, fields_match, integer_slot, optional_enum, optional_integer, required, required_integer,
    token_value, CardToken, Field, FieldMap, FieldSlot, FieldSource,
};
use crate::materials::CoordinateSystem;
use crate::xref::{resolve_coordinate_system, resolve_slot, CoordRef, MaterialRef, Registry, XRef};

const CARD: &str = "PLPLANE";

/// Where stresses are recovered (`STR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StressLocation {
    #[default]
    Grid,
    Gauss,
}

impl CardToken for StressLocation {
    const ALLOWED: &'static [&'static str] = &["GRID", "GAUSS"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "GRID" => Some(StressLocation::Grid),
            "GAUSS" => Some(StressLocation::Gauss),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            StressLocation::Grid => "GRID",
            StressLocation::Gauss => "GAUSS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plplane {
    pub pid: i64,
    /// Hyperelastic material
    pub mid: MaterialRef,
    /// Coordinate system for stress output
    pub cid: CoordRef,
    pub stress_location: StressLocation,
}

static PLPLANE_FIELDS: Lazy<FieldMap<Plplane>> = Lazy::new(|| {
    let mut map: FieldMap<Plplane> = HashMap::new();
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
            p.mid = XRef::Unresolved(required(integer_slot(v, "mid", 2)?, CARD, "mid", 2)?);
            Ok(())
        },
    });
    map.insert(3, FieldSlot {
        name: "cid",
        set: |p, v| {
            p.cid = XRef::Unresolved(integer_slot(v, "cid", 3)?.unwrap_or(CoordinateSystem::BASIC));
            Ok(())
        },
    });
    map.insert(4, FieldSlot {
        name: "str",
        set: |p, v| {
            p.stress_location = token_value(v, "str", 4, Some(StressLocation::Grid))?.unwrap_or_default();
            Ok(())
        },
    });
    map
});

impl Plplane {
    pub const CARD: &'static str = CARD;

    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        let pid = required_integer(card, 1, "pid")?;
        let mid = required_integer(card, 2, "mid")?;
        let cid = optional_integer(card, 3, "cid", CoordinateSystem::BASIC)?;
        let stress_location = optional_enum(card, 4, "str", Some(StressLocation::Grid))?.unwrap_or_default();
        if card.nfields() > 5 {
            return Err(PropertyError::field_mismatch(
                CARD,
                card.nfields() - 1,
                "PLPLANE has 4 fields",
            ));
        }
        tracing::debug!(pid, mid, cid, "parsed PLPLANE");

        Ok(Plplane {
            pid,
            mid: XRef::Unresolved(mid),
            cid: XRef::Unresolved(cid),
            stress_location,
        })
    }

    fn required_by(&self) -> String {
        format!("{} pid={}", CARD, self.pid)
    }

    pub fn mid(&self) -> i64 {
        self.mid.id()
    }

    pub fn cid(&self) -> i64 {
        self.cid.id()
    }

    /// Resolve the material and the coordinate system together
    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        let required_by = self.required_by();
        let mid = resolve_slot(registry, &self.mid, &required_by)?;
        let cid = resolve_coordinate_system(registry, self.cid(), &required_by)?;
        self.mid = mid;
        self.cid = XRef::Resolved(cid);
        Ok(())
    }

    pub fn uncross_reference(&mut self) {
        self.mid.unresolve();
        self.cid.unresolve();
    }

    pub fn verify(&self, xref: bool) -> PropResult<()> {
        check_positive_id(self.pid, "pid", self.pid)?;
        check_positive_id(self.pid, "mid", self.mid())?;
        if self.cid() < 0 {
            return Err(PropertyError::validation_failed(
                self.pid,
                "cid",
                format!("cid must be >= 0; cid={}", self.cid()),
            ));
        }
        if xref {
            let material = self.mid.require(self.required_by())?;
            check_material_kind(self.pid, "mid", material, PLPLANE_MATERIALS)?;
            self.cid.require(self.required_by())?;
        }
        Ok(())
    }

    /// Card fields; nothing is blanked on output
    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(CARD)),
            Some(Field::from(self.pid)),
            Some(Field::from(self.mid())),
            Some(Field::from(self.cid())),
            Some(Field::from(self.stress_location.token())),
        ]
    }

    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        apply_update(&PLPLANE_FIELDS, CARD, self, index, value)
    }

    pub fn is_same_card(&self, other: &Plplane) -> bool {
        fields_match(&self.raw_fields()[2..], &other.raw_fields()[2..])
    }
}
