//! # Laminate Core
//!
//! PCOMP and PCOMPG share the same header and the same ply semantics; they
//! differ only in how a ply group is laid out on the card.
//!
//! ```text
//! +-------+------+------+-------+------+------+------+------+------+
//! | PCOMP | PID  |  Z0  |  NSM  |  SB  |  FT  | TREF |  GE  | LAM  |
//! +-------+------+------+-------+------+------+------+------+------+
//! |       | MID1 |  T1  | THETA1| SOUT1| MID2 |  T2  |THETA2| SOUT2|
//! +-------+------+------+-------+------+------+------+------+------+
//!
//! +--------+------+------+-------+------+------+------+------+------+
//! | PCOMPG | PID  |  Z0  |  NSM  |  SB  |  FT  | TREF |  GE  | LAM  |
//! +--------+------+------+-------+------+------+------+------+------+
//! |        | GPID1| MID1 |  T1   |THETA1| SOUT1|      |      |      |
//! +--------+------+------+-------+------+------+------+------+------+
//! ```
//!
//! A blank `MID` or `T` repeats the value of the previous ply, so reading
//! the plies is a fold over `(last_mid, last_t)`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{check_nsm, check_positive_id};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{
    apply_update, blank_if_default, blank_token_if_default, float_slot, integer_slot, optional_enum,
    optional_float, required, required_integer, token_value, CardToken, Field, FieldMap, FieldSlot, FieldSource,
};
use crate::materials::Material;
use crate::plies::{FailureTheory, LaminationMode, Ply, PlySelect, PlyStack, SmearMethod, StressOutput};
use crate::xref::{resolve_slot, MaterialRef, Registry};

/// Position of the first ply field
pub const FIRST_PLY_FIELD: usize = 9;

/// How one ply group is laid out on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupLayout {
    /// Fields per group
    pub width: usize,
    /// Whether the group starts with a global ply id
    pub global_id: bool,
}

impl GroupLayout {
    /// Offset of the `MID` slot inside a group
    fn ply_offset(&self) -> usize {
        usize::from(self.global_id)
    }

    /// Number of populated slots per group; the rest are reserved
    fn used(&self) -> usize {
        self.ply_offset() + 4
    }
}

/// Fold state while reading ply groups
#[derive(Default)]
struct PlyCarry {
    plies: Vec<Ply>,
    last_mid: Option<i64>,
    last_t: Option<f64>,
}

impl PlyCarry {
    fn read_group(
        mut self,
        card: &dyn FieldSource,
        start: usize,
        layout: GroupLayout,
        card_name: &str,
        pid: i64,
    ) -> PropResult<Self> {
        if !layout.global_id && (start..start + layout.used()).all(|i| card.field(i).is_none()) {
            tracing::debug!(card = card_name, pid, field = start, "skipping blank ply group");
            return Ok(self);
        }
        for reserved in start + layout.used()..start + layout.width {
            if let Some(value) = card.field(reserved) {
                tracing::warn!(card = card_name, pid, field = reserved, %value, "ignoring reserved ply field");
            }
        }

        let global_ply_id = if layout.global_id {
            Some(required_integer(card, start, "global_ply_id")?)
        } else {
            None
        };
        let base = start + layout.ply_offset();
        let mid = integer_slot(card.field(base), "mid", base)?.or(self.last_mid);
        let mid = required(mid, card_name, "mid", base)?;
        let t = float_slot(card.field(base + 1), "t", base + 1)?.or(self.last_t);
        let t = required(t, card_name, "t", base + 1)?;
        let theta = optional_float(card, base + 2, "theta", 0.0)?;
        let sout = optional_enum(card, base + 3, "sout", Some(StressOutput::No))?.unwrap_or_default();

        check_ply_thickness(card_name, pid, self.plies.len(), t)?;

        let mut ply = Ply::new(mid, t, theta, sout);
        ply.global_ply_id = global_ply_id;
        self.plies.push(ply);
        self.last_mid = Some(mid);
        self.last_t = Some(t);
        Ok(self)
    }
}

pub(crate) fn check_ply_thickness(card: &str, pid: i64, ply: usize, thickness: f64) -> PropResult<()> {
    if thickness.is_nan() || thickness <= 0.0 {
        return Err(PropertyError::InvalidPlyThickness {
            card: card.to_string(),
            pid,
            ply,
            thickness,
        });
    }
    Ok(())
}

/// Read every ply group after the header
pub(crate) fn read_plies(card: &dyn FieldSource, layout: GroupLayout, card_name: &str, pid: i64) -> PropResult<Vec<Ply>> {
    let ngroups = card.nfields().saturating_sub(FIRST_PLY_FIELD).div_ceil(layout.width);
    let carry = (0..ngroups)
        .map(|group| FIRST_PLY_FIELD + group * layout.width)
        .try_fold(PlyCarry::default(), |carry, start| {
            carry.read_group(card, start, layout, card_name, pid)
        })?;
    Ok(carry.plies)
}

/// Composite shell property shared by PCOMP and PCOMPG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laminate {
    pub pid: i64,
    /// Distance from the reference plane to the bottom surface
    pub z0: f64,
    /// Non-structural mass per area
    pub nsm: f64,
    /// Allowable interlaminar shear stress
    pub sb: f64,
    pub ft: Option<FailureTheory>,
    /// Reference temperature
    pub tref: f64,
    /// Damping coefficient
    pub ge: f64,
    pub stack: PlyStack,
}

/// Header setters for fields 1-8.
///
/// `z0` is only re-derived when field 2 itself is blanked; later ply
/// thickness edits leave a stored default `z0` as it was.
static LAMINATE_FIELDS: Lazy<FieldMap<Laminate>> = Lazy::new(|| {
    let mut map: FieldMap<Laminate> = HashMap::new();
    map.insert(1, FieldSlot {
        name: "pid",
        set: |l, v| {
            l.pid = required(integer_slot(v, "pid", 1)?, "laminate", "pid", 1)?;
            Ok(())
        },
    });
    map.insert(2, FieldSlot {
        name: "z0",
        set: |l, v| {
            l.z0 = float_slot(v, "z0", 2)?.unwrap_or_else(|| l.default_z0());
            Ok(())
        },
    });
    map.insert(3, FieldSlot {
        name: "nsm",
        set: |l, v| {
            l.nsm = float_slot(v, "nsm", 3)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(4, FieldSlot {
        name: "sb",
        set: |l, v| {
            l.sb = float_slot(v, "sb", 4)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(5, FieldSlot {
        name: "ft",
        set: |l, v| {
            l.ft = token_value(v, "ft", 5, None)?;
            Ok(())
        },
    });
    map.insert(6, FieldSlot {
        name: "tref",
        set: |l, v| {
            l.tref = float_slot(v, "tref", 6)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(7, FieldSlot {
        name: "ge",
        set: |l, v| {
            l.ge = float_slot(v, "ge", 7)?.unwrap_or(0.0);
            Ok(())
        },
    });
    map.insert(8, FieldSlot {
        name: "lam",
        set: |l, v| {
            let lam = token_value(v, "lam", 8, None)?.unwrap_or_default();
            l.stack.set_lamination(lam);
            Ok(())
        },
    });
    map
});

impl Laminate {
    /// Read the header and ply groups of a laminate card.
    pub(crate) fn parse(card: &dyn FieldSource, layout: GroupLayout, card_name: &str) -> PropResult<Self> {
        let pid = required_integer(card, 1, "pid")?;
        let nsm = optional_float(card, 3, "nsm", 0.0)?;
        let sb = optional_float(card, 4, "sb", 0.0)?;
        let ft = optional_enum(card, 5, "ft", None)?;
        let tref = optional_float(card, 6, "tref", 0.0)?;
        let ge = optional_float(card, 7, "ge", 0.0)?;
        let lam = optional_enum(card, 8, "lam", None)?.unwrap_or_default();

        let plies = read_plies(card, layout, card_name, pid)?;
        let stack = PlyStack::new(plies, lam);
        let z0 = optional_float(card, 2, "z0", -0.5 * stack.total_thickness())?;
        tracing::debug!(card = card_name, pid, nplies = stack.nplies(), ?lam, "parsed laminate");

        Ok(Laminate {
            pid,
            z0,
            nsm,
            sb,
            ft,
            tref,
            ge,
            stack,
        })
    }

    /// `z0` when the field is blank: the stack centered on the reference plane
    pub fn default_z0(&self) -> f64 {
        -0.5 * self.stack.total_thickness()
    }

    pub fn lamination(&self) -> LaminationMode {
        self.stack.lamination()
    }

    pub fn is_symmetrical(&self) -> bool {
        self.stack.is_symmetrical()
    }

    /// Effective ply count
    pub fn nplies(&self) -> usize {
        self.stack.nplies()
    }

    pub fn plies(&self) -> &[Ply] {
        self.stack.plies()
    }

    pub fn adjust_index(&self, select: PlySelect) -> PropResult<PlySelect> {
        self.stack.adjust_index(select)
    }

    pub fn total_thickness(&self) -> f64 {
        self.stack.total_thickness()
    }

    pub fn thickness(&self, select: PlySelect) -> PropResult<f64> {
        self.stack.thickness(select)
    }

    /// Ply boundary coordinates starting at `z0`
    pub fn z_locations(&self) -> Vec<f64> {
        self.stack.z_locations(self.z0)
    }

    pub fn material_ids(&self) -> Vec<i64> {
        self.stack.material_ids()
    }

    pub fn material(&self, iply: usize) -> PropResult<&MaterialRef> {
        Ok(&self.stack.ply(iply)?.material)
    }

    pub fn material_id(&self, iply: usize) -> PropResult<i64> {
        Ok(self.stack.ply(iply)?.mid())
    }

    pub fn theta(&self, iply: usize) -> PropResult<f64> {
        Ok(self.stack.ply(iply)?.theta)
    }

    pub fn sout(&self, iply: usize) -> PropResult<StressOutput> {
        Ok(self.stack.ply(iply)?.sout)
    }

    fn owner(&self) -> String {
        format!("pid={}", self.pid)
    }

    /// Density of the material behind effective ply `iply`
    pub fn density(&self, iply: usize) -> PropResult<f64> {
        let material: &Material = self
            .stack
            .ply(iply)?
            .material
            .require(format!("{} iply={}", self.owner(), iply))?;
        Ok(material.rho)
    }

    /// Mass per area from the resolved ply materials.
    pub fn mass_per_area(&self, select: PlySelect, method: SmearMethod) -> PropResult<f64> {
        let rhos = self.stack.densities(&self.owner())?;
        self.stack.mass_per_area_rho(&rhos, self.nsm, select, method)
    }

    /// [`Laminate::mass_per_area`] with the smearing method given by name
    pub fn mass_per_area_by_name(&self, select: PlySelect, method: &str) -> PropResult<f64> {
        let method: SmearMethod = method.parse()?;
        self.mass_per_area(select, method)
    }

    /// Mass per area from caller-supplied densities of the stored plies
    pub fn mass_per_area_rho(&self, rhos: &[f64], select: PlySelect, method: SmearMethod) -> PropResult<f64> {
        self.stack.mass_per_area_rho(rhos, self.nsm, select, method)
    }

    /// Resolve every ply material; nothing changes unless all succeed.
    pub(crate) fn cross_reference(&mut self, registry: &dyn Registry, card_name: &str) -> PropResult<()> {
        let owner = format!("{} pid={}", card_name, self.pid);
        let resolved = self
            .stack
            .plies()
            .iter()
            .enumerate()
            .map(|(i, ply)| resolve_slot(registry, &ply.material, &format!("{} iply={}", owner, i)))
            .collect::<PropResult<Vec<_>>>()?;
        for (ply, material) in self.stack.plies_mut().iter_mut().zip(resolved) {
            ply.material = material;
        }
        tracing::debug!(card = card_name, pid = self.pid, nplies = self.nplies(), "cross-referenced laminate");
        Ok(())
    }

    pub(crate) fn uncross_reference(&mut self) {
        for ply in self.stack.plies_mut() {
            ply.material.unresolve();
        }
    }

    pub(crate) fn verify(&self, xref: bool, card_name: &str) -> PropResult<()> {
        check_positive_id(self.pid, "pid", self.pid)?;
        check_nsm(self.pid, self.nsm)?;
        if self.stack.nstored() == 0 {
            return Err(PropertyError::validation_failed(self.pid, "plies", "a laminate needs at least one ply"));
        }
        for (i, ply) in self.stack.plies().iter().enumerate() {
            check_positive_id(self.pid, &format!("mid (ply {})", i), ply.mid())?;
            check_ply_thickness(card_name, self.pid, i, ply.thickness)?;
        }
        if xref {
            let total = self.mass_per_area(PlySelect::All, SmearMethod::ByPlyCount)?;
            if !total.is_finite() {
                return Err(PropertyError::validation_failed(
                    self.pid,
                    "nsm",
                    format!("mass per area is not finite: {}", total),
                ));
            }
            for i in 0..self.nplies() {
                self.density(i)?;
                self.mass_per_area(PlySelect::Ply(i), SmearMethod::ByPlyCount)?;
            }
        }
        Ok(())
    }

    /// Header fields in card order, card name first
    pub(crate) fn header_raw(&self, card_name: &str) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(card_name)),
            Some(Field::from(self.pid)),
            Some(Field::from(self.z0)),
            Some(Field::from(self.nsm)),
            Some(Field::from(self.sb)),
            self.ft.map(|ft| Field::from(ft.token())),
            Some(Field::from(self.tref)),
            Some(Field::from(self.ge)),
            self.lamination().card_token().map(Field::from),
        ]
    }

    pub(crate) fn header_repr(&self, card_name: &str) -> Vec<Option<Field>> {
        vec![
            Some(Field::from(card_name)),
            Some(Field::from(self.pid)),
            blank_if_default(self.z0, self.default_z0()),
            blank_if_default(self.nsm, 0.0),
            blank_if_default(self.sb, 0.0),
            self.ft.map(|ft| Field::from(ft.token())),
            blank_if_default(self.tref, 0.0),
            blank_if_default(self.ge, 0.0),
            self.lamination().card_token().map(Field::from),
        ]
    }

    /// The four ply fields `MID, T, THETA, SOUT`
    pub(crate) fn ply_fields(ply: &Ply, blank_defaults: bool) -> [Option<Field>; 4] {
        let sout = if blank_defaults {
            blank_token_if_default(&ply.sout, &StressOutput::No)
        } else {
            Some(Field::from(ply.sout.token()))
        };
        [
            Some(Field::from(ply.mid())),
            Some(Field::from(ply.thickness)),
            Some(Field::from(ply.theta)),
            sout,
        ]
    }

    /// Edit one header or ply field by its 1-based card position.
    pub(crate) fn update_field(
        &mut self,
        layout: GroupLayout,
        card_name: &str,
        index: usize,
        value: Option<&Field>,
    ) -> PropResult<()> {
        if index < FIRST_PLY_FIELD {
            return apply_update(&LAMINATE_FIELDS, card_name, self, index, value);
        }

        let offset = index - FIRST_PLY_FIELD;
        let stored = offset / layout.width;
        let slot = offset % layout.width;
        let nstored = self.stack.nstored();
        let pid = self.pid;
        let ply = self.stack.ply_mut(stored).ok_or_else(|| {
            PropertyError::field_mismatch(
                card_name,
                index,
                format!("ply {} is not defined on pid={}; {} plies are stored", stored, pid, nstored),
            )
        })?;
        tracing::debug!(card = card_name, index, ply = stored, slot, "updating ply field");

        let slot = match (layout.global_id, slot) {
            (true, 0) => {
                ply.global_ply_id = Some(required(integer_slot(value, "global_ply_id", index)?, card_name, "global_ply_id", index)?);
                return Ok(());
            }
            (true, s) if s >= layout.used() => {
                return Err(PropertyError::field_mismatch(card_name, index, "reserved ply field"));
            }
            (true, s) => s - 1,
            (false, s) => s,
        };
        match slot {
            0 => ply.material = MaterialRef::Unresolved(required(integer_slot(value, "mid", index)?, card_name, "mid", index)?),
            1 => {
                let t = required(float_slot(value, "t", index)?, card_name, "t", index)?;
                check_ply_thickness(card_name, pid, stored, t)?;
                ply.thickness = t;
            }
            2 => ply.theta = float_slot(value, "theta", index)?.unwrap_or(0.0),
            _ => ply.sout = token_value(value, "sout", index, Some(StressOutput::No))?.unwrap_or_default(),
        }
        Ok(())
    }
}
