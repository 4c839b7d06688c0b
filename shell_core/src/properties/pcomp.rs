//! # PCOMP - Layered Composite Element Property
//!
//! Ply groups of four fields (`MID, T, THETA, SOUT`) follow the header.
//! See [`Laminate`] for the shared header and the ply rules.

use serde::{Deserialize, Serialize};

use super::laminate::{check_ply_thickness, GroupLayout, Laminate};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{fields_match, CardToken, Field, FieldSource};
use crate::plies::{FailureTheory, LaminationMode, Ply, PlyStack, StressOutput};
use crate::settings::Settings;
use crate::xref::Registry;

const CARD: &str = "PCOMP";

const LAYOUT: GroupLayout = GroupLayout {
    width: 4,
    global_id: false,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pcomp {
    pub laminate: Laminate,
}

/// Binary tuple layout: the header followed by per-ply arrays.
///
/// `lam` is `"SYM"` or `"NO"`; `souts` holds 0 (NO) or 1 (YES).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcompData {
    pub pid: i64,
    pub z0: f64,
    pub nsm: f64,
    pub sb: f64,
    #[serde(default)]
    pub ft: Option<String>,
    pub tref: f64,
    pub ge: f64,
    pub lam: String,
    pub mids: Vec<i64>,
    pub thicknesses: Vec<f64>,
    pub thetas: Vec<f64>,
    pub souts: Vec<i64>,
}

impl Pcomp {
    pub const CARD: &'static str = CARD;

    /// Read a PCOMP card.
    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        Ok(Pcomp {
            laminate: Laminate::parse(card, LAYOUT, CARD)?,
        })
    }

    /// Build from a binary tuple
    pub fn from_data(data: &PcompData, settings: &Settings) -> PropResult<Self> {
        let nplies = data.mids.len();
        if data.thicknesses.len() != nplies || data.thetas.len() != nplies || data.souts.len() != nplies {
            return Err(PropertyError::invalid_data(
                CARD,
                format!(
                    "ply arrays differ in length: mids={} t={} theta={} sout={}",
                    nplies,
                    data.thicknesses.len(),
                    data.thetas.len(),
                    data.souts.len()
                ),
            ));
        }

        let lam = match data.lam.trim() {
            "SYM" => LaminationMode::Sym,
            "NO" => LaminationMode::None,
            other => return Err(PropertyError::invalid_enum("lam", other, &["SYM", "NO"])),
        };
        let ft = match data.ft.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => Some(
                FailureTheory::from_token(token)
                    .ok_or_else(|| PropertyError::invalid_enum("ft", token, FailureTheory::ALLOWED))?,
            ),
        };

        let mut plies = Vec::with_capacity(nplies);
        for (i, (((&mid, &t), &theta), &sout)) in data
            .mids
            .iter()
            .zip(&data.thicknesses)
            .zip(&data.thetas)
            .zip(&data.souts)
            .enumerate()
        {
            let sout = StressOutput::from_flag(sout).ok_or_else(|| {
                PropertyError::invalid_data(CARD, format!("pid={} ply={}: sout={} must be 0 or 1", data.pid, i, sout))
            })?;
            if let Err(err) = check_ply_thickness(CARD, data.pid, i, t) {
                if !settings.legacy_binary_thickness {
                    return Err(err);
                }
                tracing::warn!(pid = data.pid, ply = i, t, "accepting non-positive ply thickness from binary data");
            }
            plies.push(Ply::new(mid, t, theta, sout));
        }

        Ok(Pcomp {
            laminate: Laminate {
                pid: data.pid,
                z0: data.z0,
                nsm: data.nsm,
                sb: data.sb,
                ft,
                tref: data.tref,
                ge: data.ge,
                stack: PlyStack::new(plies, lam),
            },
        })
    }

    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        self.laminate.cross_reference(registry, CARD)
    }

    pub fn uncross_reference(&mut self) {
        self.laminate.uncross_reference();
    }

    pub fn verify(&self, xref: bool) -> PropResult<()> {
        self.laminate.verify(xref, CARD)
    }

    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        let mut fields = self.laminate.header_raw(CARD);
        for ply in self.laminate.plies() {
            fields.extend(Laminate::ply_fields(ply, false));
        }
        fields
    }

    pub fn repr_fields(&self) -> Vec<Option<Field>> {
        let mut fields = self.laminate.header_repr(CARD);
        for ply in self.laminate.plies() {
            fields.extend(Laminate::ply_fields(ply, true));
        }
        fields
    }

    /// Edit one field by its 1-based card position
    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        self.laminate.update_field(LAYOUT, CARD, index, value)
    }

    /// Same header (apart from pid and z0) and the same plies
    pub fn is_same_card(&self, other: &Pcomp) -> bool {
        fields_match(&self.raw_fields()[3..], &other.raw_fields()[3..])
    }
}
