//! # PCOMPG - Composite Property with Global Ply Ids
//!
//! Ply groups of eight fields: `GPLYID, MID, T, THETA, SOUT` and three
//! reserved slots. Global ply ids let results be tracked across properties
//! that share a ply.

use serde::{Deserialize, Serialize};

use super::laminate::{GroupLayout, Laminate};
use crate::errors::{PropResult, PropertyError};
use crate::fields::{fields_match, Field, FieldSource};
use crate::xref::Registry;

const CARD: &str = "PCOMPG";

const LAYOUT: GroupLayout = GroupLayout {
    width: 8,
    global_id: true,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pcompg {
    pub laminate: Laminate,
}

impl Pcompg {
    pub const CARD: &'static str = CARD;

    /// Read a PCOMPG card.
    pub fn parse(card: &dyn FieldSource) -> PropResult<Self> {
        Ok(Pcompg {
            laminate: Laminate::parse(card, LAYOUT, CARD)?,
        })
    }

    /// Global ply id of effective ply `iply`
    pub fn global_ply_id(&self, iply: usize) -> PropResult<i64> {
        self.laminate.stack.ply(iply)?.global_ply_id.ok_or_else(|| {
            PropertyError::invalid_data(
                CARD,
                format!("pid={} ply {} has no global ply id", self.laminate.pid, iply),
            )
        })
    }

    /// Global ply ids of every effective ply
    pub fn global_ply_ids(&self) -> PropResult<Vec<i64>> {
        (0..self.laminate.nplies()).map(|i| self.global_ply_id(i)).collect()
    }

    pub fn cross_reference(&mut self, registry: &dyn Registry) -> PropResult<()> {
        self.laminate.cross_reference(registry, CARD)
    }

    pub fn uncross_reference(&mut self) {
        self.laminate.uncross_reference();
    }

    pub fn verify(&self, xref: bool) -> PropResult<()> {
        self.laminate.verify(xref, CARD)?;
        for (i, ply) in self.laminate.plies().iter().enumerate() {
            if ply.global_ply_id.is_none() {
                return Err(PropertyError::validation_failed(
                    self.laminate.pid,
                    "global_ply_id",
                    format!("ply {} has no global ply id", i),
                ));
            }
        }
        Ok(())
    }

    fn fields(&self, blank_defaults: bool) -> Vec<Option<Field>> {
        let mut fields = if blank_defaults {
            self.laminate.header_repr(CARD)
        } else {
            self.laminate.header_raw(CARD)
        };
        for ply in self.laminate.plies() {
            fields.push(ply.global_ply_id.map(Field::from));
            fields.extend(Laminate::ply_fields(ply, blank_defaults));
            fields.extend([None, None, None]);
        }
        fields
    }

    pub fn raw_fields(&self) -> Vec<Option<Field>> {
        self.fields(false)
    }

    pub fn repr_fields(&self) -> Vec<Option<Field>> {
        self.fields(true)
    }

    /// Edit one field by its 1-based card position; reserved slots are rejected
    pub fn update_field(&mut self, index: usize, value: Option<&Field>) -> PropResult<()> {
        self.laminate.update_field(LAYOUT, CARD, index, value)
    }

    /// Same header (apart from pid and z0) and the same plies
    pub fn is_same_card(&self, other: &Pcompg) -> bool {
        fields_match(&self.raw_fields()[3..], &other.raw_fields()[3..])
    }
}
