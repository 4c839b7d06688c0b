//! # Ply Stack Engine
//!
//! The ordered ply list of a composite laminate and every derived quantity
//! computed from it.
//!
//! ## Symmetry
//!
//! With `LAM = SYM` the stored plies are the half stack on one side of the
//! mid-plane. The effective stack has twice as many plies and effective
//! index `i >= n` reads stored ply `i - n`:
//!
//! ```text
//!   stored n = 3, LAM = SYM, effective = 6
//!
//!       ply 2
//!       ply 1
//!       ply 0
//!     ------- sym
//!       ply 0 / 3
//!       ply 1 / 4
//!       ply 2 / 5
//! ```
//!
//! Mirroring never doubles a single ply's own thickness; only aggregate
//! (`PlySelect::All`) quantities double.
//!
//! ## Non-structural mass smearing
//!
//! The aggregate mass per area is `Σ ρᵢtᵢ + nsm` (the sum doubled for SYM).
//! For a single ply the non-structural mass is shared out by a
//! [`SmearMethod`]; every method sums back to the aggregate over the
//! effective stack.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::plies::{LaminationMode, Ply, PlySelect, PlyStack, StressOutput};
//!
//! let stack = PlyStack::new(
//!     vec![
//!         Ply::new(300704, 0.037, 0.0, StressOutput::Yes),
//!         Ply::new(300704, 0.037, 45.0, StressOutput::Yes),
//!     ],
//!     LaminationMode::Sym,
//! );
//!
//! assert_eq!(stack.nplies(), 4);
//! assert_eq!(stack.adjust_index(PlySelect::Ply(3)).unwrap(), PlySelect::Ply(1));
//! assert!((stack.thickness(PlySelect::All).unwrap() - 0.148).abs() < 1e-12);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PropResult, PropertyError};
use crate::fields::CardToken;
use crate::xref::MaterialRef;

// ============================================================================
// Card tokens
// ============================================================================

/// Per-ply stress/strain output request (`SOUTi`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StressOutput {
    Yes,
    #[default]
    No,
}

impl StressOutput {
    /// Binary tuple encoding: 0 = NO, 1 = YES
    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(StressOutput::No),
            1 => Some(StressOutput::Yes),
            _ => None,
        }
    }
}

impl CardToken for StressOutput {
    const ALLOWED: &'static [&'static str] = &["YES", "NO"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "YES" => Some(StressOutput::Yes),
            "NO" => Some(StressOutput::No),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            StressOutput::Yes => "YES",
            StressOutput::No => "NO",
        }
    }
}

/// Lamination option (`LAM`); a blank field is [`LaminationMode::None`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaminationMode {
    /// Every ply is listed
    #[default]
    None,
    /// Listed plies are mirrored about the mid-plane
    Sym,
    /// Membrane only
    Mem,
    /// Bending only
    Bend,
    /// Smeared stiffness, ply order ignored
    Smear,
    /// Smeared stiffness with the last ply as core
    Smcore,
}

impl LaminationMode {
    /// Token as written on the card; `None` writes a blank
    pub fn card_token(&self) -> Option<&'static str> {
        match self {
            LaminationMode::None => None,
            other => Some(other.token()),
        }
    }
}

impl CardToken for LaminationMode {
    const ALLOWED: &'static [&'static str] = &["SYM", "MEM", "BEND", "SMEAR", "SMCORE"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "SYM" => Some(LaminationMode::Sym),
            "MEM" => Some(LaminationMode::Mem),
            "BEND" => Some(LaminationMode::Bend),
            "SMEAR" => Some(LaminationMode::Smear),
            "SMCORE" => Some(LaminationMode::Smcore),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            LaminationMode::None => "",
            LaminationMode::Sym => "SYM",
            LaminationMode::Mem => "MEM",
            LaminationMode::Bend => "BEND",
            LaminationMode::Smear => "SMEAR",
            LaminationMode::Smcore => "SMCORE",
        }
    }
}

/// Failure theory (`FT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailureTheory {
    Hill,
    Hoff,
    Tsai,
    Strn,
}

impl CardToken for FailureTheory {
    const ALLOWED: &'static [&'static str] = &["HILL", "HOFF", "TSAI", "STRN"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "HILL" => Some(FailureTheory::Hill),
            "HOFF" => Some(FailureTheory::Hoff),
            "TSAI" => Some(FailureTheory::Tsai),
            "STRN" => Some(FailureTheory::Strn),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            FailureTheory::Hill => "HILL",
            FailureTheory::Hoff => "HOFF",
            FailureTheory::Tsai => "TSAI",
            FailureTheory::Strn => "STRN",
        }
    }
}

// ============================================================================
// Selection and smearing
// ============================================================================

/// Which plies a query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlySelect {
    /// The whole effective stack
    All,
    /// One effective ply (0-based)
    Ply(usize),
}

impl From<usize> for PlySelect {
    fn from(iply: usize) -> Self {
        PlySelect::Ply(iply)
    }
}

/// How non-structural mass is shared out when a single ply is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SmearMethod {
    /// `nsmᵢ = nsm / n`
    #[default]
    #[serde(rename = "nplies")]
    ByPlyCount,
    /// `nsmᵢ = ρᵢtᵢ · nsm / Σρt`
    #[serde(rename = "rho*t")]
    ByMassFraction,
    /// `nsmᵢ = tᵢ · nsm / Σt`
    #[serde(rename = "t")]
    ByThicknessFraction,
}

impl SmearMethod {
    pub const ALL: [SmearMethod; 3] = [
        SmearMethod::ByPlyCount,
        SmearMethod::ByMassFraction,
        SmearMethod::ByThicknessFraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmearMethod::ByPlyCount => "nplies",
            SmearMethod::ByMassFraction => "rho*t",
            SmearMethod::ByThicknessFraction => "t",
        }
    }
}

impl FromStr for SmearMethod {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nplies" => Ok(SmearMethod::ByPlyCount),
            "rho*t" => Ok(SmearMethod::ByMassFraction),
            "t" => Ok(SmearMethod::ByThicknessFraction),
            other => Err(PropertyError::UnsupportedSmearMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SmearMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Plies
// ============================================================================

/// One layer of a laminate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ply {
    /// Material of the layer
    pub material: MaterialRef,
    /// Layer thickness, strictly positive
    pub thickness: f64,
    /// Fiber orientation in degrees
    pub theta: f64,
    /// Stress/strain output request
    pub sout: StressOutput,
    /// Global ply id (PCOMPG only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_ply_id: Option<i64>,
}

impl Ply {
    pub fn new(mid: i64, thickness: f64, theta: f64, sout: StressOutput) -> Self {
        Ply {
            material: MaterialRef::Unresolved(mid),
            thickness,
            theta,
            sout,
            global_ply_id: None,
        }
    }

    pub fn with_global_id(mut self, global_ply_id: i64) -> Self {
        self.global_ply_id = Some(global_ply_id);
        self
    }

    pub fn mid(&self) -> i64 {
        self.material.id()
    }
}

/// The ordered plies of a laminate plus its lamination option.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlyStack {
    plies: Vec<Ply>,
    lam: LaminationMode,
}

impl PlyStack {
    /// Wrap already-validated plies. Thickness checks belong to the card parser,
    /// which knows the property id to report.
    pub fn new(plies: Vec<Ply>, lam: LaminationMode) -> Self {
        PlyStack { plies, lam }
    }

    /// The stored plies (half stack when symmetric)
    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    pub(crate) fn plies_mut(&mut self) -> &mut [Ply] {
        &mut self.plies
    }

    pub fn lamination(&self) -> LaminationMode {
        self.lam
    }

    pub(crate) fn set_lamination(&mut self, lam: LaminationMode) {
        self.lam = lam;
    }

    pub fn is_symmetrical(&self) -> bool {
        self.lam == LaminationMode::Sym
    }

    /// Number of stored plies
    pub fn nstored(&self) -> usize {
        self.plies.len()
    }

    /// Effective ply count: doubled for a symmetric stack
    pub fn nplies(&self) -> usize {
        if self.is_symmetrical() {
            2 * self.plies.len()
        } else {
            self.plies.len()
        }
    }

    /// Map an effective ply index onto the stored ply that backs it.
    pub fn adjust_index(&self, select: PlySelect) -> PropResult<PlySelect> {
        match select {
            PlySelect::All => Ok(PlySelect::All),
            PlySelect::Ply(iply) => self.stored_index(iply).map(PlySelect::Ply),
        }
    }

    fn stored_index(&self, iply: usize) -> PropResult<usize> {
        let n = self.plies.len();
        if iply < n {
            Ok(iply)
        } else if self.is_symmetrical() && iply < 2 * n {
            Ok(iply - n)
        } else {
            Err(PropertyError::PlyIndexOutOfRange {
                index: iply,
                nplies: self.nplies(),
            })
        }
    }

    /// The stored ply behind effective index `iply`
    pub fn ply(&self, iply: usize) -> PropResult<&Ply> {
        let i = self.stored_index(iply)?;
        Ok(&self.plies[i])
    }

    pub(crate) fn ply_mut(&mut self, stored: usize) -> Option<&mut Ply> {
        self.plies.get_mut(stored)
    }

    /// Sum of the stored ply thicknesses, doubled when symmetric
    pub fn total_thickness(&self) -> f64 {
        let half: f64 = self.plies.iter().map(|p| p.thickness).sum();
        if self.is_symmetrical() {
            2.0 * half
        } else {
            half
        }
    }

    /// Aggregate or single-ply thickness
    pub fn thickness(&self, select: PlySelect) -> PropResult<f64> {
        match select {
            PlySelect::All => Ok(self.total_thickness()),
            PlySelect::Ply(iply) => Ok(self.ply(iply)?.thickness),
        }
    }

    /// Ply boundary coordinates from `z0` through the effective stack.
    ///
    /// Returns `nplies() + 1` values; adjacent differences are the ply
    /// thicknesses in effective order.
    pub fn z_locations(&self, z0: f64) -> Vec<f64> {
        let mut z = Vec::with_capacity(self.nplies() + 1);
        z.push(z0);
        let mirrored = if self.is_symmetrical() { self.plies.len() } else { 0 };
        let mut zi = z0;
        for ply in self.plies.iter().chain(self.plies.iter().take(mirrored)) {
            zi += ply.thickness;
            z.push(zi);
        }
        z
    }

    /// Material ids of every effective ply
    pub fn material_ids(&self) -> Vec<i64> {
        (0..self.nplies())
            .map(|i| self.plies[i % self.plies.len().max(1)].mid())
            .collect()
    }

    /// Densities of the stored plies; every material must be resolved.
    pub fn densities(&self, owner: &str) -> PropResult<Vec<f64>> {
        self.plies
            .iter()
            .enumerate()
            .map(|(i, ply)| {
                ply.material
                    .require(format!("{} iply={}", owner, i))
                    .map(|m| m.rho)
            })
            .collect()
    }

    /// Mass per area from caller-supplied densities of the stored plies.
    ///
    /// For `PlySelect::All` the method has no effect because the total
    /// non-structural mass is already defined.
    pub fn mass_per_area_rho(&self, rhos: &[f64], nsm: f64, select: PlySelect, method: SmearMethod) -> PropResult<f64> {
        if rhos.len() != self.plies.len() {
            return Err(PropertyError::invalid_data(
                "ply stack",
                format!("{} densities given for {} stored plies", rhos.len(), self.plies.len()),
            ));
        }

        let factor = if self.is_symmetrical() { 2.0 } else { 1.0 };
        let structural = factor * self.plies.iter().zip(rhos).map(|(p, rho)| rho * p.thickness).sum::<f64>();
        let i = match self.adjust_index(select)? {
            PlySelect::All => return Ok(structural + nsm),
            PlySelect::Ply(i) => i,
        };

        let rho = rhos[i];
        let t = self.plies[i].thickness;
        let share_by_count = nsm / self.nplies() as f64;
        let mass_per_area = match method {
            SmearMethod::ByPlyCount => rho * t + share_by_count,
            SmearMethod::ByMassFraction => {
                if structural == 0.0 {
                    // no structural mass to weight by
                    rho * t + share_by_count
                } else {
                    rho * t * (1.0 + nsm / structural)
                }
            }
            SmearMethod::ByThicknessFraction => {
                let total_thickness = self.total_thickness();
                if total_thickness == 0.0 {
                    return Err(PropertyError::invalid_data(
                        "ply stack",
                        "thickness-weighted smearing needs a non-zero total thickness",
                    ));
                }
                t * (rho + nsm / total_thickness)
            }
        };
        Ok(mass_per_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ply(lam: LaminationMode) -> PlyStack {
        PlyStack::new(
            vec![
                Ply::new(300704, 0.037, 0.0, StressOutput::Yes),
                Ply::new(300704, 0.037, 45.0, StressOutput::Yes),
            ],
            lam,
        )
    }

    fn mixed(lam: LaminationMode) -> PlyStack {
        PlyStack::new(
            vec![
                Ply::new(1, 0.01, 0.0, StressOutput::No),
                Ply::new(2, 0.02, 45.0, StressOutput::No),
                Ply::new(3, 0.5, 90.0, StressOutput::Yes),
            ],
            lam,
        )
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-12), "{} != {}", a, b);
    }

    #[test]
    fn test_effective_count() {
        assert_eq!(two_ply(LaminationMode::None).nplies(), 2);
        assert_eq!(two_ply(LaminationMode::Sym).nplies(), 4);
        // only SYM mirrors
        assert_eq!(two_ply(LaminationMode::Smear).nplies(), 2);
        assert_eq!(PlyStack::default().nplies(), 0);
    }

    #[test]
    fn test_adjust_index_symmetric() {
        let stack = two_ply(LaminationMode::Sym);
        assert_eq!(stack.adjust_index(PlySelect::All).unwrap(), PlySelect::All);
        assert_eq!(stack.adjust_index(0.into()).unwrap(), PlySelect::Ply(0));
        assert_eq!(stack.adjust_index(2.into()).unwrap(), PlySelect::Ply(0));
        assert_eq!(stack.adjust_index(3.into()).unwrap(), PlySelect::Ply(1));
        assert_eq!(
            stack.adjust_index(4.into()).unwrap_err(),
            PropertyError::PlyIndexOutOfRange { index: 4, nplies: 4 }
        );
    }

    #[test]
    fn test_adjust_index_unsymmetric() {
        let stack = two_ply(LaminationMode::None);
        assert_eq!(stack.adjust_index(1.into()).unwrap(), PlySelect::Ply(1));
        assert!(stack.adjust_index(2.into()).is_err());
    }

    #[test]
    fn test_thickness() {
        let stack = two_ply(LaminationMode::None);
        assert_close(stack.thickness(PlySelect::All).unwrap(), 0.074);

        let sym = two_ply(LaminationMode::Sym);
        assert_close(sym.thickness(PlySelect::All).unwrap(), 0.148);
        // a mirrored ply keeps its own thickness
        assert_close(sym.thickness(3.into()).unwrap(), 0.037);
    }

    #[test]
    fn test_z_locations() {
        let z = two_ply(LaminationMode::None).z_locations(-0.037);
        assert_eq!(z.len(), 3);
        assert_close(z[0], -0.037);
        assert!(z[1].abs() < 1e-15);
        assert_close(z[2], 0.037);

        let stack = mixed(LaminationMode::Sym);
        let z = stack.z_locations(0.0);
        assert_eq!(z.len(), 7);
        for i in 0..stack.nplies() {
            assert_close(z[i + 1] - z[i], stack.thickness(i.into()).unwrap());
        }
    }

    #[test]
    fn test_material_ids_mirror() {
        assert_eq!(mixed(LaminationMode::Sym).material_ids(), vec![1, 2, 3, 1, 2, 3]);
        assert_eq!(mixed(LaminationMode::None).material_ids(), vec![1, 2, 3]);
        assert!(PlyStack::default().material_ids().is_empty());
    }

    #[test]
    fn test_mass_per_area_total() {
        let stack = mixed(LaminationMode::None);
        let rhos = [1.0, 2.0, 0.1];
        // 0.01 + 0.04 + 0.05 + nsm
        assert_close(
            stack.mass_per_area_rho(&rhos, 0.3, PlySelect::All, SmearMethod::ByMassFraction).unwrap(),
            0.4,
        );
        let sym = mixed(LaminationMode::Sym);
        assert_close(
            sym.mass_per_area_rho(&rhos, 0.3, PlySelect::All, SmearMethod::ByPlyCount).unwrap(),
            0.5,
        );
    }

    #[test]
    fn test_smearing_sums_to_total() {
        let rhos = [1.0, 2.0, 0.1];
        for lam in [LaminationMode::None, LaminationMode::Sym] {
            let stack = mixed(lam);
            let total = stack.mass_per_area_rho(&rhos, 0.3, PlySelect::All, SmearMethod::ByPlyCount).unwrap();
            for method in SmearMethod::ALL {
                let sum: f64 = (0..stack.nplies())
                    .map(|i| stack.mass_per_area_rho(&rhos, 0.3, i.into(), method).unwrap())
                    .sum();
                assert_close(sum, total);
            }
        }
    }

    #[test]
    fn test_smearing_values() {
        let stack = mixed(LaminationMode::None);
        let rhos = [1.0, 2.0, 0.1];
        let nsm = 0.3;
        // 0.04 + 0.3/3
        assert_close(stack.mass_per_area_rho(&rhos, nsm, 1.into(), SmearMethod::ByPlyCount).unwrap(), 0.14);
        // 0.04 * (1 + 0.3/0.1)
        assert_close(stack.mass_per_area_rho(&rhos, nsm, 1.into(), SmearMethod::ByMassFraction).unwrap(), 0.16);
        // 0.02 * (2.0 + 0.3/0.53)
        assert_close(
            stack.mass_per_area_rho(&rhos, nsm, 1.into(), SmearMethod::ByThicknessFraction).unwrap(),
            0.02 * (2.0 + 0.3 / 0.53),
        );
    }

    #[test]
    fn test_mass_fraction_without_structural_mass() {
        let stack = mixed(LaminationMode::None);
        let rhos = [0.0, 0.0, 0.0];
        let per_ply = stack.mass_per_area_rho(&rhos, 0.3, 0.into(), SmearMethod::ByMassFraction).unwrap();
        assert_close(per_ply, 0.1);
    }

    #[test]
    fn test_thickness_fraction_without_thickness() {
        let stack = PlyStack::new(vec![Ply::new(1, 0.0, 0.0, StressOutput::No)], LaminationMode::Sym);
        let err = stack
            .mass_per_area_rho(&[1.0], 0.3, 1.into(), SmearMethod::ByThicknessFraction)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
        assert_close(
            stack.mass_per_area_rho(&[1.0], 0.3, 1.into(), SmearMethod::ByPlyCount).unwrap(),
            0.15,
        );
    }

    #[test]
    fn test_density_count_mismatch() {
        let stack = mixed(LaminationMode::None);
        let err = stack.mass_per_area_rho(&[1.0], 0.0, PlySelect::All, SmearMethod::ByPlyCount).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_densities_require_resolution() {
        let stack = mixed(LaminationMode::None);
        let err = stack.densities("PCOMP pid=5").unwrap_err();
        assert_eq!(err, PropertyError::unresolved("material", 1, "PCOMP pid=5 iply=0"));
    }

    #[test]
    fn test_smear_method_parsing() {
        assert_eq!("nplies".parse::<SmearMethod>().unwrap(), SmearMethod::ByPlyCount);
        assert_eq!("rho*t".parse::<SmearMethod>().unwrap(), SmearMethod::ByMassFraction);
        assert_eq!("t".parse::<SmearMethod>().unwrap(), SmearMethod::ByThicknessFraction);
        assert_eq!(
            "mass".parse::<SmearMethod>().unwrap_err(),
            PropertyError::UnsupportedSmearMethod { method: "mass".into() }
        );
        assert_eq!(serde_json::to_string(&SmearMethod::ByMassFraction).unwrap(), "\"rho*t\"");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(LaminationMode::from_token("SMCORE"), Some(LaminationMode::Smcore));
        assert_eq!(LaminationMode::None.card_token(), None);
        assert_eq!(LaminationMode::Sym.card_token(), Some("SYM"));
        assert_eq!(StressOutput::from_flag(1), Some(StressOutput::Yes));
        assert_eq!(StressOutput::from_flag(2), None);
        assert_eq!(FailureTheory::from_token("TSAI"), Some(FailureTheory::Tsai));
    }
}
