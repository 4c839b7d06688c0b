//! Property-based tests for the ply stack engine using proptest.
//!
//! Covers: effective ply count, index mirroring, thickness and z-location
//! consistency, nsm smearing, cross-reference round trips and card output
//! round trips.

use proptest::prelude::*;
use shell_core::fields::{BdfCard, Field};
use shell_core::materials::{Material, MaterialKind, ModelRegistry};
use shell_core::plies::{LaminationMode, Ply, PlySelect, PlyStack, SmearMethod, StressOutput};
use shell_core::properties::{Pcomp, ShellProperty};

/// (mid, thickness, theta, rho) for one stored ply
fn ply_strategy() -> impl Strategy<Value = (i64, f64, f64, f64)> {
    (1i64..6, 0.001f64..1.0, -90.0f64..90.0, 0.0f64..10.0)
}

fn lam_strategy() -> impl Strategy<Value = LaminationMode> {
    prop_oneof![
        Just(LaminationMode::None),
        Just(LaminationMode::Sym),
        Just(LaminationMode::Smear),
    ]
}

fn build_stack(plies: &[(i64, f64, f64, f64)], lam: LaminationMode) -> (PlyStack, Vec<f64>) {
    let stack = PlyStack::new(
        plies
            .iter()
            .map(|&(mid, t, theta, _)| Ply::new(mid, t, theta, StressOutput::No))
            .collect(),
        lam,
    );
    let rhos = plies.iter().map(|&(_, _, _, rho)| rho).collect();
    (stack, rhos)
}

fn pcomp_card(pid: i64, nsm: f64, plies: &[(i64, f64, f64, f64)], sym: bool) -> BdfCard {
    let mut fields = vec![
        Some(Field::from("PCOMP")),
        Some(Field::from(pid)),
        None,
        Some(Field::from(nsm)),
        None,
        None,
        None,
        None,
        sym.then(|| Field::from("SYM")),
    ];
    for &(mid, t, theta, _) in plies {
        fields.extend([
            Some(Field::from(mid)),
            Some(Field::from(t)),
            Some(Field::from(theta)),
            Some(Field::from("YES")),
        ]);
    }
    BdfCard::new(fields)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-12)
}

// ── Ply Count and Indexing ───────────────────────────────────────────

proptest! {
    /// Effective count is 2n for SYM and n for every other mode.
    #[test]
    fn effective_ply_count(
        plies in prop::collection::vec(ply_strategy(), 0..10),
        lam in lam_strategy(),
    ) {
        let (stack, _) = build_stack(&plies, lam);
        let expected = if lam == LaminationMode::Sym { 2 * plies.len() } else { plies.len() };
        prop_assert_eq!(stack.nplies(), expected);
    }

    /// Adjusting an already adjusted index changes nothing.
    #[test]
    fn adjust_index_idempotent(
        plies in prop::collection::vec(ply_strategy(), 1..10),
        lam in lam_strategy(),
        pick in 0usize..64,
    ) {
        let (stack, _) = build_stack(&plies, lam);
        let iply = pick % stack.nplies();
        let once = stack.adjust_index(PlySelect::Ply(iply)).unwrap();
        prop_assert_eq!(stack.adjust_index(once).unwrap(), once);
        match once {
            PlySelect::Ply(stored) => prop_assert!(stored < plies.len()),
            PlySelect::All => prop_assert!(false, "a ply index adjusted to ALL"),
        }
    }

    /// Indices past the effective stack are rejected.
    #[test]
    fn out_of_range_rejected(
        plies in prop::collection::vec(ply_strategy(), 0..10),
        lam in lam_strategy(),
        extra in 0usize..10,
    ) {
        let (stack, _) = build_stack(&plies, lam);
        prop_assert!(stack.adjust_index(PlySelect::Ply(stack.nplies() + extra)).is_err());
    }
}

// ── Thickness and Fiber Locations ────────────────────────────────────

proptest! {
    /// The aggregate thickness is the sum over every effective ply.
    #[test]
    fn total_thickness_is_sum(
        plies in prop::collection::vec(ply_strategy(), 1..10),
        lam in lam_strategy(),
    ) {
        let (stack, _) = build_stack(&plies, lam);
        let sum: f64 = (0..stack.nplies()).map(|i| stack.thickness(PlySelect::Ply(i)).unwrap()).sum();
        prop_assert!(close(stack.thickness(PlySelect::All).unwrap(), sum));
    }

    /// z-locations start at z0 and step by each ply thickness.
    #[test]
    fn z_locations_step_by_thickness(
        plies in prop::collection::vec(ply_strategy(), 1..10),
        lam in lam_strategy(),
        z0 in -1.0f64..1.0,
    ) {
        let (stack, _) = build_stack(&plies, lam);
        let z = stack.z_locations(z0);
        prop_assert_eq!(z.len(), stack.nplies() + 1);
        prop_assert_eq!(z[0], z0);
        for i in 0..stack.nplies() {
            let t = stack.thickness(PlySelect::Ply(i)).unwrap();
            prop_assert!((z[i + 1] - z[i] - t).abs() < 1e-9);
        }
    }
}

// ── Non-Structural Mass Smearing ─────────────────────────────────────

proptest! {
    /// Per-ply masses sum to the aggregate for every smearing method.
    #[test]
    fn smeared_mass_sums_to_total(
        plies in prop::collection::vec(ply_strategy(), 1..10),
        lam in lam_strategy(),
        nsm in 0.0f64..5.0,
    ) {
        let (stack, rhos) = build_stack(&plies, lam);
        let total = stack.mass_per_area_rho(&rhos, nsm, PlySelect::All, SmearMethod::ByPlyCount).unwrap();
        for method in SmearMethod::ALL {
            let sum: f64 = (0..stack.nplies())
                .map(|i| stack.mass_per_area_rho(&rhos, nsm, PlySelect::Ply(i), method).unwrap())
                .sum();
            prop_assert!(close(sum, total), "{}: {} != {}", method, sum, total);
        }
    }

    /// Unknown method names are rejected without touching the record.
    #[test]
    fn unknown_method_rejected(name in "[a-z]{2,8}") {
        prop_assume!(!["nplies", "t"].contains(&name.as_str()));
        let plies = [(1, 0.1, 0.0, 1.0)];
        let card = pcomp_card(1, 0.0, &plies, false);
        let mut record = Pcomp::parse(&card).unwrap();
        record.cross_reference(&registry()).unwrap();
        let before = record.clone();

        let err = record.laminate.mass_per_area_by_name(PlySelect::Ply(0), &name).unwrap_err();
        prop_assert_eq!(err.error_code(), "UNSUPPORTED_SMEAR_METHOD");
        prop_assert_eq!(record, before);
    }
}

fn registry() -> ModelRegistry {
    ModelRegistry::from_materials((1..6).map(|mid| Material::new(mid, MaterialKind::Mat8).with_density(mid as f64)))
}

// ── Cards ────────────────────────────────────────────────────────────

proptest! {
    /// Cross-referencing then uncross-referencing restores the record.
    #[test]
    fn cross_reference_round_trip(
        plies in prop::collection::vec(ply_strategy(), 1..8),
        sym in any::<bool>(),
        nsm in 0.0f64..1.0,
    ) {
        let card = pcomp_card(10, nsm, &plies, sym);
        let original = ShellProperty::parse(&card).unwrap();
        let mut record = original.clone();
        record.cross_reference(&registry()).unwrap();
        prop_assert!(record.mass_per_area().unwrap() >= nsm);
        record.uncross_reference();
        prop_assert_eq!(record, original);
    }

    /// Canonical output parses back to the same record.
    #[test]
    fn repr_fields_reparse(
        plies in prop::collection::vec(ply_strategy(), 1..8),
        sym in any::<bool>(),
        nsm in 0.0f64..1.0,
    ) {
        let card = pcomp_card(10, nsm, &plies, sym);
        let record = ShellProperty::parse(&card).unwrap();
        let reparsed = ShellProperty::parse(&BdfCard::new(record.repr_fields())).unwrap();
        prop_assert!(reparsed.is_same_card(&record));
        prop_assert_eq!(reparsed.laminate().map(|l| l.z0), record.laminate().map(|l| l.z0));
    }

    /// A non-positive ply thickness aborts construction.
    #[test]
    fn non_positive_thickness_rejected(
        plies in prop::collection::vec(ply_strategy(), 1..6),
        bad in -1.0f64..=0.0,
        at in 0usize..6,
    ) {
        let mut plies = plies;
        let at = at % plies.len();
        plies[at].1 = bad;
        let err = Pcomp::parse(&pcomp_card(3, 0.0, &plies, false)).unwrap_err();
        prop_assert_eq!(err.error_code(), "INVALID_PLY_THICKNESS");
    }
}
