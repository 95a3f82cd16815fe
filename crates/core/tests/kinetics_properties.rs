//! Conservation and convergence properties of the tick engine
//!
//! Run tests with: cargo test --test `kinetics_properties`

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mixture_sim_core::catalog::{Catalog, ReactionBuilder, SpeciesBuilder};
use mixture_sim_core::core_types::{Kelvin, Liters, Species, SpeciesId};
use mixture_sim_core::simulation::EquilibriumTolerance;
use mixture_sim_core::{ChemistryError, KineticsConfig, Mixture, ReactionContext};

// ═══════════════════════════════════════════════════════════════════════════════
// Mole and atom conservation
// ═══════════════════════════════════════════════════════════════════════════════

/// Element counts (H, Cl, O, N) for each test molecule
fn atoms() -> HashMap<&'static str, [f64; 4]> {
    HashMap::from([
        ("hydrogen", [2.0, 0.0, 0.0, 0.0]),
        ("chlorine", [0.0, 2.0, 0.0, 0.0]),
        ("hydrogen_chloride", [1.0, 1.0, 0.0, 0.0]),
        ("oxygen", [0.0, 0.0, 2.0, 0.0]),
        ("water", [2.0, 0.0, 1.0, 0.0]),
        ("nitrogen", [0.0, 0.0, 0.0, 2.0]),
        ("ammonia", [3.0, 0.0, 0.0, 1.0]),
    ])
}

fn atom_totals(mixture: &Mixture, species: &[Arc<Species>]) -> [f64; 4] {
    let table = atoms();
    let mut totals = [0.0; 4];
    for s in species {
        let SpeciesId::Catalog { name, .. } = s.id() else {
            unreachable!("fixture species are all cataloged");
        };
        let counts = table[name.as_str()];
        let concentration = mixture.concentration_of(s.id());
        for (total, count) in totals.iter_mut().zip(counts) {
            *total += concentration * count;
        }
    }
    totals
}

fn balanced_catalog() -> (Catalog, Vec<Arc<Species>>) {
    let mut catalog = Catalog::default();
    let mut species = HashMap::new();
    for (name, mass) in [
        ("hydrogen", 2.016),
        ("chlorine", 70.9),
        ("hydrogen_chloride", 36.46),
        ("oxygen", 32.0),
        ("water", 18.015),
        ("nitrogen", 28.014),
        ("ammonia", 17.031),
    ] {
        let registered = catalog
            .register_species(SpeciesBuilder::new("test").id(name).mass(mass).build().unwrap())
            .unwrap();
        species.insert(name, registered);
    }

    let reactions = [
        ("chlorination", vec![("hydrogen", 1), ("chlorine", 1)], vec![("hydrogen_chloride", 2)]),
        ("combustion", vec![("hydrogen", 2), ("oxygen", 1)], vec![("water", 2)]),
        ("haber", vec![("nitrogen", 1), ("hydrogen", 3)], vec![("ammonia", 2)]),
    ];
    for (id, reactants, products) in reactions {
        let mut builder = ReactionBuilder::new("test").id(id).enthalpy_change(-20.0);
        for (name, ratio) in reactants {
            builder = builder.reactant(&species[name], ratio);
        }
        for (name, ratio) in products {
            builder = builder.product(&species[name], ratio);
        }
        catalog.register_reaction(builder.build().unwrap()).unwrap();
    }

    let all = ["hydrogen", "chlorine", "hydrogen_chloride", "oxygen", "water", "nitrogen", "ammonia"]
        .iter()
        .map(|name| Arc::clone(&species[name]))
        .collect();
    (catalog, all)
}

#[test]
fn test_atoms_conserved_across_ticks() {
    let (catalog, species) = balanced_catalog();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _trial in 0..20 {
        let mut mixture = Mixture::new();
        for s in &species[..4] {
            mixture.add_species(s, rng.random_range(0.01..2.0));
        }
        mixture.add_species(&species[5], rng.random_range(0.01..2.0));
        let before = atom_totals(&mixture, &species);

        for _ in 0..25 {
            mixture.tick_once(&catalog, &ReactionContext::default());
            let after = atom_totals(&mixture, &species);
            for (b, a) in before.iter().zip(after) {
                assert_relative_eq!(*b, a, max_relative = 1e-9, epsilon = 1e-12);
            }
        }
        assert!(
            mixture.concentration_of(species[4].id()) > 0.0
                || mixture.concentration_of(species[6].id()) > 0.0,
            "something should have reacted"
        );
    }
}

#[test]
fn test_exothermic_reaction_warms_mixture() {
    let (catalog, species) = balanced_catalog();
    let mut mixture = Mixture::new();
    mixture
        .add_species(&species[0], 1.0)
        .add_species(&species[1], 1.0);
    let start = *mixture.temperature();
    mixture.tick_once(&catalog, &ReactionContext::default());
    assert!(*mixture.temperature() > start);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Equilibrium
// ═══════════════════════════════════════════════════════════════════════════════

fn isomerization(forward: f64, reverse: f64) -> (Catalog, Arc<Species>, Arc<Species>) {
    let mut catalog = Catalog::default();
    let a = common::inert(&mut catalog, "a");
    let b = common::inert(&mut catalog, "b");
    catalog
        .register_reversible(
            ReactionBuilder::new("test")
                .id("isomerization")
                .reactant(&a, 1)
                .product(&b, 1)
                .preexponential_factor(forward)
                .activation_energy(0.0),
            |reverse_builder| reverse_builder.preexponential_factor(reverse),
        )
        .unwrap();
    (catalog, a, b)
}

#[test]
fn test_equilibrium_idempotence() {
    let (catalog, a, b) = isomerization(10.0, 5.0);
    let mut rng = StdRng::seed_from_u64(42);

    for _trial in 0..10 {
        let mut mixture = Mixture::new();
        mixture
            .add_species(&a, rng.random_range(0.1..3.0))
            .add_species(&b, rng.random_range(0.1..3.0));

        let mut ticks = 0;
        while !mixture.is_at_equilibrium() && ticks < 1000 {
            mixture.tick_once(&catalog, &ReactionContext::default());
            ticks += 1;
        }
        assert!(mixture.is_at_equilibrium(), "no equilibrium after {ticks} ticks");

        // Forward twice as fast as reverse: b settles at twice a
        let (ca, cb) = (mixture.concentration_of(a.id()), mixture.concentration_of(b.id()));
        assert_relative_eq!(cb / ca, 2.0, max_relative = 1e-4);

        mixture.tick_once(&catalog, &ReactionContext::default());
        assert!(mixture.is_at_equilibrium());
        assert_eq!(mixture.concentration_of(a.id()), ca);
        assert_eq!(mixture.concentration_of(b.id()), cb);

        // Forcing another real tick still moves nothing measurable
        mixture.disturb_equilibrium();
        mixture.tick_once(&catalog, &ReactionContext::default());
        assert!(mixture.is_at_equilibrium());
        assert_relative_eq!(mixture.concentration_of(a.id()), ca, max_relative = 1e-5);
        assert_relative_eq!(mixture.concentration_of(b.id()), cb, max_relative = 1e-5);
    }
}

#[test]
fn test_acid_dissociation_reaches_pka() {
    let fixture = common::aqueous();
    // Coarse ticks and a tight absolute tolerance so the slow association
    // settles well inside the loop cap
    let config = KineticsConfig {
        ticks_per_second: 1.0,
        equilibrium_tolerance: EquilibriumTolerance::Absolute(1e-12),
        ..KineticsConfig::default()
    };
    let mut mixture = Mixture::with_config(config);
    mixture
        .add_species(&fixture.water, 50.0)
        .add_species(&fixture.acetic_acid, 1.0)
        .add_species(&fixture.proton, 1e-3)
        .add_species(&fixture.acetate, 1e-3);
    mixture.set_temperature(Kelvin::REFERENCE);

    let mut ticks = 0;
    while !mixture.is_at_equilibrium() && ticks < 100_000 {
        mixture.tick_once(&fixture.catalog, &ReactionContext::default());
        ticks += 1;
    }
    assert!(mixture.is_at_equilibrium());

    let ka = mixture.concentration_of(fixture.proton.id())
        * mixture.concentration_of(fixture.acetate.id())
        / mixture.concentration_of(fixture.acetic_acid.id());
    assert_relative_eq!(-ka.log10(), 4.756, epsilon = 1e-3);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Limiting reagent
// ═══════════════════════════════════════════════════════════════════════════════

fn combination(preexponential_factor: f64) -> (Catalog, [Arc<Species>; 3]) {
    let mut catalog = Catalog::default();
    let a = common::inert(&mut catalog, "a");
    let b = common::inert(&mut catalog, "b");
    let c = common::inert(&mut catalog, "c");
    catalog
        .register_reaction(
            ReactionBuilder::new("test")
                .id("combination")
                .reactant(&a, 1)
                .reactant(&b, 1)
                .product(&c, 1)
                .preexponential_factor(preexponential_factor)
                .activation_energy(0.0)
                .build()
                .unwrap(),
        )
        .unwrap();
    (catalog, [a, b, c])
}

#[test]
fn test_limiting_reagent_single_tick() {
    let (catalog, [a, b, c]) = combination(1e6);
    let mut mixture = Mixture::new();
    mixture.add_species(&a, 1.0).add_species(&b, 0.1);
    mixture.tick_once(&catalog, &ReactionContext::default());

    assert_relative_eq!(mixture.concentration_of(c.id()), 0.1, epsilon = 1e-12);
    assert_eq!(mixture.concentration_of(b.id()), 0.0);
    assert_relative_eq!(mixture.concentration_of(a.id()), 0.9, epsilon = 1e-12);
}

#[test]
fn test_limiting_reagent_over_many_ticks() {
    let (catalog, [a, b, c]) = combination(4.0);
    let mut mixture = Mixture::new();
    mixture.add_species(&a, 1.0).add_species(&b, 0.1);

    for _ in 0..300 {
        mixture.tick_once(&catalog, &ReactionContext::default());
        assert!(mixture.concentration_of(c.id()) <= 0.1 + 1e-12);
    }
    assert_abs_diff_eq!(mixture.concentration_of(b.id()), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(mixture.concentration_of(c.id()), 0.1, epsilon = 1e-9);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mixing
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mixing_conserves_moles_and_energy() {
    let fixture = common::aqueous();
    let mut catalog = fixture.catalog;
    let x = common::inert(&mut catalog, "x");

    let mut first = Mixture::new();
    first
        .add_species(&fixture.water, 50.0)
        .add_species(&x, 2.0)
        .set_temperature(Kelvin::new(290.0));
    let mut second = Mixture::new();
    second
        .add_species(&fixture.water, 50.0)
        .add_species(&x, 0.0)
        .set_temperature(Kelvin::new(330.0));

    let energy_before = first.internal_energy() + second.internal_energy();
    let mixed = Mixture::mix(vec![(first, 1.0), (second, 1.0)]);

    assert_relative_eq!(mixed.concentration_of(x.id()), 1.0, epsilon = 1e-12);
    assert_relative_eq!(mixed.concentration_of(fixture.water.id()), 50.0, epsilon = 1e-9);
    assert_relative_eq!(mixed.internal_energy() * 2.0, energy_before, max_relative = 1e-9);
    assert!(*mixed.temperature() > 290.0 && *mixed.temperature() < 330.0);
}

#[test]
fn test_mixing_resolves_boiling() {
    let fixture = common::aqueous();
    let mut hot = Mixture::new();
    hot.add_species(&fixture.water, 55.0)
        .set_temperature(Kelvin::new(500.0));
    let mut cold = Mixture::new();
    cold.add_species(&fixture.water, 55.0)
        .set_temperature(Kelvin::new(280.0));
    let energy_before = hot.internal_energy() * 0.1 + cold.internal_energy() * 0.9;

    let mixed = Mixture::mix(vec![(hot, 0.1), (cold, 0.9)]);
    assert_relative_eq!(mixed.internal_energy(), energy_before, max_relative = 1e-9);
    // The steam condenses into the cold water
    assert_eq!(mixed.gas_fraction(fixture.water.id()), Some(0.0));
    assert!(*mixed.temperature() < 373.15);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reverse reactions
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reverse_reaction_thermodynamics() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut catalog = Catalog::default();
    let a = common::inert(&mut catalog, "a");
    let b = common::inert(&mut catalog, "b");

    for i in 0..50 {
        let ea: f64 = rng.random_range(0.0..150.0);
        let dh: f64 = rng.random_range(-200.0..200.0);
        let (forward, reverse) = ReactionBuilder::new("test")
            .id(&format!("reaction_{i}"))
            .reactant(&a, 1)
            .product(&b, 2)
            .activation_energy(ea)
            .enthalpy_change(dh)
            .build_reversible(|r| r)
            .unwrap();

        assert_eq!(reverse.activation_energy(), forward.activation_energy() - forward.enthalpy_change());
        assert_eq!(reverse.enthalpy_change(), -forward.enthalpy_change());
        assert_eq!(reverse.reactant_ratio(b.id()), Some(2));
        assert_eq!(reverse.product_ratio(a.id()), Some(1));
        assert_eq!(reverse.reverse_id(), forward.id());
    }
}

#[test]
fn test_reverse_override_must_obey_hess() {
    let mut catalog = Catalog::default();
    let a = common::inert(&mut catalog, "a");
    let b = common::inert(&mut catalog, "b");
    let result = catalog.register_reversible(
        ReactionBuilder::new("test")
            .id("bad")
            .reactant(&a, 1)
            .product(&b, 1)
            .activation_energy(50.0)
            .enthalpy_change(-10.0),
        |r| r.activation_energy(30.0),
    );
    assert!(matches!(
        result,
        Err(ChemistryError::ThermodynamicInconsistency { .. })
    ));
    assert_eq!(catalog.all_reactions().count(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bounded convergence
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_oscillating_mixture_hits_tick_cap() {
    // Both directions are fast enough to empty their reactant every tick, so
    // the contents flip back and forth forever
    let (catalog, a, b) = isomerization(400.0, 400.0);
    let config = KineticsConfig {
        max_equilibrium_ticks: 75,
        ..KineticsConfig::default()
    };
    let mut mixture = Mixture::with_config(config);
    mixture.add_species(&a, 1.0);

    let outcome = mixture.react_to_equilibrium(&catalog, Liters::new(1.0), &mut Vec::new(), None);
    assert_eq!(outcome.ticks, 75);
    assert!(!mixture.is_at_equilibrium());
    // 1 mol of a 20 mol/L pure species really fills 50 mL
    assert_relative_eq!(*outcome.volume, 0.05, epsilon = 1e-12);
    assert_relative_eq!(
        mixture.concentration_of(a.id()) + mixture.concentration_of(b.id()),
        a.pure_concentration(),
        epsilon = 1e-9
    );
}

#[test]
fn test_default_tick_cap() {
    let (catalog, a, _) = isomerization(400.0, 400.0);
    let mut mixture = Mixture::new();
    mixture.add_species(&a, 1.0);
    let outcome = mixture.react_to_equilibrium(&catalog, Liters::new(1.0), &mut Vec::new(), None);
    assert_eq!(outcome.ticks, KineticsConfig::default().max_equilibrium_ticks);
}
