//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use mixture_sim_core::catalog::{Catalog, ReactionBuilder, SpeciesBuilder, SpeciesRole};
use mixture_sim_core::core_types::{Celsius, Reaction, ReactionResult, Species, SpeciesTag};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small aqueous catalog with handles to its species
pub struct Aqueous {
    pub catalog: Catalog,
    pub water: Arc<Species>,
    pub proton: Arc<Species>,
    pub hydroxide: Arc<Species>,
    pub sodium: Arc<Species>,
    pub chloride: Arc<Species>,
    pub acetic_acid: Arc<Species>,
    pub acetate: Arc<Species>,
    pub neutralization: Arc<Reaction>,
}

pub fn aqueous() -> Aqueous {
    aqueous_in(Catalog::default())
}

/// The aqueous species and reactions added to an existing catalog
pub fn aqueous_in(mut catalog: Catalog) -> Aqueous {

    let water = catalog
        .register_species(
            SpeciesBuilder::new("lab")
                .id("water")
                .mass(18.015)
                .density(1000.0)
                .boiling_point(Celsius::new(100.0))
                .molar_heat_capacity(75.3)
                .latent_heat(40_650.0)
                .tag(SpeciesTag::Solvent)
                .build()
                .unwrap(),
        )
        .unwrap();
    let proton = ion(&mut catalog, "proton", 1.008, 1);
    let hydroxide = ion(&mut catalog, "hydroxide", 17.007, -1);
    let sodium = ion(&mut catalog, "sodium_ion", 22.99, 1);
    let chloride = ion(&mut catalog, "chloride", 35.45, -1);
    let acetic_acid = catalog
        .register_species(
            SpeciesBuilder::new("lab")
                .id("acetic_acid")
                .mass(60.052)
                .density(1049.0)
                .boiling_point(Celsius::new(118.1))
                .molar_heat_capacity(123.1)
                .build()
                .unwrap(),
        )
        .unwrap();
    let acetate = ion(&mut catalog, "acetate", 59.044, -1);

    catalog.assign_role(SpeciesRole::Water, water.id()).unwrap();
    catalog.assign_role(SpeciesRole::Proton, proton.id()).unwrap();
    catalog.assign_role(SpeciesRole::SodiumCation, sodium.id()).unwrap();
    catalog.assign_role(SpeciesRole::ChlorideAnion, chloride.id()).unwrap();

    let neutralization = catalog
        .register_reaction(
            ReactionBuilder::new("lab")
                .id("neutralization")
                .reactant(&proton, 1)
                .reactant(&hydroxide, 1)
                .product(&water, 1)
                .preexponential_factor(1e6)
                .activation_energy(0.0)
                .enthalpy_change(-57.0)
                .build()
                .unwrap(),
        )
        .unwrap();
    catalog
        .register_acid("lab", &acetic_acid, &acetate, 4.756)
        .unwrap();

    Aqueous {
        catalog,
        water,
        proton,
        hydroxide,
        sodium,
        chloride,
        acetic_acid,
        acetate,
        neutralization,
    }
}

fn ion(catalog: &mut Catalog, name: &str, mass: f64, charge: i32) -> Arc<Species> {
    catalog
        .register_species(
            SpeciesBuilder::new("lab")
                .id(name)
                .mass(mass)
                .charge(charge)
                .molar_heat_capacity(75.0)
                .build()
                .unwrap(),
        )
        .unwrap()
}

/// An inert species for tests that only need something to dilute
pub fn inert(catalog: &mut Catalog, name: &str) -> Arc<Species> {
    catalog
        .register_species(
            SpeciesBuilder::new("test")
                .id(name)
                .mass(50.0)
                .density(1000.0)
                .build()
                .unwrap(),
        )
        .unwrap()
}

/// A result that counts its payouts
#[derive(Debug)]
pub struct Tally {
    required: f64,
    paid: AtomicU32,
}

impl Tally {
    pub fn new(required: f64) -> Arc<Self> {
        Arc::new(Self {
            required,
            paid: AtomicU32::new(0),
        })
    }

    pub fn paid(&self) -> u32 {
        self.paid.load(Ordering::SeqCst)
    }
}

impl ReactionResult for Tally {
    fn required_moles(&self) -> f64 {
        self.required
    }

    fn apply(&self, times: u32) {
        self.paid.fetch_add(times, Ordering::SeqCst);
    }
}
