use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use mixture_sim_core::catalog::{Catalog, ReactionBuilder, SpeciesBuilder, SpeciesRole};
use mixture_sim_core::core_types::{
    Celsius, FunctionalGroup, GroupType, ItemId, ItemMatcher, ItemStack, Kelvin, Liters,
    ReactionId, ReactionResult, Species, SpeciesTag, StructuralCode, StructureDescription,
    StructureTable,
};
use mixture_sim_core::{ChemistryError, GenericReaction, HeatExchange, KineticsConfig, Mixture};

/// Mixture kinetics demo with configurable conditions
#[derive(Parser, Debug)]
#[command(name = "mixture-sim-demo")]
#[command(about = "Reacts a chemical mixture to equilibrium and reports the result", long_about = None)]
struct Args {
    /// Scenario (neutralization, vinegar, esterification, silver, iron)
    #[arg(short, long, default_value = "neutralization")]
    scenario: String,

    /// Basin volume in liters
    #[arg(short, long, default_value_t = 1.0)]
    volume: f64,

    /// Starting temperature in °C
    #[arg(short, long, default_value_t = 25.0)]
    temperature: f64,

    /// Heater power in W (0 = no heater)
    #[arg(short, long, default_value_t = 0.0)]
    power: f64,

    /// Surrounding temperature in °C
    #[arg(long, default_value_t = 25.0)]
    ambient: f64,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 600)]
    max_ticks: u32,

    /// Iron nuggets dropped into the iron scenario
    #[arg(long, default_value_t = 4)]
    nuggets: u32,

    /// Print the final mixture as its persisted JSON record
    #[arg(long)]
    json: bool,

    /// Run validation checks
    #[arg(long)]
    validate: bool,
}

/// Announces a payout through the log
#[derive(Debug)]
struct Announcement {
    message: &'static str,
    required: f64,
}

impl ReactionResult for Announcement {
    fn required_moles(&self) -> f64 {
        self.required
    }

    fn apply(&self, times: u32) {
        info!("{} (x{})", self.message, times);
    }
}

struct Lab {
    catalog: Catalog,
    water: Arc<Species>,
    proton: Arc<Species>,
    hydroxide: Arc<Species>,
    sodium: Arc<Species>,
    chloride: Arc<Species>,
    acetic_acid: Arc<Species>,
    silver: Arc<Species>,
    nitrate: Arc<Species>,
    ethanol: Arc<Species>,
    iron_nugget: ItemId,
}

fn code(body: &str) -> Result<StructuralCode, ChemistryError> {
    StructuralCode::parse(&format!("lab:linear:{body}"))
}

fn build_lab() -> Result<Lab, ChemistryError> {
    let alcohol = GroupType::new("alcohol");
    let carboxylic_acid = GroupType::new("carboxylic_acid");

    let mut structures = StructureTable::new();
    structures
        .insert(
            code("CCO")?,
            StructureDescription::new(46.07)
                .with_group(FunctionalGroup::new(&alcohol, [2]))
                .with_boiling_point(Celsius::new(78.4).into())
                .with_density(789.0),
        )
        .insert(
            code("CCOC(=O)C")?,
            StructureDescription::new(88.11)
                .with_boiling_point(Celsius::new(77.1).into())
                .with_density(902.0),
        );
    let mut catalog = Catalog::new(Arc::new(structures));

    let water = catalog.register_species(
        SpeciesBuilder::new("lab")
            .id("water")
            .mass(18.015)
            .density(1000.0)
            .boiling_point(Celsius::new(100.0))
            .molar_heat_capacity(75.3)
            .latent_heat(40_650.0)
            .tag(SpeciesTag::Solvent)
            .build()?,
    )?;
    let ion = |name: &str, mass: f64, charge: i32| {
        SpeciesBuilder::new("lab")
            .id(name)
            .mass(mass)
            .charge(charge)
            .molar_heat_capacity(75.0)
            .build()
    };
    let proton = catalog.register_species(ion("proton", 1.008, 1)?)?;
    let hydroxide = catalog.register_species(ion("hydroxide", 17.007, -1)?)?;
    let sodium = catalog.register_species(ion("sodium_ion", 22.99, 1)?)?;
    let chloride = catalog.register_species(ion("chloride", 35.45, -1)?)?;
    let acetate = catalog.register_species(ion("acetate", 59.044, -1)?)?;
    let silver = catalog.register_species(ion("silver_ion", 107.87, 1)?)?;
    let nitrate = catalog.register_species(ion("nitrate", 62.004, -1)?)?;
    let acetic_acid = catalog.register_species(
        SpeciesBuilder::new("lab")
            .id("acetic_acid")
            .structure(code("CC(=O)O")?)
            .mass(60.052)
            .density(1049.0)
            .boiling_point(Celsius::new(118.1))
            .molar_heat_capacity(123.1)
            .functional_group(FunctionalGroup::new(&carboxylic_acid, [1]))
            .build()?,
    )?;
    let iron_ion = catalog.register_species(ion("iron_ii", 55.845, 2)?)?;
    let hydrogen = catalog.register_species(
        SpeciesBuilder::new("lab")
            .id("hydrogen")
            .mass(2.016)
            .boiling_point(Celsius::new(-252.9))
            .molar_heat_capacity(28.8)
            .build()?,
    )?;
    let ethanol = catalog
        .novel_species(&code("CCO")?)
        .ok_or_else(|| ChemistryError::NotFound {
            kind: "structure",
            id: "lab:linear:CCO".to_string(),
        })?;

    catalog.assign_role(SpeciesRole::Water, water.id())?;
    catalog.assign_role(SpeciesRole::Proton, proton.id())?;
    catalog.assign_role(SpeciesRole::SodiumCation, sodium.id())?;
    catalog.assign_role(SpeciesRole::ChlorideAnion, chloride.id())?;

    catalog.register_reaction(
        ReactionBuilder::new("lab")
            .id("neutralization")
            .reactant(&proton, 1)
            .reactant(&hydroxide, 1)
            .product(&water, 1)
            .preexponential_factor(1e6)
            .activation_energy(0.0)
            .enthalpy_change(-57.0)
            .build()?,
    )?;
    catalog.register_acid("lab", &acetic_acid, &acetate, 4.756)?;

    let silver_chloride = ItemId::new("lab:silver_chloride");
    catalog.register_reaction(
        ReactionBuilder::new("lab")
            .id("silver_chloride_precipitation")
            .reactant(&silver, 1)
            .reactant(&chloride, 1)
            .item_product(&silver_chloride, &["lab:dusts"], 4.0)
            .preexponential_factor(1e5)
            .activation_energy(0.0)
            .enthalpy_change(-65.5)
            .with_result(Arc::new(Announcement {
                message: "Silver chloride crystallized",
                required: 0.25,
            }))
            .build()?,
    )?;

    let iron_nugget = ItemId::new("lab:iron_nugget");
    catalog.register_reaction(
        ReactionBuilder::new("lab")
            .id("iron_dissolution")
            .item_reactant(ItemMatcher::Item(iron_nugget.clone()), 0.01)
            .reactant(&proton, 2)
            .product(&iron_ion, 1)
            .product(&hydrogen, 1)
            .enthalpy_change(-89.1)
            .build()?,
    )?;

    let esters = HashMap::from([((code("CCO")?, code("CC(=O)O")?), code("CCOC(=O)C")?)]);
    let water_for_esters = Arc::clone(&water);
    catalog.register_generic(GenericReaction::double_group(
        ReactionId::new("lab", "esterification"),
        &alcohol,
        &carboxylic_acid,
        move |catalog, alcohol, acid| {
            let pair = (
                alcohol.species.structure()?.clone(),
                acid.species.structure()?.clone(),
            );
            let ester = catalog.novel_species(esters.get(&pair)?)?;
            ReactionBuilder::generated("lab")
                .reactant(&alcohol.species, 1)
                .reactant(&acid.species, 1)
                .catalyst(catalog.role(SpeciesRole::Proton)?, 1)
                .product(&ester, 1)
                .product(&water_for_esters, 1)
                .preexponential_factor(2e3)
                .activation_energy(10.0)
                .enthalpy_change(-3.0)
                .build()
                .ok()
        },
    ))?;

    Ok(Lab {
        catalog,
        water,
        proton,
        hydroxide,
        sodium,
        chloride,
        acetic_acid,
        silver,
        nitrate,
        ethanol,
        iron_nugget,
    })
}

fn scenario(
    lab: &Lab,
    name: &str,
    nuggets: u32,
    config: KineticsConfig,
) -> (Mixture, Vec<ItemStack>) {
    let mut mixture = Mixture::with_config(config).named(&format!("mixture.lab.{name}"));
    let mut items = Vec::new();
    match name {
        "vinegar" => {
            mixture
                .add_species(&lab.water, 52.0)
                .add_species(&lab.acetic_acid, 0.85);
        }
        "esterification" => {
            mixture
                .add_species(&lab.ethanol, 8.0)
                .add_species(&lab.acetic_acid, 8.0)
                .add_species(&lab.proton, 0.1)
                .add_species(&lab.chloride, 0.1);
        }
        "silver" => {
            mixture
                .add_species(&lab.water, 50.0)
                .add_species(&lab.silver, 0.5)
                .add_species(&lab.nitrate, 0.5)
                .add_species(&lab.sodium, 0.6)
                .add_species(&lab.chloride, 0.6);
        }
        "iron" => {
            mixture
                .add_species(&lab.water, 50.0)
                .add_species(&lab.proton, 1.0)
                .add_species(&lab.chloride, 1.0);
            items.push(ItemStack::new(&lab.iron_nugget, nuggets));
        }
        other => {
            if other != "neutralization" {
                println!("Unknown scenario '{}', using neutralization", other);
            }
            mixture
                .add_species(&lab.water, 50.0)
                .add_species(&lab.proton, 1.0)
                .add_species(&lab.chloride, 1.0)
                .add_species(&lab.sodium, 1.0)
                .add_species(&lab.hydroxide, 1.0);
        }
    }
    (mixture, items)
}

fn print_composition(mixture: &Mixture) {
    println!("Species                              | mol/L      | Gas");
    println!("-------------------------------------|------------|------");
    for (species, concentration) in mixture.contents(false) {
        if concentration <= 0.0 {
            continue;
        }
        let gas = mixture.gas_fraction(species.id()).unwrap_or(0.0);
        println!("{:36} | {:10.5} | {:4.0}%", species.id().to_string(), concentration, gas * 100.0);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    println!("=== Mixture Simulation Demo ===\n");

    let lab = build_lab()?;
    println!(
        "Catalog: {} species, {} reactions, {} generic templates",
        lab.catalog.all_species().count(),
        lab.catalog.all_reactions().count(),
        lab.catalog.all_generic_reactions().count()
    );

    let config = KineticsConfig {
        max_equilibrium_ticks: args.max_ticks,
        ..KineticsConfig::default()
    };
    let (mut mixture, mut items) =
        scenario(&lab, &args.scenario.to_lowercase(), args.nuggets, config);
    mixture.set_temperature(Celsius::new(args.temperature));

    let heating = (args.power > 0.0 || args.ambient != args.temperature).then(|| HeatExchange {
        power: args.power,
        ambient: Celsius::new(args.ambient).into(),
    });

    println!("\nInitial mixture at {:.2} K in {:.2} L:", *mixture.temperature(), args.volume);
    print_composition(&mixture);
    if !items.is_empty() {
        println!("Items: {:?}", items.iter().map(|s| (s.item.as_str(), s.count)).collect::<Vec<_>>());
    }

    println!("\nReacting to equilibrium...\n");
    let outcome =
        mixture.react_to_equilibrium(&lab.catalog, Liters::new(args.volume), &mut items, heating);

    println!("=== Reaction Complete ===");
    println!("Ticks: {}{}", outcome.ticks, if mixture.is_at_equilibrium() { "" } else { " (gave up)" });
    println!("Volume: {:.4} L", *outcome.volume);
    println!("Temperature: {:.2} K ({:.2}°C)", *mixture.temperature(), *mixture.temperature().to_celsius());
    print_composition(&mixture);

    for (reaction, moles) in mixture.last_tick_reactions() {
        println!("  last tick: {} {:.3e} mol/L", reaction.key(), moles);
    }
    if !items.is_empty() {
        println!("Items: {:?}", items.iter().map(|s| (s.item.as_str(), s.count)).collect::<Vec<_>>());
    }
    for completed in &outcome.results {
        completed.apply();
    }

    if args.json {
        println!("\n{}", mixture.to_json()?);
    }

    if args.validate {
        run_validation_checks(&lab);
    }
    Ok(())
}

fn check(passed: bool, pass: &str, fail: &str) {
    if passed {
        println!("  ✓ PASS: {}", pass);
    } else {
        println!("  ✗ FAIL: {}", fail);
    }
}

fn run_validation_checks(lab: &Lab) {
    println!("\n=== Running Validation Checks ===\n");

    // Spectator ions come through untouched
    println!("Check 1: Spectator Conservation");
    let (mut mixture, mut items) = scenario(lab, "neutralization", 0, KineticsConfig::default());
    let outcome = mixture.react_to_equilibrium(&lab.catalog, Liters::new(1.0), &mut items, None);
    let sodium_moles = mixture.concentration_of(lab.sodium.id()) * *outcome.volume;
    println!("  Sodium: {:.6} mol", sodium_moles);
    check(
        (sodium_moles - 1.0).abs() < 1e-9,
        "Sodium moles unchanged",
        "Sodium moles drifted",
    );

    println!("\nCheck 2: Vinegar Acidity");
    let (mut mixture, mut items) = scenario(lab, "vinegar", 0, KineticsConfig::default());
    mixture.react_to_equilibrium(&lab.catalog, Liters::new(1.0), &mut items, None);
    let proton = mixture.concentration_of(lab.proton.id());
    let ph = -proton.log10();
    println!("  pH: {:.2}", ph);
    check((2.0..3.5).contains(&ph), "Weak acid is weakly acidic", "pH out of range");

    println!("\nCheck 3: Mixing Energy");
    let mut hot = Mixture::new();
    hot.add_species(&lab.water, 55.0).set_temperature(Kelvin::new(350.0));
    let mut cold = Mixture::new();
    cold.add_species(&lab.water, 55.0).set_temperature(Kelvin::new(290.0));
    let mixed = Mixture::mix(vec![(hot, 1.0), (cold, 1.0)]);
    println!("  Mixed temperature: {:.2} K", *mixed.temperature());
    check(
        (*mixed.temperature() - 320.0).abs() < 1e-6,
        "Equal volumes meet halfway",
        "Energy not conserved",
    );

    println!("\n=== Validation Complete ===");
}
