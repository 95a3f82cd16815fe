//! Builder for concrete reactions
//!
//! Validation is deferred: builder methods record problems and `build`
//! reports the first one, so a definition reads top to bottom like the
//! equation it describes.

use std::sync::Arc;

use tracing::warn;

use crate::core_types::items::{ItemId, ItemMatcher, ItemRequirement};
use crate::core_types::reaction::{
    ItemProduct, RateOrder, Reaction, ReactionId, ReactionKey, Stoichiometry,
};
use crate::core_types::result::ReactionResult;
use crate::core_types::species::Species;
use crate::error::ChemistryError;

/// Activation energy used when none is authored (kJ/mol)
pub const DEFAULT_ACTIVATION_ENERGY: f64 = 2.5;

/// Pre-exponential factor used when none (or a non-positive one) is authored
pub const DEFAULT_PREEXPONENTIAL_FACTOR: f64 = 1e4;

/// Largest disagreement tolerated between supplied and Hess's-law values (kJ/mol)
const HESS_TOLERANCE: f64 = 1e-9;

/// Accumulates a reaction definition
#[derive(Debug, Clone)]
pub struct ReactionBuilder {
    namespace: String,
    id: Option<String>,
    generated: bool,
    reactants: Vec<Stoichiometry>,
    products: Vec<Stoichiometry>,
    orders: Vec<RateOrder>,
    item_requirements: Vec<ItemRequirement>,
    moles_per_item: Option<f64>,
    item_products: Vec<ItemProduct>,
    requires_uv: bool,
    requires_electrolysis: bool,
    preexponential_factor: Option<f64>,
    activation_energy: Option<f64>,
    enthalpy_change: Option<f64>,
    result: Option<Arc<dyn ReactionResult>>,
    reverse: Option<ReactionId>,
    display_as_reversible: bool,
    problems: Vec<String>,
}

impl ReactionBuilder {
    /// Builder for a catalog reaction
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            id: None,
            generated: false,
            reactants: Vec::new(),
            products: Vec::new(),
            orders: Vec::new(),
            item_requirements: Vec::new(),
            moles_per_item: None,
            item_products: Vec::new(),
            requires_uv: false,
            requires_electrolysis: false,
            preexponential_factor: None,
            activation_energy: None,
            enthalpy_change: None,
            result: None,
            reverse: None,
            display_as_reversible: false,
            problems: Vec::new(),
        }
    }

    /// Builder for a reaction produced by a generic template
    pub fn generated(namespace: &str) -> Self {
        let mut builder = Self::new(namespace);
        builder.generated = true;
        builder
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add a reactant whose order equals its ratio
    pub fn reactant(self, species: &Arc<Species>, ratio: u32) -> Self {
        let order = ratio as i32;
        self.reactant_with_order(species, ratio, order)
    }

    pub fn reactant_with_order(mut self, species: &Arc<Species>, ratio: u32, order: i32) -> Self {
        if ratio == 0 {
            self.problems
                .push(format!("reactant {} has a zero ratio", species.id()));
            return self;
        }
        upsert_ratio(&mut self.reactants, species, ratio);
        upsert_order(&mut self.orders, species, order);
        self
    }

    pub fn product(mut self, species: &Arc<Species>, ratio: u32) -> Self {
        if ratio == 0 {
            self.problems
                .push(format!("product {} has a zero ratio", species.id()));
            return self;
        }
        upsert_ratio(&mut self.products, species, ratio);
        self
    }

    /// A species that affects the rate without being consumed
    pub fn catalyst(mut self, species: &Arc<Species>, order: i32) -> Self {
        upsert_order(&mut self.orders, species, order);
        self
    }

    /// Override the order of an existing reactant or catalyst
    pub fn order(mut self, species: &Arc<Species>, order: i32) -> Self {
        let known = self.reactants.iter().any(|s| s.species.id() == species.id())
            || self.orders.iter().any(|o| o.species.id() == species.id());
        if known {
            upsert_order(&mut self.orders, species, order);
        } else {
            self.problems.push(format!(
                "cannot set the order of {}, which is neither a reactant nor a catalyst",
                species.id()
            ));
        }
        self
    }

    /// Consume items; each item consumed does `moles_per_item` moles of reaction
    pub fn item_reactant(mut self, matcher: ItemMatcher, moles_per_item: f64) -> Self {
        self.set_moles_per_item(moles_per_item);
        self.item_requirements.push(ItemRequirement::consumed(matcher));
        self
    }

    /// Require items to be present without consuming them
    pub fn item_catalyst(mut self, matcher: ItemMatcher) -> Self {
        self.item_requirements.push(ItemRequirement::catalyst(matcher));
        self
    }

    /// Deposit `per_mole` items into the mixture per mole of reaction
    pub fn item_product(mut self, item: &ItemId, tags: &[&str], per_mole: f64) -> Self {
        self.item_products.push(ItemProduct {
            item: item.clone(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            per_mole,
        });
        self
    }

    pub fn requires_uv(mut self) -> Self {
        self.requires_uv = true;
        self
    }

    pub fn requires_electrolysis(mut self) -> Self {
        self.requires_electrolysis = true;
        self
    }

    /// Pre-exponential factor A
    pub fn preexponential_factor(mut self, factor: f64) -> Self {
        self.preexponential_factor = Some(factor);
        self
    }

    /// Activation energy (kJ/mol)
    pub fn activation_energy(mut self, energy: f64) -> Self {
        self.activation_energy = Some(energy);
        self
    }

    /// Enthalpy change (kJ/mol); negative releases heat
    pub fn enthalpy_change(mut self, enthalpy: f64) -> Self {
        self.enthalpy_change = Some(enthalpy);
        self
    }

    pub fn with_result(mut self, result: Arc<dyn ReactionResult>) -> Self {
        if self.result.is_some() {
            self.problems
                .push("reactions can only have one result".to_string());
        } else {
            self.result = Some(result);
        }
        self
    }

    pub fn display_as_reversible(mut self) -> Self {
        self.display_as_reversible = true;
        self
    }

    fn set_moles_per_item(&mut self, moles_per_item: f64) {
        match self.moles_per_item {
            Some(existing) if existing != moles_per_item => self.problems.push(format!(
                "moles per item must be the same for every item reactant ({existing} vs {moles_per_item})"
            )),
            _ => self.moles_per_item = Some(moles_per_item),
        }
    }

    fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{}:{id}", self.namespace),
            None => equation(&self.reactants, &self.products),
        }
    }

    /// Validate and finalize
    pub fn build(self) -> Result<Reaction, ChemistryError> {
        let label = self.label();
        if let Some(problem) = self.problems.first() {
            return Err(ChemistryError::construction(label, problem.clone()));
        }

        let id = match (&self.id, self.generated) {
            (Some(id), _) => Some(ReactionId::new(&self.namespace, id)),
            (None, true) => None,
            (None, false) => {
                return Err(ChemistryError::construction(label, "reaction is missing an id"))
            }
        };

        let activation_energy = self
            .activation_energy
            .unwrap_or(DEFAULT_ACTIVATION_ENERGY);
        let preexponential_factor = self
            .preexponential_factor
            .filter(|a| *a > 0.0)
            .unwrap_or(DEFAULT_PREEXPONENTIAL_FACTOR);
        let enthalpy_change = self.enthalpy_change.unwrap_or(0.0);
        let moles_per_item = self.moles_per_item.unwrap_or(0.0);

        if self.item_requirements.iter().any(|r| r.consumed) && moles_per_item <= 0.0 {
            warn!(
                "Reaction '{}' does not do anything when its required items are consumed",
                label
            );
        }

        let key = match &id {
            Some(id) => ReactionKey::new(id.to_string()),
            None => ReactionKey::new(signature(
                &self,
                preexponential_factor,
                activation_energy,
                enthalpy_change,
            )),
        };

        Ok(Reaction {
            id,
            key,
            reactants: self.reactants,
            products: self.products,
            orders: self.orders,
            item_requirements: self.item_requirements,
            moles_per_item,
            item_products: self.item_products,
            requires_uv: self.requires_uv,
            requires_electrolysis: self.requires_electrolysis,
            preexponential_factor,
            activation_energy,
            enthalpy_change,
            result: self.result,
            reverse: self.reverse,
            display_as_reversible: self.display_as_reversible,
            generated: self.generated,
        })
    }

    /// Build this reaction together with its mirror image
    ///
    /// The reverse swaps reactants and products, keeps the catalysts and the
    /// UV requirement, and is named `<id>.reverse`. Its activation energy and
    /// enthalpy change follow Hess's law from the forward values; `modifier`
    /// may adjust the reverse builder (orders, results, rate factor), but
    /// thermodynamic overrides must still agree with Hess's law.
    pub fn build_reversible(
        mut self,
        modifier: impl FnOnce(ReactionBuilder) -> ReactionBuilder,
    ) -> Result<(Reaction, Reaction), ChemistryError> {
        let label = self.label();
        if self.generated {
            return Err(ChemistryError::construction(
                label,
                "generated reactions cannot be reversible; add another generic reaction instead",
            ));
        }
        let Some(forward_id) = self.id.clone() else {
            return Err(ChemistryError::construction(label, "reaction is missing an id"));
        };
        let reverse_path = format!("{forward_id}.reverse");

        let forward_ea = self
            .activation_energy
            .unwrap_or(DEFAULT_ACTIVATION_ENERGY);
        let forward_dh = self.enthalpy_change.unwrap_or(0.0);
        self.activation_energy = Some(forward_ea);
        self.enthalpy_change = Some(forward_dh);
        self.display_as_reversible = true;
        self.reverse = Some(ReactionId::new(&self.namespace, &reverse_path));

        let mut reverse = ReactionBuilder::new(&self.namespace).id(&reverse_path);
        for product in &self.products {
            reverse = reverse.reactant(&product.species, product.ratio);
        }
        for reactant in &self.reactants {
            reverse = reverse.product(&reactant.species, reactant.ratio);
        }
        for order in &self.orders {
            let is_reactant = self
                .reactants
                .iter()
                .any(|r| r.species.id() == order.species.id());
            if !is_reactant {
                reverse = reverse.catalyst(&order.species, order.order);
            }
        }
        if self.requires_uv {
            reverse = reverse.requires_uv();
        }
        reverse = reverse
            .activation_energy(forward_ea - forward_dh)
            .enthalpy_change(-forward_dh);
        reverse.display_as_reversible = true;
        reverse.reverse = Some(ReactionId::new(&self.namespace, &forward_id));

        let reverse = modifier(reverse);

        let reverse_ea = reverse.activation_energy.unwrap_or(DEFAULT_ACTIVATION_ENERGY);
        let reverse_dh = reverse.enthalpy_change.unwrap_or(0.0);
        let expected_ea = forward_ea - forward_dh;
        let expected_dh = -forward_dh;
        if (reverse_ea - expected_ea).abs() > HESS_TOLERANCE
            || (reverse_dh - expected_dh).abs() > HESS_TOLERANCE
        {
            return Err(ChemistryError::ThermodynamicInconsistency {
                reaction: label,
                reverse_activation_energy: reverse_ea,
                expected_activation_energy: expected_ea,
                reverse_enthalpy_change: reverse_dh,
                expected_enthalpy_change: expected_dh,
            });
        }

        Ok((self.build()?, reverse.build()?))
    }
}

fn upsert_ratio(list: &mut Vec<Stoichiometry>, species: &Arc<Species>, ratio: u32) {
    match list.iter_mut().find(|s| s.species.id() == species.id()) {
        Some(existing) => existing.ratio = ratio,
        None => list.push(Stoichiometry {
            species: Arc::clone(species),
            ratio,
        }),
    }
}

fn upsert_order(list: &mut Vec<RateOrder>, species: &Arc<Species>, order: i32) {
    match list.iter_mut().find(|o| o.species.id() == species.id()) {
        Some(existing) => existing.order = order,
        None => list.push(RateOrder {
            species: Arc::clone(species),
            order,
        }),
    }
}

fn equation(reactants: &[Stoichiometry], products: &[Stoichiometry]) -> String {
    let side = |list: &[Stoichiometry]| {
        list.iter()
            .map(|s| format!("{}{}", s.ratio, s.species.id()))
            .collect::<Vec<_>>()
            .join("+")
    };
    format!("{}=>{}", side(reactants), side(products))
}

/// Canonical identity of a generated reaction
fn signature(
    builder: &ReactionBuilder,
    preexponential_factor: f64,
    activation_energy: f64,
    enthalpy_change: f64,
) -> String {
    let mut reactants = builder.reactants.clone();
    let mut products = builder.products.clone();
    let mut orders = builder.orders.clone();
    reactants.sort_by(|a, b| a.species.id().cmp(b.species.id()));
    products.sort_by(|a, b| a.species.id().cmp(b.species.id()));
    orders.sort_by(|a, b| a.species.id().cmp(b.species.id()));

    let mut key = format!("{}:generated/{}", builder.namespace, equation(&reactants, &products));
    key.push('|');
    for order in &orders {
        key.push_str(&format!("{}^{};", order.species.id(), order.order));
    }
    let mut items: Vec<String> = builder
        .item_requirements
        .iter()
        .map(|r| format!("{}{}", if r.consumed { "-" } else { "~" }, r.matcher))
        .collect();
    items.sort();
    key.push_str(&format!(
        "|{}|A={preexponential_factor:e},Ea={activation_energy:e},dH={enthalpy_change:e}",
        items.join(",")
    ));
    if builder.requires_uv {
        key.push_str(",uv");
    }
    if builder.requires_electrolysis {
        key.push_str(",electrolysis");
    }
    key
}
