//! Arrhenius kinetics
//!
//! k = A·exp(−Ea/(R·T)), with Ea authored in kJ/mol. The per-tick rate of a
//! reaction is k scaled down to one tick and multiplied by every order-bearing
//! concentration raised to its order.
//!
//! # References
//! - Arrhenius, S. (1889). "Über die Reaktionsgeschwindigkeit bei der Inversion
//!   von Rohrzucker durch Säuren." Z. Phys. Chem. 4, 226-248.

/// Molar gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.3145;

/// Activation energy (kJ/mol) that makes exp(−Ea/(R·T)) equal 1/e at the
/// reference temperature of 298 K
pub const REFERENCE_ACTIVATION_ENERGY: f64 = GAS_CONSTANT * 0.298;

/// Rate constant
///
/// # Arguments
/// * `preexponential_factor` - A (units follow the rate law)
/// * `activation_energy` - Ea (kJ/mol)
/// * `temperature` - T (K)
///
/// # Returns
/// k, or 0 at non-positive temperature
pub(crate) fn rate_constant(preexponential_factor: f64, activation_energy: f64, temperature: f64) -> f64 {
    if temperature <= 0.0 {
        return 0.0;
    }
    preexponential_factor * (-(activation_energy * 1000.0) / (GAS_CONSTANT * temperature)).exp()
}

/// Moles of reaction per liter for one tick (or one sub-cycle)
///
/// # Arguments
/// * `rate_constant` - k at the mixture temperature
/// * `terms` - (concentration, order) for every order-bearing species
/// * `ticks_per_second` - simulation tick rate
/// * `cycles` - sub-cycles the tick is split into
///
/// # Returns
/// The rate, or 0 when the inputs would produce a non-finite value
pub(crate) fn rate_per_tick(
    rate_constant: f64,
    terms: impl IntoIterator<Item = (f64, i32)>,
    ticks_per_second: f64,
    cycles: u32,
) -> f64 {
    if ticks_per_second <= 0.0 || cycles == 0 {
        return 0.0;
    }
    let mut rate = rate_constant / ticks_per_second;
    for (concentration, order) in terms {
        rate *= concentration.powi(order);
    }
    rate /= f64::from(cycles);
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rate_constant_zero_activation_energy() {
        assert_relative_eq!(rate_constant(1e14, 0.0, 298.0), 1e14);
    }

    #[test]
    fn test_rate_constant_reference_activation_energy() {
        // exp(-298/T) at 298 K
        let k = rate_constant(1.0, REFERENCE_ACTIVATION_ENERGY, 298.0);
        assert_relative_eq!(k, (-1.0f64).exp(), max_relative = 1e-12);
    }

    #[test]
    fn test_rate_constant_rises_with_temperature() {
        let cold = rate_constant(1e4, 50.0, 280.0);
        let hot = rate_constant(1e4, 50.0, 350.0);
        assert!(hot > cold * 10.0, "hot {} cold {}", hot, cold);
        assert_eq!(rate_constant(1e4, 50.0, 0.0), 0.0);
    }

    #[test]
    fn test_rate_per_tick_orders() {
        // k = 20, two reactants at 0.5 M first order each: 20/20 * 0.25
        let rate = rate_per_tick(20.0, [(0.5, 1), (0.5, 1)], 20.0, 1);
        assert_relative_eq!(rate, 0.25);

        // zeroth-order catalyst contributes nothing, cycles divide
        let split = rate_per_tick(20.0, [(0.5, 1), (3.0, 0)], 20.0, 4);
        assert_relative_eq!(split, 0.125);
    }

    #[test]
    fn test_rate_per_tick_guards_non_finite() {
        assert_eq!(rate_per_tick(f64::INFINITY, [(1.0, 1)], 20.0, 1), 0.0);
        assert_eq!(rate_per_tick(1.0, [(0.0, -1)], 20.0, 1), 0.0);
    }
}
