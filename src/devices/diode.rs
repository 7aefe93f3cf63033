//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / (n * Vt)) - 1)
//!
//! For Newton-Raphson iteration, we linearize around the current operating point:
//!   I ≈ I0 + G_d * (V - V0)
//!
//! where G_d = dI/dV = Is/(n*Vt) * exp(V0/(n*Vt))

use crate::circuit::{Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::semi::{pn_conductance, pn_current, pn_temp, pn_voltage};
use super::{Device, DeviceClass, EvalParams, OutputParam};

const IS: usize = 0;
const VT: usize = 1;
const VCRIT: usize = 2;
const V: usize = 3;
const I: usize = 4;
const G: usize = 5;
const LEN: usize = 6;

pub static DIODE: DeviceClass = DeviceClass {
    id: "Diode",
    num_terminals: 2,
    params: &[
        ParamSpec::number("Is", "saturation current", Unit::Ampere, 1e-14, Range::Positive),
        ParamSpec::number("N", "emission coefficient", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::temp(),
    ],
    state_len: LEN,
    ops: &[
        OutputParam { index: V, name: "V", unit: Unit::Volt },
        OutputParam { index: I, name: "I", unit: Unit::Ampere },
        OutputParam { index: G, name: "G", unit: Unit::Siemens },
    ],
    linear: false,
};

/// A junction diode between anode and cathode.
#[derive(Debug, Default)]
pub struct Diode {
    /// Anode
    na: NodeId,
    /// Cathode
    nc: NodeId,
}

impl Diode {
    /// Linearize at the junction voltage, optionally limiting the step
    /// against the voltage used in the previous iteration. Returns whether
    /// the limit applied.
    fn linearize(&self, network: &Network, state: &mut [f64], gmin: f64, limit: bool) -> bool {
        let is = state[IS];
        let vt = state[VT];
        let vd = network.voltage(self.na) - network.voltage(self.nc);
        let v = if limit {
            pn_voltage(vd, state[V], vt, state[VCRIT])
        } else {
            vd
        };
        state[V] = v;
        state[I] = pn_current(v, is, vt);
        state[G] = pn_conductance(v, is, vt) + gmin;
        v != vd
    }
}

impl Device for Diode {
    fn class(&self) -> &'static DeviceClass {
        &DIODE
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.na = nodes[0];
        self.nc = nodes[1];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], eval: &EvalParams) {
        let is = params.number("Is");
        let temp = params.number_opt("temp").unwrap_or(eval.temp);
        let (vt, vcrit) = pn_temp(temp, is, params.number("N"));
        state[IS] = is;
        state[VT] = vt;
        state[VCRIT] = vcrit;
    }

    fn eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) -> bool {
        self.linearize(network, state, eval.gmin, true)
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let (v, i, g) = (state[V], state[I], state[G]);
        stamper.stamp_conductance(self.na, self.nc, g);
        stamper.stamp_current_source(self.na, self.nc, i - g * v);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) {
        self.linearize(network, state, eval.gmin, false);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::devices::num;
    use crate::devices::semi::thermal_voltage;
    use crate::{solve, Circuit, SolveOptions};

    fn forward_biased(v: f64, r: f64) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["in", "0"], &[("V", num(v))]).unwrap();
        circuit.add_device("R", "R1", &["in", "a"], &[("R", num(r))]).unwrap();
        circuit.add_device("Diode", "D1", &["a", "0"], &[]).unwrap();
        circuit
    }

    #[test]
    fn test_forward_bias_obeys_kcl() {
        let mut circuit = forward_biased(5.0, 1e3);
        let iterations = solve(&mut circuit, &SolveOptions::default()).unwrap();
        assert!(iterations > 1);

        let vd = circuit.node_voltage("a").unwrap();
        assert!(vd > 0.55 && vd < 0.75, "vd = {vd}");

        // Resistor and diode carry the same current
        let id = circuit.op("D1", "I").unwrap();
        assert_relative_eq!(id, (5.0 - vd) / 1e3, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("D1", "V").unwrap(), vd, epsilon = 1e-12);

        // And the diode current follows the Shockley equation
        let vt = thermal_voltage(crate::DEFAULT_TEMP);
        assert_relative_eq!(id, 1e-14 * ((vd / vt).exp() - 1.0), max_relative = 1e-9);
    }

    #[test]
    fn test_reverse_bias_blocks() {
        let mut circuit = forward_biased(-5.0, 1e3);
        solve(&mut circuit, &SolveOptions::default()).unwrap();
        let id = circuit.op("D1", "I").unwrap();
        assert!(id < 0.0 && id > -1e-11, "id = {id}");
        assert_relative_eq!(circuit.node_voltage("a").unwrap(), -5.0, max_relative = 1e-6);
    }

    #[test]
    fn test_emission_coefficient_raises_forward_drop() {
        let mut ideal = forward_biased(5.0, 1e3);
        solve(&mut ideal, &SolveOptions::default()).unwrap();

        let mut leaky = forward_biased(5.0, 1e3);
        leaky.set_param("D1", "N", num(2.0)).unwrap();
        solve(&mut leaky, &SolveOptions::default()).unwrap();

        assert!(leaky.node_voltage("a").unwrap() > ideal.node_voltage("a").unwrap());
    }

    #[test]
    fn test_temperature_override() {
        let mut cold = forward_biased(5.0, 1e3);
        cold.set_param("D1", "temp", num(-20.0)).unwrap();
        solve(&mut cold, &SolveOptions::default()).unwrap();

        let mut warm = forward_biased(5.0, 1e3);
        solve(&mut warm, &SolveOptions::default()).unwrap();

        // Fixed Is: higher thermal voltage means a larger forward drop
        assert!(cold.node_voltage("a").unwrap() < warm.node_voltage("a").unwrap());
    }

    #[test]
    fn test_cold_solve_directly_across_source() {
        let vt = thermal_voltage(crate::DEFAULT_TEMP);
        for v in [0.8, 1.0] {
            let mut circuit = Circuit::new();
            circuit.add_device("V", "V1", &["a", "0"], &[("V", num(v))]).unwrap();
            circuit.add_device("Diode", "D1", &["a", "0"], &[]).unwrap();

            // The source pins the junction, so every step until the limit
            // releases is a limited one
            let iterations = solve(&mut circuit, &SolveOptions::default()).unwrap();
            assert!(iterations > 5, "{v} V took {iterations} iterations");

            let id = circuit.op("D1", "I").unwrap();
            assert_relative_eq!(circuit.op("D1", "V").unwrap(), v, epsilon = 1e-12);
            assert_relative_eq!(id, 1e-14 * ((v / vt).exp() - 1.0), max_relative = 1e-9);
            assert_relative_eq!(circuit.op("V1", "I").unwrap(), -id, max_relative = 1e-9);
        }
    }
}
