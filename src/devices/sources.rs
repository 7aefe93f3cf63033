//! Independent sources and the ammeter.

use crate::circuit::{BranchId, Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::{Device, DeviceClass, EvalParams, OutputParam};

mod v {
    pub const V: usize = 0;
    pub const I: usize = 1;
    pub const P: usize = 2;
    pub const LEN: usize = 3;
}

pub static VSOURCE: DeviceClass = DeviceClass {
    id: "V",
    num_terminals: 2,
    params: &[ParamSpec::required("V", "voltage", Unit::Volt, Range::Any)],
    state_len: v::LEN,
    ops: &[
        OutputParam { index: v::V, name: "V", unit: Unit::Volt },
        OutputParam { index: v::I, name: "I", unit: Unit::Ampere },
        OutputParam { index: v::P, name: "P", unit: Unit::Watt },
    ],
    linear: true,
};

/// Independent voltage source holding `V[p] - V[n] = V`.
///
/// The branch current is positive when it flows from `p` through the source
/// to `n`, so a source delivering power reports a negative current.
#[derive(Debug, Default)]
pub struct VoltageSource {
    np: NodeId,
    nn: NodeId,
    branch: BranchId,
}

impl Device for VoltageSource {
    fn class(&self) -> &'static DeviceClass {
        &VSOURCE
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.np = nodes[0];
        self.nn = nodes[1];
        self.branch = network.make_branch(self.np, self.nn);
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        state[v::V] = params.number("V");
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        stamper.stamp_voltage_source(self.np, self.nn, self.branch, state[v::V]);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        let i = network.current(self.branch);
        state[v::I] = i;
        state[v::P] = state[v::V] * i;
    }
}

mod i {
    pub const I: usize = 0;
    pub const V: usize = 1;
    pub const P: usize = 2;
    pub const LEN: usize = 3;
}

pub static ISOURCE: DeviceClass = DeviceClass {
    id: "I",
    num_terminals: 2,
    params: &[ParamSpec::required("I", "current", Unit::Ampere, Range::Any)],
    state_len: i::LEN,
    ops: &[
        OutputParam { index: i::I, name: "I", unit: Unit::Ampere },
        OutputParam { index: i::V, name: "V", unit: Unit::Volt },
        OutputParam { index: i::P, name: "P", unit: Unit::Watt },
    ],
    linear: true,
};

/// Independent current source. `I` flows from `p` through the source to `n`.
#[derive(Debug, Default)]
pub struct CurrentSource {
    np: NodeId,
    nn: NodeId,
}

impl Device for CurrentSource {
    fn class(&self) -> &'static DeviceClass {
        &ISOURCE
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.np = nodes[0];
        self.nn = nodes[1];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        state[i::I] = params.number("I");
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        stamper.stamp_current_source(self.np, self.nn, state[i::I]);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        let v = network.voltage(self.np) - network.voltage(self.nn);
        state[i::V] = v;
        state[i::P] = v * state[i::I];
    }
}

mod a {
    pub const I: usize = 0;
    pub const LEN: usize = 1;
}

pub static AMMETER: DeviceClass = DeviceClass {
    id: "A",
    num_terminals: 2,
    params: &[],
    state_len: a::LEN,
    ops: &[OutputParam { index: a::I, name: "I", unit: Unit::Ampere }],
    linear: true,
};

/// Ideal ammeter: a zero-volt source whose branch current is the reading.
#[derive(Debug, Default)]
pub struct Ammeter {
    np: NodeId,
    nn: NodeId,
    branch: BranchId,
}

impl Device for Ammeter {
    fn class(&self) -> &'static DeviceClass {
        &AMMETER
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.np = nodes[0];
        self.nn = nodes[1];
        self.branch = network.make_branch(self.np, self.nn);
    }

    fn stamp(&self, _state: &[f64], stamper: &mut Stamper<'_>) {
        stamper.stamp_voltage_source(self.np, self.nn, self.branch, 0.0);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        state[a::I] = network.current(self.branch);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::devices::num;
    use crate::{solve, Circuit, SolveOptions};

    #[test]
    fn test_current_source_into_resistor() {
        let mut circuit = Circuit::new();
        circuit.ground("NN").unwrap();
        circuit.add_device("I", "DUT", &["NP", "NN"], &[("I", num(1.0))]).unwrap();
        circuit.add_device("R", "R1", &["NP", "NN"], &[("R", num(10.0))]).unwrap();

        let iterations = solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_eq!(iterations, 1);
        assert_relative_eq!(circuit.node_voltage("NP").unwrap(), -10.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("DUT", "V").unwrap(), -10.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("DUT", "I").unwrap(), 1.0);
        assert_relative_eq!(circuit.op("DUT", "P").unwrap(), -10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_voltage_source_current_and_power() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["a", "0"], &[("V", num(10.0))]).unwrap();
        circuit.add_device("R", "R1", &["a", "0"], &[("R", num(5.0))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        // Delivering source: current flows out of the positive terminal
        assert_relative_eq!(circuit.op("V1", "I").unwrap(), -2.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("V1", "P").unwrap(), -20.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("V1", "V").unwrap(), 10.0);
    }

    #[test]
    fn test_ammeter_reads_series_current() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["a", "0"], &[("V", num(3.0))]).unwrap();
        circuit.add_device("A", "A1", &["a", "b"], &[]).unwrap();
        circuit.add_device("R", "R1", &["b", "0"], &[("R", num(1.5))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.op("A1", "I").unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.node_voltage("b").unwrap(), 3.0, epsilon = 1e-12);
    }
}
