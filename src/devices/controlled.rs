//! Linear dependent sources.
//!
//! All four share the terminal order `[p, n, cp, cn]`: output pair first,
//! control pair second. Current-controlled sources sense the current flowing
//! from `cp` to `cn` through an internal zero-volt branch.

use crate::circuit::{BranchId, Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::{Device, DeviceClass, EvalParams, OutputParam};

// Every dependent source uses the same state layout.
const GAIN: usize = 0;
const V: usize = 1;
const I: usize = 2;
const P: usize = 3;
const LEN: usize = 4;

const OPS: &[OutputParam] = &[
    OutputParam { index: V, name: "V", unit: Unit::Volt },
    OutputParam { index: I, name: "I", unit: Unit::Ampere },
    OutputParam { index: P, name: "P", unit: Unit::Watt },
];

pub static VCVS: DeviceClass = DeviceClass {
    id: "VCVS",
    num_terminals: 4,
    params: &[ParamSpec::required("gain", "voltage gain", Unit::Unitless, Range::Any)],
    state_len: LEN,
    ops: OPS,
    linear: true,
};

pub static VCCS: DeviceClass = DeviceClass {
    id: "VCCS",
    num_terminals: 4,
    params: &[ParamSpec::required("gain", "transconductance", Unit::Siemens, Range::Any)],
    state_len: LEN,
    ops: OPS,
    linear: true,
};

pub static CCVS: DeviceClass = DeviceClass {
    id: "CCVS",
    num_terminals: 4,
    params: &[ParamSpec::required("gain", "transresistance", Unit::Ohm, Range::Any)],
    state_len: LEN,
    ops: OPS,
    linear: true,
};

pub static CCCS: DeviceClass = DeviceClass {
    id: "CCCS",
    num_terminals: 4,
    params: &[ParamSpec::required("gain", "current gain", Unit::Unitless, Range::Any)],
    state_len: LEN,
    ops: OPS,
    linear: true,
};

fn derive_gain(params: &Params, state: &mut [f64]) {
    state[GAIN] = params.number("gain");
}

/// Output voltage, output current and their product.
fn finish(state: &mut [f64], v: f64, i: f64) {
    state[V] = v;
    state[I] = i;
    state[P] = v * i;
}

/// Terminals shared by all dependent sources.
#[derive(Debug, Default, Clone, Copy)]
struct Ports {
    np: NodeId,
    nn: NodeId,
    ncp: NodeId,
    ncn: NodeId,
}

impl Ports {
    fn new(nodes: &[NodeId]) -> Self {
        Self {
            np: nodes[0],
            nn: nodes[1],
            ncp: nodes[2],
            ncn: nodes[3],
        }
    }

    fn output_voltage(&self, network: &Network) -> f64 {
        network.voltage(self.np) - network.voltage(self.nn)
    }
}

/// Voltage-controlled voltage source: `V[p] - V[n] = gain * (V[cp] - V[cn])`.
#[derive(Debug, Default)]
pub struct Vcvs {
    ports: Ports,
    branch: BranchId,
}

impl Device for Vcvs {
    fn class(&self) -> &'static DeviceClass {
        &VCVS
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.ports = Ports::new(nodes);
        self.branch = network.make_branch(self.ports.np, self.ports.nn);
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        derive_gain(params, state);
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Ports { np, nn, ncp, ncn } = self.ports;
        let gain = state[GAIN];
        stamper.stamp_voltage_source(np, nn, self.branch, 0.0);
        stamper.stamp_matrix(self.branch, ncp, -gain);
        stamper.stamp_matrix(self.branch, ncn, gain);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        finish(state, self.ports.output_voltage(network), network.current(self.branch));
    }
}

/// Voltage-controlled current source: `gain * (V[cp] - V[cn])` flows from
/// `p` through the source to `n`.
#[derive(Debug, Default)]
pub struct Vccs {
    ports: Ports,
}

impl Device for Vccs {
    fn class(&self) -> &'static DeviceClass {
        &VCCS
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.ports = Ports::new(nodes);
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        derive_gain(params, state);
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Ports { np, nn, ncp, ncn } = self.ports;
        stamper.stamp_vccs(np, nn, ncp, ncn, state[GAIN]);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        let vc = network.voltage(self.ports.ncp) - network.voltage(self.ports.ncn);
        let i = state[GAIN] * vc;
        finish(state, self.ports.output_voltage(network), i);
    }
}

/// Current-controlled voltage source: `V[p] - V[n] = gain * I(cp -> cn)`.
#[derive(Debug, Default)]
pub struct Ccvs {
    ports: Ports,
    /// Zero-volt sense branch between the control terminals
    control: BranchId,
    output: BranchId,
}

impl Device for Ccvs {
    fn class(&self) -> &'static DeviceClass {
        &CCVS
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.ports = Ports::new(nodes);
        self.control = network.make_branch(self.ports.ncp, self.ports.ncn);
        self.output = network.make_branch(self.ports.np, self.ports.nn);
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        derive_gain(params, state);
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Ports { np, nn, ncp, ncn } = self.ports;
        stamper.stamp_voltage_source(ncp, ncn, self.control, 0.0);
        stamper.stamp_voltage_source(np, nn, self.output, 0.0);
        stamper.stamp_matrix(self.output, self.control, -state[GAIN]);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        finish(state, self.ports.output_voltage(network), network.current(self.output));
    }
}

/// Current-controlled current source: `gain * I(cp -> cn)` flows from `p`
/// through the source to `n`.
#[derive(Debug, Default)]
pub struct Cccs {
    ports: Ports,
    control: BranchId,
}

impl Device for Cccs {
    fn class(&self) -> &'static DeviceClass {
        &CCCS
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.ports = Ports::new(nodes);
        self.control = network.make_branch(self.ports.ncp, self.ports.ncn);
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        derive_gain(params, state);
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Ports { np, nn, ncp, ncn } = self.ports;
        let gain = state[GAIN];
        stamper.stamp_voltage_source(ncp, ncn, self.control, 0.0);
        stamper.stamp_a(np, self.control, gain);
        stamper.stamp_a(nn, self.control, -gain);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        let i = state[GAIN] * network.current(self.control);
        finish(state, self.ports.output_voltage(network), i);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::devices::num;
    use crate::{solve, Circuit, SolveOptions};

    fn assert_op(circuit: &Circuit, device: &str, name: &str, expected: f64) {
        assert_relative_eq!(circuit.op(device, name).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_ccvs() {
        let mut circuit = Circuit::new();
        circuit.ground("NCN").unwrap();
        circuit.ground("NON").unwrap();
        circuit.add_device("I", "I1", &["NCP", "NCN"], &[("I", num(-1.0))]).unwrap();
        circuit
            .add_device("CCVS", "DUT", &["NOP", "NON", "NCP", "NCN"], &[("gain", num(2.0))])
            .unwrap();
        circuit.add_device("R", "R1", &["NOP", "NON"], &[("R", num(10.0))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        let op: Vec<(String, f64)> = circuit.operating_point();
        let labels: Vec<&str> = op.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["V[NCP]", "V[NOP]", "I[NCP->0]", "I[NOP->0]"]);
        assert_relative_eq!(op[0].1, 0.0, epsilon = 1e-12);
        assert_relative_eq!(op[1].1, 2.0, epsilon = 1e-12);
        assert_relative_eq!(op[2].1, 1.0, epsilon = 1e-12);
        assert_relative_eq!(op[3].1, -0.2, epsilon = 1e-12);

        assert_op(&circuit, "DUT", "V", 2.0);
        assert_op(&circuit, "DUT", "I", -0.2);
        assert_op(&circuit, "DUT", "P", -0.4);
    }

    #[test]
    fn test_vcvs() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["in", "0"], &[("V", num(2.0))]).unwrap();
        circuit
            .add_device("VCVS", "E1", &["out", "0", "in", "0"], &[("gain", num(5.0))])
            .unwrap();
        circuit.add_device("R", "R1", &["out", "0"], &[("R", num(100.0))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("out").unwrap(), 10.0, epsilon = 1e-9);
        assert_op(&circuit, "E1", "V", 10.0);
        assert_op(&circuit, "E1", "I", -0.1);
        assert_op(&circuit, "E1", "P", -1.0);
    }

    #[test]
    fn test_vccs() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["in", "0"], &[("V", num(3.0))]).unwrap();
        // Current flows from ground through the source into `out`
        circuit
            .add_device("VCCS", "G1", &["0", "out", "in", "0"], &[("gain", num(0.5))])
            .unwrap();
        circuit.add_device("R", "R1", &["out", "0"], &[("R", num(100.0))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("out").unwrap(), 150.0, epsilon = 1e-9);
        assert_op(&circuit, "G1", "I", 1.5);
        assert_op(&circuit, "G1", "V", -150.0);
    }

    #[test]
    fn test_cccs() {
        let mut circuit = Circuit::new();
        circuit.add_device("I", "I1", &["0", "ctl"], &[("I", num(1.0))]).unwrap();
        circuit
            .add_device("CCCS", "F1", &["0", "out", "ctl", "0"], &[("gain", num(3.0))])
            .unwrap();
        circuit.add_device("R", "R1", &["out", "0"], &[("R", num(10.0))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("ctl").unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.node_voltage("out").unwrap(), 30.0, epsilon = 1e-9);
        assert_op(&circuit, "F1", "I", 3.0);
    }
}
