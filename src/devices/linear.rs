//! Linear passive devices: Resistor, Capacitor, Inductor.
//!
//! At DC a capacitor is an open circuit and an inductor is a short. The
//! inductor still gets its own branch so its current can be read back.

use crate::circuit::{BranchId, Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::{Device, DeviceClass, EvalParams, OutputParam};

mod r {
    pub const G: usize = 0;
    pub const V: usize = 1;
    pub const I: usize = 2;
    pub const P: usize = 3;
    pub const LEN: usize = 4;
}

pub static RESISTOR: DeviceClass = DeviceClass {
    id: "R",
    num_terminals: 2,
    params: &[ParamSpec::required("R", "resistance", Unit::Ohm, Range::Positive)],
    state_len: r::LEN,
    ops: &[
        OutputParam { index: r::V, name: "V", unit: Unit::Volt },
        OutputParam { index: r::I, name: "I", unit: Unit::Ampere },
        OutputParam { index: r::P, name: "P", unit: Unit::Watt },
    ],
    linear: true,
};

/// A resistor.
#[derive(Debug, Default)]
pub struct Resistor {
    /// First terminal
    na: NodeId,
    /// Second terminal
    nb: NodeId,
}

impl Device for Resistor {
    fn class(&self) -> &'static DeviceClass {
        &RESISTOR
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.na = nodes[0];
        self.nb = nodes[1];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        state[r::G] = 1.0 / params.number("R");
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        stamper.stamp_conductance(self.na, self.nb, state[r::G]);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        let v = network.voltage(self.na) - network.voltage(self.nb);
        let i = v * state[r::G];
        state[r::V] = v;
        state[r::I] = i;
        state[r::P] = v * i;
    }
}

mod c {
    pub const V: usize = 0;
    pub const LEN: usize = 1;
}

pub static CAPACITOR: DeviceClass = DeviceClass {
    id: "C",
    num_terminals: 2,
    params: &[ParamSpec::required("C", "capacitance", Unit::Farad, Range::NonNegative)],
    state_len: c::LEN,
    ops: &[OutputParam { index: c::V, name: "V", unit: Unit::Volt }],
    linear: true,
};

/// A capacitor. Open at DC, so it contributes nothing to the system.
#[derive(Debug, Default)]
pub struct Capacitor {
    na: NodeId,
    nb: NodeId,
}

impl Device for Capacitor {
    fn class(&self) -> &'static DeviceClass {
        &CAPACITOR
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.na = nodes[0];
        self.nb = nodes[1];
    }

    fn stamp(&self, _state: &[f64], _stamper: &mut Stamper<'_>) {}

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        state[c::V] = network.voltage(self.na) - network.voltage(self.nb);
    }
}

mod l {
    pub const I: usize = 0;
    pub const V: usize = 1;
    pub const LEN: usize = 2;
}

pub static INDUCTOR: DeviceClass = DeviceClass {
    id: "L",
    num_terminals: 2,
    params: &[ParamSpec::required("L", "inductance", Unit::Henry, Range::NonNegative)],
    state_len: l::LEN,
    ops: &[
        OutputParam { index: l::I, name: "I", unit: Unit::Ampere },
        OutputParam { index: l::V, name: "V", unit: Unit::Volt },
    ],
    linear: true,
};

/// An inductor. Shorted at DC through a zero-volt branch.
#[derive(Debug, Default)]
pub struct Inductor {
    na: NodeId,
    nb: NodeId,
    branch: BranchId,
}

impl Device for Inductor {
    fn class(&self) -> &'static DeviceClass {
        &INDUCTOR
    }

    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]) {
        self.na = nodes[0];
        self.nb = nodes[1];
        self.branch = network.make_branch(self.na, self.nb);
    }

    fn stamp(&self, _state: &[f64], stamper: &mut Stamper<'_>) {
        stamper.stamp_voltage_source(self.na, self.nb, self.branch, 0.0);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], _eval: &EvalParams) {
        state[l::I] = network.current(self.branch);
        state[l::V] = network.voltage(self.na) - network.voltage(self.nb);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::devices::num;
    use crate::{solve, Circuit, NodalError, SolveOptions};

    #[test]
    fn test_voltage_divider_probes() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["in", "0"], &[("V", num(12.0))]).unwrap();
        circuit.add_device("R", "R1", &["in", "out"], &[("R", num(2e3))]).unwrap();
        circuit.add_device("R", "R2", &["out", "0"], &[("R", num(1e3))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("out").unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.op("R1", "V").unwrap(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.op("R1", "I").unwrap(), 4e-3, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("R2", "P").unwrap(), 16e-3, epsilon = 1e-12);
    }

    #[test]
    fn test_inductor_shorts_and_capacitor_opens() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "V1", &["in", "0"], &[("V", num(5.0))]).unwrap();
        circuit.add_device("L", "L1", &["in", "mid"], &[("L", num(1e-3))]).unwrap();
        circuit.add_device("R", "R1", &["mid", "0"], &[("R", num(100.0))]).unwrap();
        circuit.add_device("C", "C1", &["mid", "0"], &[("C", num(1e-6))]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("mid").unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.op("L1", "I").unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("L1", "V").unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(circuit.op("C1", "V").unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resistance_must_be_positive() {
        let mut circuit = Circuit::new();
        let err = circuit
            .add_device("R", "R1", &["a", "0"], &[("R", num(0.0))])
            .unwrap_err();
        assert!(matches!(err, NodalError::ParameterRange { .. }));
    }

    #[test]
    fn test_unknown_probe() {
        let mut circuit = Circuit::new();
        circuit.add_device("R", "R1", &["a", "0"], &[("R", num(1.0))]).unwrap();
        assert!(matches!(
            circuit.op("R1", "Q"),
            Err(NodalError::UnknownProbe { .. })
        ));
    }
}
