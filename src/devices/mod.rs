//! Device models for circuit simulation.
//!
//! This module provides the [`Device`] contract and models for all supported
//! devices:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source, Current Source, Ammeter
//! - Controlled sources: VCVS, VCCS, CCVS, CCCS
//! - Nonlinear: Diode, BJT, MOSFET, JFET, Op-Amp
//!
//! ## Lifecycle
//!
//! The solver drives every device through a fixed sequence per solve:
//!
//! 1. [`Device::connect`] - once, when the device is added to a circuit
//! 2. [`Device::derive_state`] - once per solve, parameters to state constants
//! 3. [`Device::begin_eval`] - once per solve
//! 4. [`Device::eval`] then [`Device::stamp`] - every Newton iteration;
//!    `eval` reports whether it limited the step, which holds off convergence
//! 5. [`Device::end_eval`] - once after convergence, fills output probes
//!
//! Each instance keeps a fixed-length `f64` state vector addressed by small
//! per-class slot constants. Only the device's own hooks write to it.

mod bjt;
mod controlled;
mod diode;
mod jfet;
mod linear;
mod mosfet;
mod opamp;
pub mod params;
pub mod semi;
mod sources;

pub use bjt::Bjt;
pub use controlled::{Cccs, Ccvs, Vccs, Vcvs};
pub use diode::Diode;
pub use jfet::Jfet;
pub use linear::{Capacitor, Inductor, Resistor};
pub use mosfet::Mosfet;
pub use opamp::OpAmp;
pub use params::{num, text, ParamKind, ParamSpec, ParamValue, Params, Range, Unit};
pub use sources::{Ammeter, CurrentSource, VoltageSource};

use std::fmt;

use crate::circuit::{Network, NodeId};
use crate::error::{NodalError, Result};
use crate::solver::Stamper;

/// Output parameter stored in a device state vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputParam {
    /// Element index.
    pub index: usize,
    /// Output parameter name.
    pub name: &'static str,
    /// Output parameter unit.
    pub unit: Unit,
}

/// Static description of a device class.
#[derive(Debug)]
pub struct DeviceClass {
    /// Unique device class identifier.
    pub id: &'static str,
    /// The number of terminals in the device.
    pub num_terminals: usize,
    /// Schema of the device parameters.
    pub params: &'static [ParamSpec],
    /// Length of the state vector.
    pub state_len: usize,
    /// Output parameters from the state vector.
    pub ops: &'static [OutputParam],
    /// Linear devices need no Newton iteration.
    pub linear: bool,
}

/// Solve-wide values handed to every lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalParams {
    /// Circuit temperature in degrees Celsius.
    pub temp: f64,
    /// Conductance added across nonlinear junctions.
    pub gmin: f64,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            temp: crate::DEFAULT_TEMP,
            gmin: crate::GMIN,
        }
    }
}

/// The contract every device model implements.
///
/// Devices hold only their terminal and branch handles; parameters and
/// per-instance state are owned by the surrounding [`DeviceInstance`] and
/// passed in. `stamp` must only use values that `eval` left in the state.
pub trait Device: fmt::Debug {
    /// Class metadata (terminals, parameters, probes).
    fn class(&self) -> &'static DeviceClass;

    /// Record terminals and allocate any extra branches.
    fn connect(&mut self, network: &mut Network, nodes: &[NodeId]);

    /// Compute parameter- and temperature-derived constants.
    fn derive_state(&self, _params: &Params, _state: &mut [f64], _eval: &EvalParams) {}

    /// Reset per-solve accumulators.
    fn begin_eval(&self, _state: &mut [f64], _eval: &EvalParams) {}

    /// Linearize around the current node voltages.
    ///
    /// Returns `true` when step limiting moved the linearization point away
    /// from the terminal voltages. The solver does not accept an iterate
    /// while any device reports a limited step.
    fn eval(&self, _network: &Network, _state: &mut [f64], _eval: &EvalParams) -> bool {
        false
    }

    /// Add the linearization to the system.
    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>);

    /// Finalize output probes from the converged solution.
    fn end_eval(&self, _network: &Network, _state: &mut [f64], _eval: &EvalParams) {}
}

/// A single `{name, unit, value}` probe reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeValue {
    pub name: &'static str,
    pub unit: Unit,
    pub value: f64,
}

impl fmt::Display for ProbeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.6e}{}", self.name, self.value, self.unit)
    }
}

/// A device placed in a circuit: model, validated parameters and state.
#[derive(Debug)]
pub struct DeviceInstance {
    name: String,
    nodes: Vec<NodeId>,
    device: Box<dyn Device>,
    params: Params,
    state: Vec<f64>,
}

impl DeviceInstance {
    /// Wrap a connected device with its parameters and a zeroed state vector.
    pub(crate) fn new(name: String, nodes: Vec<NodeId>, device: Box<dyn Device>, params: Params) -> Self {
        let state = vec![0.0; device.class().state_len];
        Self {
            name,
            nodes,
            device,
            params,
            state,
        }
    }

    /// Unique instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class metadata.
    pub fn class(&self) -> &'static DeviceClass {
        self.device.class()
    }

    /// Terminal nodes in class order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Validated parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Raw state vector.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Returns value of an output parameter with the given name.
    pub fn op(&self, name: &str) -> Result<f64> {
        self.class()
            .ops
            .iter()
            .find(|op| op.name == name)
            .map(|op| self.state[op.index])
            .ok_or_else(|| NodalError::unknown_probe(&self.name, name))
    }

    /// All output parameters in declaration order.
    pub fn probes(&self) -> Vec<ProbeValue> {
        self.class()
            .ops
            .iter()
            .map(|op| ProbeValue {
                name: op.name,
                unit: op.unit,
                value: self.state[op.index],
            })
            .collect()
    }

    pub(crate) fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        self.params.set(&self.name, name, value)
    }

    pub(crate) fn reset_state(&mut self) {
        self.state.fill(0.0);
    }

    pub(crate) fn derive_state(&mut self, eval: &EvalParams) {
        self.device.derive_state(&self.params, &mut self.state, eval);
    }

    pub(crate) fn begin_eval(&mut self, eval: &EvalParams) {
        self.device.begin_eval(&mut self.state, eval);
    }

    pub(crate) fn eval(&mut self, network: &Network, eval: &EvalParams) -> bool {
        self.device.eval(network, &mut self.state, eval)
    }

    pub(crate) fn stamp(&self, stamper: &mut Stamper<'_>) {
        self.device.stamp(&self.state, stamper);
    }

    pub(crate) fn end_eval(&mut self, network: &Network, eval: &EvalParams) {
        self.device.end_eval(network, &mut self.state, eval);
    }
}

/// Registry entry: class metadata plus an unconnected constructor.
pub struct DeviceEntry {
    pub class: &'static DeviceClass,
    pub make: fn() -> Box<dyn Device>,
}

/// All built-in device classes.
pub static DEVICE_CLASSES: &[DeviceEntry] = &[
    DeviceEntry { class: &linear::RESISTOR, make: || Box::new(Resistor::default()) },
    DeviceEntry { class: &linear::CAPACITOR, make: || Box::new(Capacitor::default()) },
    DeviceEntry { class: &linear::INDUCTOR, make: || Box::new(Inductor::default()) },
    DeviceEntry { class: &sources::VSOURCE, make: || Box::new(VoltageSource::default()) },
    DeviceEntry { class: &sources::ISOURCE, make: || Box::new(CurrentSource::default()) },
    DeviceEntry { class: &sources::AMMETER, make: || Box::new(Ammeter::default()) },
    DeviceEntry { class: &controlled::VCVS, make: || Box::new(Vcvs::default()) },
    DeviceEntry { class: &controlled::VCCS, make: || Box::new(Vccs::default()) },
    DeviceEntry { class: &controlled::CCVS, make: || Box::new(Ccvs::default()) },
    DeviceEntry { class: &controlled::CCCS, make: || Box::new(Cccs::default()) },
    DeviceEntry { class: &diode::DIODE, make: || Box::new(Diode::default()) },
    DeviceEntry { class: &bjt::BJT, make: || Box::new(Bjt::default()) },
    DeviceEntry { class: &mosfet::MOSFET, make: || Box::new(Mosfet::default()) },
    DeviceEntry { class: &jfet::JFET, make: || Box::new(Jfet::default()) },
    DeviceEntry { class: &opamp::OPAMP, make: || Box::new(OpAmp::default()) },
];

/// Look up a built-in class by identifier (case-insensitive).
pub fn find_class(id: &str) -> Option<&'static DeviceEntry> {
    DEVICE_CLASSES
        .iter()
        .find(|entry| entry.class.id.eq_ignore_ascii_case(id))
}

/// Create an unconnected device of a built-in class.
pub fn create_device(id: &str) -> Result<Box<dyn Device>> {
    find_class(id)
        .map(|entry| (entry.make)())
        .ok_or_else(|| NodalError::UnknownDeviceClass {
            class: id.to_string(),
        })
}
