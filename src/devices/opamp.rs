//! Operational Amplifier model.
//!
//! A finite-gain amplifier whose open-loop output saturates smoothly at the
//! supply limit:
//!   Vout = Vmax * (2/π) * atan((π/2) * gain * Vd / Vmax)
//!
//! The output is a Thevenin source of resistance `Rout` referenced to
//! ground; the inputs are joined by `Rin`. Like the junction models, the
//! input pair also gets `gmin` in the Jacobian, cancelled by an equivalent
//! current so it does not load the inputs at the operating point.

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2};

use crate::circuit::{Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::{Device, DeviceClass, EvalParams, OutputParam};

const GAIN: usize = 0;
const VMAX: usize = 1;
const GIN: usize = 2;
const GOUT: usize = 3;
const GMIN: usize = 4;
const VD: usize = 5;
const F: usize = 6;
const DF: usize = 7;
const OUT_VD: usize = 8;
const OUT_VOUT: usize = 9;
const OUT_IOUT: usize = 10;
const LEN: usize = 11;

pub static OPAMP: DeviceClass = DeviceClass {
    id: "OpAmp",
    num_terminals: 3,
    params: &[
        ParamSpec::number("gain", "open-loop gain", Unit::Unitless, 1e6, Range::Positive),
        ParamSpec::number("Vmax", "output saturation voltage", Unit::Volt, 15.0, Range::Positive),
        ParamSpec::number("Rin", "input resistance", Unit::Ohm, 1e12, Range::Positive),
        ParamSpec::number("Rout", "output resistance", Unit::Ohm, 1.0, Range::Positive),
    ],
    state_len: LEN,
    ops: &[
        OutputParam { index: OUT_VD, name: "Vd", unit: Unit::Volt },
        OutputParam { index: OUT_VOUT, name: "Vout", unit: Unit::Volt },
        OutputParam { index: OUT_IOUT, name: "Iout", unit: Unit::Ampere },
    ],
    linear: false,
};

/// Saturating transfer function and its slope.
fn transfer(vd: f64, gain: f64, vmax: f64) -> (f64, f64) {
    let u = FRAC_PI_2 * gain * vd / vmax;
    (vmax * FRAC_2_PI * u.atan(), gain / (1.0 + u * u))
}

/// Operational amplifier with terminals `[i+, i-, out]`.
#[derive(Debug, Default)]
pub struct OpAmp {
    inp: NodeId,
    inn: NodeId,
    out: NodeId,
}

impl Device for OpAmp {
    fn class(&self) -> &'static DeviceClass {
        &OPAMP
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.inp = nodes[0];
        self.inn = nodes[1];
        self.out = nodes[2];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        state[GAIN] = params.number("gain");
        state[VMAX] = params.number("Vmax");
        state[GIN] = 1.0 / params.number("Rin");
        state[GOUT] = 1.0 / params.number("Rout");
    }

    fn eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) -> bool {
        let vd = network.voltage(self.inp) - network.voltage(self.inn);
        let (f, df) = transfer(vd, state[GAIN], state[VMAX]);
        state[GMIN] = eval.gmin;
        state[VD] = vd;
        state[F] = f;
        state[DF] = df;
        false
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let gout = state[GOUT];
        let gmin = state[GMIN];
        let (vd, f, df) = (state[VD], state[F], state[DF]);
        stamper.stamp_conductance(self.inp, self.inn, state[GIN] + gmin);
        stamper.stamp_current_source(self.inp, self.inn, -gmin * vd);
        stamper.stamp_conductance(self.out, NodeId::GROUND, gout);
        stamper.stamp_vccs(self.out, NodeId::GROUND, self.inp, self.inn, -gout * df);
        stamper.stamp_current_source(self.out, NodeId::GROUND, -gout * (f - df * vd));
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) {
        self.eval(network, state, eval);
        let vout = network.voltage(self.out);
        state[OUT_VD] = state[VD];
        state[OUT_VOUT] = vout;
        state[OUT_IOUT] = (state[F] - vout) * state[GOUT];
    }
}
