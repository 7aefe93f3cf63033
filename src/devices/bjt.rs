//! BJT (Bipolar Junction Transistor) model.
//!
//! Ebers-Moll transport model for NPN and PNP transistors. With forward and
//! reverse junction currents `If = Is*(exp(Vbe/(Nf*Vt)) - 1)` and
//! `Ir = Is*(exp(Vbc/(Nr*Vt)) - 1)`:
//!   Ic = If - Ir * (1 + 1/Br)
//!   Ib = If/Bf + Ir/Br
//!
//! PNP devices are evaluated as NPN in a mirrored frame where every junction
//! voltage and terminal current changes sign.

use crate::circuit::{Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::semi::{polarity, pn_conductance, pn_current, pn_temp, pn_voltage};
use super::{Device, DeviceClass, EvalParams, OutputParam};

const POL: usize = 0;
const IS: usize = 1;
const BF: usize = 2;
const BR: usize = 3;
const VTF: usize = 4;
const VTR: usize = 5;
const VCRITF: usize = 6;
const VCRITR: usize = 7;
// Linearization in the device frame
const VBE: usize = 8;
const VBC: usize = 9;
const ICI: usize = 10;
const IBI: usize = 11;
const GCBE: usize = 12;
const GCBC: usize = 13;
const GBBE: usize = 14;
const GBBC: usize = 15;
// Output probes in the terminal frame
const OUT_VBE: usize = 16;
const OUT_VBC: usize = 17;
const OUT_VCE: usize = 18;
const OUT_IE: usize = 19;
const OUT_IC: usize = 20;
const OUT_IB: usize = 21;
const LEN: usize = 22;

pub static BJT: DeviceClass = DeviceClass {
    id: "BJT",
    num_terminals: 3,
    params: &[
        ParamSpec::text("polarity", "transistor polarity", "npn", &["npn", "pnp"]),
        ParamSpec::number("Is", "transport saturation current", Unit::Ampere, 1e-14, Range::Positive),
        ParamSpec::number("Nf", "forward emission coefficient", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::number("Nr", "reverse emission coefficient", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::number("Bf", "forward beta", Unit::Unitless, 100.0, Range::Positive),
        ParamSpec::number("Br", "reverse beta", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::temp(),
    ],
    state_len: LEN,
    ops: &[
        OutputParam { index: OUT_VBE, name: "Vbe", unit: Unit::Volt },
        OutputParam { index: OUT_VBC, name: "Vbc", unit: Unit::Volt },
        OutputParam { index: OUT_VCE, name: "Vce", unit: Unit::Volt },
        OutputParam { index: OUT_IE, name: "Ie", unit: Unit::Ampere },
        OutputParam { index: OUT_IC, name: "Ic", unit: Unit::Ampere },
        OutputParam { index: OUT_IB, name: "Ib", unit: Unit::Ampere },
    ],
    linear: false,
};

/// Bipolar junction transistor with terminals `[e, b, c]`.
///
/// `Ic` and `Ib` are reported flowing into their terminals, `Ie` flowing out
/// of the emitter.
#[derive(Debug, Default)]
pub struct Bjt {
    ne: NodeId,
    nb: NodeId,
    nc: NodeId,
}

impl Bjt {
    fn linearize(&self, network: &Network, state: &mut [f64], gmin: f64, limit: bool) -> bool {
        let pol = state[POL];
        let is = state[IS];
        let bf = state[BF];
        let br = state[BR];
        let vtf = state[VTF];
        let vtr = state[VTR];

        let vb = network.voltage(self.nb);
        let vbe_raw = pol * (vb - network.voltage(self.ne));
        let vbc_raw = pol * (vb - network.voltage(self.nc));
        let (vbe, vbc) = if limit {
            (
                pn_voltage(vbe_raw, state[VBE], vtf, state[VCRITF]),
                pn_voltage(vbc_raw, state[VBC], vtr, state[VCRITR]),
            )
        } else {
            (vbe_raw, vbc_raw)
        };

        let i_f = pn_current(vbe, is, vtf);
        let gf = pn_conductance(vbe, is, vtf) + gmin;
        let i_r = pn_current(vbc, is, vtr);
        let gr = pn_conductance(vbc, is, vtr) + gmin;

        state[VBE] = vbe;
        state[VBC] = vbc;
        state[ICI] = i_f - i_r * (1.0 + 1.0 / br);
        state[IBI] = i_f / bf + i_r / br;
        state[GCBE] = gf;
        state[GCBC] = -gr * (1.0 + 1.0 / br);
        state[GBBE] = gf / bf;
        state[GBBC] = gr / br;
        vbe != vbe_raw || vbc != vbc_raw
    }
}

impl Device for Bjt {
    fn class(&self) -> &'static DeviceClass {
        &BJT
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.ne = nodes[0];
        self.nb = nodes[1];
        self.nc = nodes[2];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], eval: &EvalParams) {
        let is = params.number("Is");
        let temp = params.number_opt("temp").unwrap_or(eval.temp);
        let (vtf, vcritf) = pn_temp(temp, is, params.number("Nf"));
        let (vtr, vcritr) = pn_temp(temp, is, params.number("Nr"));
        state[POL] = polarity(params.text("polarity"), "pnp");
        state[IS] = is;
        state[BF] = params.number("Bf");
        state[BR] = params.number("Br");
        state[VTF] = vtf;
        state[VTR] = vtr;
        state[VCRITF] = vcritf;
        state[VCRITR] = vcritr;
    }

    fn eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) -> bool {
        self.linearize(network, state, eval.gmin, true)
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Self { ne, nb, nc } = *self;
        let pol = state[POL];
        let (vbe, vbc) = (state[VBE], state[VBC]);
        let (gcbe, gcbc) = (state[GCBE], state[GCBC]);
        let (gbbe, gbbc) = (state[GBBE], state[GBBC]);

        // Collector current, flowing from c through the device to e
        stamper.stamp_vccs(nc, ne, nb, ne, gcbe);
        stamper.stamp_vccs(nc, ne, nb, nc, gcbc);
        stamper.stamp_current_source(nc, ne, pol * (state[ICI] - gcbe * vbe - gcbc * vbc));

        // Base current, flowing from b through the device to e
        stamper.stamp_vccs(nb, ne, nb, ne, gbbe);
        stamper.stamp_vccs(nb, ne, nb, nc, gbbc);
        stamper.stamp_current_source(nb, ne, pol * (state[IBI] - gbbe * vbe - gbbc * vbc));
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) {
        self.linearize(network, state, eval.gmin, false);
        let pol = state[POL];
        let ve = network.voltage(self.ne);
        let vb = network.voltage(self.nb);
        let vc = network.voltage(self.nc);
        let ic = pol * state[ICI];
        let ib = pol * state[IBI];
        state[OUT_VBE] = vb - ve;
        state[OUT_VBC] = vb - vc;
        state[OUT_VCE] = vc - ve;
        state[OUT_IC] = ic;
        state[OUT_IB] = ib;
        state[OUT_IE] = ic + ib;
    }
}
