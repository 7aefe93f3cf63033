//! JFET model.
//!
//! Shichman-Hodges channel with overdrive `Vov = Vgs - Vt0` (Vt0 is the
//! negative pinch-off voltage for an n-channel device):
//!   linear      Ids = beta * Vds * (2*Vov - Vds) * (1 + lambda*Vds)   Vds < Vov
//!   saturation  Ids = beta * Vov^2 * (1 + lambda*Vds)
//!
//! Gate-source and gate-drain are modeled as PN junctions.

use crate::circuit::{Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::semi::{pn_conductance, pn_current, pn_temp, pn_voltage, polarity};
use super::{Device, DeviceClass, EvalParams, OutputParam};

const POL: usize = 0;
const VT0: usize = 1;
const BETA: usize = 2;
const LAMBDA: usize = 3;
const IS: usize = 4;
const VT: usize = 5;
const VCRIT: usize = 6;
const VGS: usize = 7;
const VGD: usize = 8;
const IGS: usize = 9;
const GGS: usize = 10;
const IGD: usize = 11;
const GGD: usize = 12;
const MODE: usize = 13;
const VGS_E: usize = 14;
const VDS_E: usize = 15;
const IDS: usize = 16;
const GM: usize = 17;
const GDS: usize = 18;
const OUT_VGS: usize = 19;
const OUT_VDS: usize = 20;
const OUT_IDS: usize = 21;
const LEN: usize = 22;

pub static JFET: DeviceClass = DeviceClass {
    id: "JFET",
    num_terminals: 3,
    params: &[
        ParamSpec::text("polarity", "transistor polarity", "nfet", &["nfet", "pfet"]),
        ParamSpec::number("Vt0", "threshold voltage", Unit::Volt, -2.0, Range::Any),
        ParamSpec::number("beta", "transconductance parameter", Unit::AmperePerVoltSquared, 1e-4, Range::Positive),
        ParamSpec::number("lambda", "channel-length modulation", Unit::PerVolt, 0.0, Range::NonNegative),
        ParamSpec::number("Is", "gate saturation current", Unit::Ampere, 1e-14, Range::Positive),
        ParamSpec::number("N", "gate emission coefficient", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::temp(),
    ],
    state_len: LEN,
    ops: &[
        OutputParam { index: OUT_VGS, name: "Vgs", unit: Unit::Volt },
        OutputParam { index: OUT_VDS, name: "Vds", unit: Unit::Volt },
        OutputParam { index: OUT_IDS, name: "Ids", unit: Unit::Ampere },
    ],
    linear: false,
};

fn channel_current(vgs: f64, vds: f64, vt0: f64, beta: f64, lambda: f64) -> (f64, f64, f64) {
    let vov = vgs - vt0;
    if vov <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let clm = 1.0 + lambda * vds;
    if vds < vov {
        let core = vds * (2.0 * vov - vds);
        (
            beta * core * clm,
            2.0 * beta * vds * clm,
            2.0 * beta * (vov - vds) * clm + beta * core * lambda,
        )
    } else {
        let core = vov * vov;
        (beta * core * clm, 2.0 * beta * vov * clm, beta * core * lambda)
    }
}

/// Junction field-effect transistor with terminals `[s, g, d]`.
#[derive(Debug, Default)]
pub struct Jfet {
    ns: NodeId,
    ng: NodeId,
    nd: NodeId,
}

impl Jfet {
    fn linearize(&self, network: &Network, state: &mut [f64], gmin: f64, limit: bool) -> bool {
        let pol = state[POL];
        let (is, vt) = (state[IS], state[VT]);
        let vg = network.voltage(self.ng);

        let vgs_raw = pol * (vg - network.voltage(self.ns));
        let vgd_raw = pol * (vg - network.voltage(self.nd));
        let (vgs, vgd) = if limit {
            (
                pn_voltage(vgs_raw, state[VGS], vt, state[VCRIT]),
                pn_voltage(vgd_raw, state[VGD], vt, state[VCRIT]),
            )
        } else {
            (vgs_raw, vgd_raw)
        };
        let vds = vgs - vgd;

        let (mode, vgs_e, vds_e) = if vds >= 0.0 {
            (1.0, vgs, vds)
        } else {
            (-1.0, vgd, -vds)
        };
        let (ids, gm, gds) = channel_current(vgs_e, vds_e, state[VT0], state[BETA], state[LAMBDA]);

        state[VGS] = vgs;
        state[VGD] = vgd;
        state[IGS] = pn_current(vgs, is, vt);
        state[GGS] = pn_conductance(vgs, is, vt) + gmin;
        state[IGD] = pn_current(vgd, is, vt);
        state[GGD] = pn_conductance(vgd, is, vt) + gmin;
        state[MODE] = mode;
        state[VGS_E] = vgs_e;
        state[VDS_E] = vds_e;
        state[IDS] = ids;
        state[GM] = gm;
        state[GDS] = gds + gmin;
        vgs != vgs_raw || vgd != vgd_raw
    }
}

impl Device for Jfet {
    fn class(&self) -> &'static DeviceClass {
        &JFET
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.ns = nodes[0];
        self.ng = nodes[1];
        self.nd = nodes[2];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], eval: &EvalParams) {
        let is = params.number("Is");
        let temp = params.number_opt("temp").unwrap_or(eval.temp);
        let (vt, vcrit) = pn_temp(temp, is, params.number("N"));
        state[POL] = polarity(params.text("polarity"), "pfet");
        state[VT0] = params.number("Vt0");
        state[BETA] = params.number("beta");
        state[LAMBDA] = params.number("lambda");
        state[IS] = is;
        state[VT] = vt;
        state[VCRIT] = vcrit;
    }

    fn eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) -> bool {
        self.linearize(network, state, eval.gmin, true)
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let Self { ns, ng, nd } = *self;
        let pol = state[POL];

        // Gate junctions
        let (vgs, ggs) = (state[VGS], state[GGS]);
        stamper.stamp_conductance(ng, ns, ggs);
        stamper.stamp_current_source(ng, ns, pol * (state[IGS] - ggs * vgs));
        let (vgd, ggd) = (state[VGD], state[GGD]);
        stamper.stamp_conductance(ng, nd, ggd);
        stamper.stamp_current_source(ng, nd, pol * (state[IGD] - ggd * vgd));

        // Channel
        let (d, s) = if state[MODE] >= 0.0 { (nd, ns) } else { (ns, nd) };
        let (gm, gds) = (state[GM], state[GDS]);
        stamper.stamp_vccs(d, s, ng, s, gm);
        stamper.stamp_conductance(d, s, gds);
        let ieq = state[IDS] - gm * state[VGS_E] - gds * state[VDS_E];
        stamper.stamp_current_source(d, s, pol * ieq);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) {
        self.linearize(network, state, eval.gmin, false);
        let vs = network.voltage(self.ns);
        state[OUT_VGS] = network.voltage(self.ng) - vs;
        state[OUT_VDS] = network.voltage(self.nd) - vs;
        state[OUT_IDS] = state[POL] * state[MODE] * state[IDS];
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::devices::{num, text};
    use crate::{solve, Circuit, SolveOptions};

    fn self_biased(polarity: &str, vdd: f64) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "VDD", &["nr", "0"], &[("V", num(vdd))]).unwrap();
        circuit.add_device("R", "RD", &["nr", "nd"], &[("R", num(1e3))]).unwrap();
        circuit
            .add_device("JFET", "J1", &["0", "0", "nd"], &[("polarity", text(polarity))])
            .unwrap();
        circuit
    }

    #[test]
    fn test_njf_zero_bias_saturation() {
        let mut circuit = self_biased("nfet", 10.0);
        solve(&mut circuit, &SolveOptions::default()).unwrap();

        // beta * Vt0^2 = 1e-4 * 4
        assert_relative_eq!(circuit.op("J1", "Ids").unwrap(), 4e-4, max_relative = 1e-6);
        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), 9.6, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("J1", "Vds").unwrap(), 9.6, max_relative = 1e-6);
        assert_eq!(circuit.op("J1", "Vgs").unwrap(), 0.0);
    }

    #[test]
    fn test_pjf_mirrors_njf() {
        let mut circuit = self_biased("pfet", -10.0);
        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.op("J1", "Ids").unwrap(), -4e-4, max_relative = 1e-6);
        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), -9.6, max_relative = 1e-6);
    }

    #[test]
    fn test_pinched_off_by_gate() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "VDD", &["nr", "0"], &[("V", num(10.0))]).unwrap();
        circuit.add_device("V", "VG", &["ng", "0"], &[("V", num(-3.0))]).unwrap();
        circuit.add_device("R", "RD", &["nr", "nd"], &[("R", num(1e3))]).unwrap();
        circuit.add_device("JFET", "J1", &["0", "ng", "nd"], &[]).unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_eq!(circuit.op("J1", "Ids").unwrap(), 0.0);
        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), 10.0, max_relative = 1e-9);
    }
}
