//! MOSFET model.
//!
//! Level 1 (Shichman-Hodges) equations with overdrive `Vov = Vgs - Vt0`:
//!   cut-off     Ids = 0                                  Vov <= 0
//!   linear      Ids = beta * (Vov*Vds - Vds^2/2) * (1 + lambda*Vds)   Vds < Vov
//!   saturation  Ids = beta/2 * Vov^2 * (1 + lambda*Vds)
//!
//! The device is symmetric: when `Vds` goes negative, source and drain swap
//! roles for the evaluation.

use crate::circuit::{Network, NodeId};
use crate::solver::Stamper;

use super::params::{ParamSpec, Params, Range, Unit};
use super::semi::{fet_vds, fet_voltage, polarity};
use super::{Device, DeviceClass, EvalParams, OutputParam};

const POL: usize = 0;
const VT0: usize = 1;
const BETA: usize = 2;
const LAMBDA: usize = 3;
// Limited terminal voltages, device frame
const VGS: usize = 4;
const VDS: usize = 5;
// Linearization after the source/drain swap
const MODE: usize = 6;
const VGS_E: usize = 7;
const VDS_E: usize = 8;
const IDS: usize = 9;
const GM: usize = 10;
const GDS: usize = 11;
// Output probes, terminal frame
const OUT_VGS: usize = 12;
const OUT_VDS: usize = 13;
const OUT_IDS: usize = 14;
const OUT_GM: usize = 15;
const OUT_GDS: usize = 16;
const LEN: usize = 17;

pub static MOSFET: DeviceClass = DeviceClass {
    id: "MOSFET",
    num_terminals: 3,
    params: &[
        ParamSpec::text("polarity", "transistor polarity", "nfet", &["nfet", "pfet"]),
        ParamSpec::number("Vt0", "threshold voltage", Unit::Volt, 1.0, Range::Any),
        ParamSpec::number("beta", "transconductance parameter", Unit::AmperePerVoltSquared, 2e-2, Range::Positive),
        ParamSpec::number("lambda", "channel-length modulation", Unit::PerVolt, 0.0, Range::NonNegative),
    ],
    state_len: LEN,
    ops: &[
        OutputParam { index: OUT_VGS, name: "Vgs", unit: Unit::Volt },
        OutputParam { index: OUT_VDS, name: "Vds", unit: Unit::Volt },
        OutputParam { index: OUT_IDS, name: "Ids", unit: Unit::Ampere },
        OutputParam { index: OUT_GM, name: "gm", unit: Unit::Siemens },
        OutputParam { index: OUT_GDS, name: "gds", unit: Unit::Siemens },
    ],
    linear: false,
};

/// Drain current and its derivatives for `vgs, vds >= 0`.
fn level1(vgs: f64, vds: f64, vt0: f64, beta: f64, lambda: f64) -> (f64, f64, f64) {
    let vov = vgs - vt0;
    if vov <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let clm = 1.0 + lambda * vds;
    if vds < vov {
        let core = vov * vds - vds * vds / 2.0;
        let ids = beta * core * clm;
        let gm = beta * vds * clm;
        let gds = beta * (vov - vds) * clm + beta * core * lambda;
        (ids, gm, gds)
    } else {
        let core = vov * vov / 2.0;
        let ids = beta * core * clm;
        let gm = beta * vov * clm;
        let gds = beta * core * lambda;
        (ids, gm, gds)
    }
}

/// Field-effect transistor with terminals `[s, g, d]`.
///
/// `Ids` is reported flowing into the drain terminal.
#[derive(Debug, Default)]
pub struct Mosfet {
    ns: NodeId,
    ng: NodeId,
    nd: NodeId,
}

impl Mosfet {
    /// Drain and source after the swap selected by `mode`.
    fn channel(&self, mode: f64) -> (NodeId, NodeId) {
        if mode >= 0.0 {
            (self.nd, self.ns)
        } else {
            (self.ns, self.nd)
        }
    }

    /// Limit `(vgs, vds)` against the previous iteration.
    ///
    /// Each limited voltage is the raw one plus a correction, so a step that
    /// needs no limiting comes back bit-identical.
    fn limit(vgs: f64, vds: f64, state: &[f64]) -> (f64, f64) {
        let vt0 = state[VT0];
        let vgs_old = state[VGS];
        let vds_old = state[VDS];
        if vds_old >= 0.0 {
            let vgs_lim = fet_voltage(vgs, vgs_old, vt0);
            let vds_lim = fet_vds(vds + (vgs_lim - vgs), vds_old);
            (vgs_lim, vds_lim)
        } else {
            let vgd = vgs - vds;
            let vgd_lim = fet_voltage(vgd, vgs_old - vds_old, vt0);
            let vds_lim = -fet_vds(-vds + (vgd_lim - vgd), -vds_old);
            (vgs + (vgd_lim - vgd) + (vds_lim - vds), vds_lim)
        }
    }

    fn linearize(&self, network: &Network, state: &mut [f64], gmin: f64, limit: bool) -> bool {
        let pol = state[POL];
        let vt0 = state[VT0];
        let vg = network.voltage(self.ng);
        let vs = network.voltage(self.ns);
        let vd = network.voltage(self.nd);

        let vgs_raw = pol * (vg - vs);
        let vds_raw = pol * (vd - vs);
        let (vgs, vds) = if limit {
            Self::limit(vgs_raw, vds_raw, state)
        } else {
            (vgs_raw, vds_raw)
        };

        let (mode, vgs_e, vds_e) = if vds >= 0.0 {
            (1.0, vgs, vds)
        } else {
            (-1.0, vgs - vds, -vds)
        };
        let (ids, gm, gds) = level1(vgs_e, vds_e, vt0, state[BETA], state[LAMBDA]);

        state[VGS] = vgs;
        state[VDS] = vds;
        state[MODE] = mode;
        state[VGS_E] = vgs_e;
        state[VDS_E] = vds_e;
        state[IDS] = ids;
        state[GM] = gm;
        state[GDS] = gds + gmin;
        vgs != vgs_raw || vds != vds_raw
    }
}

impl Device for Mosfet {
    fn class(&self) -> &'static DeviceClass {
        &MOSFET
    }

    fn connect(&mut self, _network: &mut Network, nodes: &[NodeId]) {
        self.ns = nodes[0];
        self.ng = nodes[1];
        self.nd = nodes[2];
    }

    fn derive_state(&self, params: &Params, state: &mut [f64], _eval: &EvalParams) {
        state[POL] = polarity(params.text("polarity"), "pfet");
        state[VT0] = params.number("Vt0");
        state[BETA] = params.number("beta");
        state[LAMBDA] = params.number("lambda");
    }

    fn eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) -> bool {
        self.linearize(network, state, eval.gmin, true)
    }

    fn stamp(&self, state: &[f64], stamper: &mut Stamper<'_>) {
        let (nd, ns) = self.channel(state[MODE]);
        let (gm, gds) = (state[GM], state[GDS]);
        stamper.stamp_vccs(nd, ns, self.ng, ns, gm);
        stamper.stamp_conductance(nd, ns, gds);
        let ieq = state[IDS] - gm * state[VGS_E] - gds * state[VDS_E];
        stamper.stamp_current_source(nd, ns, state[POL] * ieq);
    }

    fn end_eval(&self, network: &Network, state: &mut [f64], eval: &EvalParams) {
        self.linearize(network, state, eval.gmin, false);
        let vs = network.voltage(self.ns);
        state[OUT_VGS] = network.voltage(self.ng) - vs;
        state[OUT_VDS] = network.voltage(self.nd) - vs;
        state[OUT_IDS] = state[POL] * state[MODE] * state[IDS];
        state[OUT_GM] = state[GM];
        state[OUT_GDS] = state[GDS] - eval.gmin;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::level1;
    use crate::devices::{num, text};
    use crate::{solve, Circuit, SolveOptions};

    /// Common-source stage with the gate driven directly.
    fn common_source(polarity: &str, vdd: f64, vgs: f64, rd: f64) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "VDD", &["nr", "0"], &[("V", num(vdd))]).unwrap();
        circuit.add_device("V", "VG", &["ng", "0"], &[("V", num(vgs))]).unwrap();
        circuit.add_device("R", "RD", &["nr", "nd"], &[("R", num(rd))]).unwrap();
        circuit
            .add_device(
                "MOSFET",
                "M1",
                &["0", "ng", "nd"],
                &[("polarity", text(polarity)), ("beta", num(1e-3))],
            )
            .unwrap();
        circuit
    }

    #[test]
    fn test_level1_regions() {
        assert_eq!(level1(0.5, 1.0, 1.0, 1e-3, 0.0), (0.0, 0.0, 0.0));

        let (ids, gm, gds) = level1(2.0, 5.0, 1.0, 1e-3, 0.0);
        assert_relative_eq!(ids, 0.5e-3);
        assert_relative_eq!(gm, 1e-3);
        assert_eq!(gds, 0.0);

        let (ids, _, gds) = level1(2.0, 0.5, 1.0, 1e-3, 0.0);
        assert_relative_eq!(ids, 1e-3 * (0.5 - 0.125));
        assert_relative_eq!(gds, 0.5e-3);
    }

    #[test]
    fn test_level1_is_continuous_at_pinch_off() {
        let (lin, _, _) = level1(3.0, 2.0 - 1e-9, 1.0, 1e-3, 0.02);
        let (sat, _, _) = level1(3.0, 2.0, 1.0, 1e-3, 0.02);
        assert_relative_eq!(lin, sat, max_relative = 1e-6);
    }

    #[test]
    fn test_nfet_saturation() {
        let mut circuit = common_source("nfet", 5.0, 2.0, 1e3);
        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.op("M1", "Ids").unwrap(), 0.5e-3, max_relative = 1e-6);
        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), 4.5, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("M1", "gm").unwrap(), 1e-3, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("M1", "Vgs").unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nfet_linear_region() {
        let mut circuit = common_source("nfet", 5.0, 2.0, 1e4);
        solve(&mut circuit, &SolveOptions::default()).unwrap();

        // beta*(Vds - Vds^2/2) = (5 - Vds)/Rd  =>  Vds^2 - 2.2*Vds + 1 = 0
        let expected = (2.2 - 0.84_f64.sqrt()) / 2.0;
        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), expected, max_relative = 1e-6);
    }

    #[test]
    fn test_pfet_mirrors_nfet() {
        let mut circuit = common_source("pfet", -5.0, -2.0, 1e3);
        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("nd").unwrap(), -4.5, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("M1", "Ids").unwrap(), -0.5e-3, max_relative = 1e-6);
    }

    #[test]
    fn test_source_drain_swap() {
        let mut circuit = Circuit::new();
        circuit.add_device("V", "VDD", &["nr", "0"], &[("V", num(5.0))]).unwrap();
        circuit.add_device("V", "VG", &["ng", "0"], &[("V", num(2.0))]).unwrap();
        circuit.add_device("R", "RD", &["nr", "nx"], &[("R", num(1e3))]).unwrap();
        // Drain terminal grounded: the channel conducts with source and drain swapped
        circuit
            .add_device("MOSFET", "M1", &["nx", "ng", "0"], &[("beta", num(1e-3))])
            .unwrap();

        solve(&mut circuit, &SolveOptions::default()).unwrap();

        assert_relative_eq!(circuit.node_voltage("nx").unwrap(), 4.5, max_relative = 1e-6);
        assert_relative_eq!(circuit.op("M1", "Ids").unwrap(), -0.5e-3, max_relative = 1e-6);
    }
}
