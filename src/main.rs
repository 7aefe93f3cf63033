//! Nodal - DC operating-point circuit simulator
//!
//! Runs canned DC sweeps and prints them as tab-separated columns.
//!
//! # Usage
//!
//! ```bash
//! nodal diode --from 0 --to 1 --points 100 > iv-diode.tsv
//! nodal bjt --rl 1000 --from 0.5 --to 0.8 --points 100 > amp-bjt.tsv
//! nodal --gmin 1e-9 diode --from -1 --to 1 --points 201
//! ```

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nodal_core::devices::num;
use nodal_core::solver::{dc_sweep, points, SweepTarget};
use nodal_core::{Circuit, Result, SolveOptions};

/// DC operating-point circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Absolute convergence tolerance
    #[arg(long, global = true, default_value_t = nodal_core::solver::DEFAULT_ABS_TOL)]
    abs_tol: f64,

    /// Relative convergence tolerance
    #[arg(long, global = true, default_value_t = nodal_core::solver::DEFAULT_REL_TOL)]
    rel_tol: f64,

    /// Maximum Newton-Raphson iterations per point
    #[arg(long, global = true, default_value_t = nodal_core::solver::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Circuit temperature in degrees Celsius
    #[arg(long, global = true, default_value_t = nodal_core::DEFAULT_TEMP)]
    temp: f64,

    /// Minimum conductance added across nonlinear junctions, in siemens
    #[arg(long, global = true, default_value_t = nodal_core::GMIN)]
    gmin: f64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diode I-V curve: a voltage source swept across a diode
    Diode {
        /// First source voltage
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Last source voltage
        #[arg(long, default_value_t = 1.0)]
        to: f64,
        /// Number of points
        #[arg(long, default_value_t = 100)]
        points: usize,
        /// Saturation current
        #[arg(long, default_value_t = 1e-14)]
        is: f64,
        /// Emission coefficient
        #[arg(long, default_value_t = 1.0)]
        n: f64,
    },
    /// Common-emitter NPN stage: base voltage swept, collector voltage read
    Bjt {
        /// Collector load resistance
        #[arg(long, default_value_t = 1000.0)]
        rl: f64,
        /// Supply voltage
        #[arg(long, default_value_t = 10.0)]
        vcc: f64,
        /// First base voltage
        #[arg(long, default_value_t = 0.5)]
        from: f64,
        /// Last base voltage
        #[arg(long, default_value_t = 0.8)]
        to: f64,
        /// Number of points
        #[arg(long, default_value_t = 100)]
        points: usize,
    },
}

impl Args {
    fn options(&self) -> SolveOptions {
        SolveOptions::new()
            .with_abs_tol(self.abs_tol)
            .with_rel_tol(self.rel_tol)
            .with_max_iterations(self.max_iterations)
            .with_temp(self.temp)
            .with_gmin(self.gmin)
    }
}

/// Sweep a source across a diode, reading back junction voltage and current.
fn diode_sweep(options: &SolveOptions, values: &[f64], is: f64, n: f64) -> Result<Vec<(f64, f64)>> {
    let mut circuit = Circuit::new();
    circuit.add_device("V", "V1", &["NP", "0"], &[("V", num(0.0))])?;
    circuit.add_device("Diode", "DUT", &["NP", "0"], &[("Is", num(is)), ("N", num(n))])?;
    dc_sweep(
        &mut circuit,
        options,
        &SweepTarget::new("V1", "V"),
        values,
        |_, circuit| Ok((circuit.op("DUT", "V")?, circuit.op("DUT", "I")?)),
    )
}

/// Sweep the base of a common-emitter stage, reading back Vbe and the collector voltage.
fn bjt_sweep(options: &SolveOptions, values: &[f64], rl: f64, vcc: f64) -> Result<Vec<(f64, f64)>> {
    let mut circuit = Circuit::new();
    circuit.add_device("V", "VCC", &["nr", "0"], &[("V", num(vcc))])?;
    circuit.add_device("V", "VB", &["nb", "0"], &[("V", num(0.0))])?;
    circuit.add_device("R", "RL", &["nr", "nc"], &[("R", num(rl))])?;
    circuit.add_device("BJT", "Q1", &["0", "nb", "nc"], &[])?;
    dc_sweep(
        &mut circuit,
        options,
        &SweepTarget::new("VB", "V"),
        values,
        |_, circuit| Ok((circuit.op("Q1", "Vbe")?, circuit.node_voltage("nc")?)),
    )
}

fn write_table(header: [&str; 2], rows: &[(f64, f64)]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "{}\t{}", header[0], header[1])?;
    for (x, y) in rows {
        writeln!(out, "{x:e}\t{y:e}")?;
    }
    out.flush()
}

fn run(args: &Args) -> Result<(Vec<(f64, f64)>, [&'static str; 2])> {
    let options = args.options();
    match args.command {
        Command::Diode { from, to, points: count, is, n } => {
            let rows = diode_sweep(&options, &points(from, to, count), is, n)?;
            Ok((rows, ["Vd", "Id"]))
        }
        Command::Bjt { rl, vcc, from, to, points: count } => {
            let rows = bjt_sweep(&options, &points(from, to, count), rl, vcc)?;
            Ok((rows, ["Vbe", "Vc"]))
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (rows, header) = match run(&args) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = write_table(header, &rows) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_reach_options() {
        let args = Args::try_parse_from(["nodal", "--gmin", "1e-9", "diode", "--temp", "50"]).unwrap();
        let options = args.options();
        assert_eq!(options.gmin, 1e-9);
        assert_eq!(options.temp, 50.0);
        assert_eq!(options.max_iterations, nodal_core::solver::DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn test_gmin_defaults_to_library_value() {
        let args = Args::try_parse_from(["nodal", "bjt"]).unwrap();
        assert_eq!(args.options().gmin, nodal_core::GMIN);
        assert!(matches!(args.command, Command::Bjt { .. }));
    }
}
