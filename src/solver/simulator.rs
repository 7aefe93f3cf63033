//! Main simulator interface.

use log::debug;

use crate::circuit::Circuit;
use crate::devices::EvalParams;
use crate::error::{NodalError, Result};
use crate::{CELSIUS_TO_KELVIN, DEFAULT_TEMP, GMIN};

use super::newton::{NewtonRaphson, SolveState};
use super::{DEFAULT_ABS_TOL, DEFAULT_MAX_ITERATIONS, DEFAULT_REL_TOL};

/// Options for a DC operating-point solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Absolute convergence tolerance (volts or amperes).
    pub abs_tol: f64,
    /// Relative convergence tolerance.
    pub rel_tol: f64,
    /// Maximum Newton-Raphson iterations.
    pub max_iterations: usize,
    /// Conductance added across nonlinear devices (siemens).
    pub gmin: f64,
    /// Circuit temperature in degrees Celsius.
    pub temp: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            abs_tol: DEFAULT_ABS_TOL,
            rel_tol: DEFAULT_REL_TOL,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gmin: GMIN,
            temp: DEFAULT_TEMP,
        }
    }
}

impl SolveOptions {
    /// Create a new set of options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the absolute convergence tolerance.
    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    /// Set the relative convergence tolerance.
    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    /// Set the maximum Newton-Raphson iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set gmin. Zero disables it.
    pub fn with_gmin(mut self, gmin: f64) -> Self {
        self.gmin = gmin;
        self
    }

    /// Set the circuit temperature (degrees Celsius).
    pub fn with_temp(mut self, temp: f64) -> Self {
        self.temp = temp;
        self
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.abs_tol.is_finite() && self.abs_tol >= 0.0) {
            return Err(NodalError::invalid_simulation_param(format!(
                "abs_tol must be finite and >= 0, got {}",
                self.abs_tol
            )));
        }
        if !(self.rel_tol.is_finite() && self.rel_tol >= 0.0) {
            return Err(NodalError::invalid_simulation_param(format!(
                "rel_tol must be finite and >= 0, got {}",
                self.rel_tol
            )));
        }
        if self.max_iterations == 0 {
            return Err(NodalError::invalid_simulation_param(
                "max_iterations must be at least 1",
            ));
        }
        if !(self.gmin.is_finite() && self.gmin >= 0.0) {
            return Err(NodalError::invalid_simulation_param(format!(
                "gmin must be finite and >= 0, got {}",
                self.gmin
            )));
        }
        if !(self.temp.is_finite() && self.temp > -CELSIUS_TO_KELVIN) {
            return Err(NodalError::invalid_simulation_param(format!(
                "temp must be above absolute zero, got {}",
                self.temp
            )));
        }
        Ok(())
    }

    /// Solve-wide values handed to the devices.
    pub fn eval_params(&self) -> EvalParams {
        EvalParams {
            temp: self.temp,
            gmin: self.gmin,
        }
    }
}

/// Reusable DC solver.
///
/// Keeps the iteration buffers between solves, so repeated solves of the
/// same circuit (a parameter sweep) do not reallocate.
#[derive(Debug)]
pub struct Simulator {
    options: SolveOptions,
    newton: NewtonRaphson,
}

impl Simulator {
    /// Create a simulator after validating the options.
    pub fn new(options: SolveOptions) -> Result<Self> {
        options.validate()?;
        let newton = NewtonRaphson::new(&options);
        Ok(Self { options, newton })
    }

    /// The options this simulator was built with.
    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// State of the iteration controller after the last run.
    pub fn state(&self) -> SolveState {
        self.newton.state()
    }

    /// The last two iterates `(previous, final)` of the last run.
    pub fn iterates(&self) -> (&[f64], &[f64]) {
        self.newton.iterates()
    }

    /// Solve the operating point. Returns the number of iterations used.
    pub fn run(&mut self, circuit: &mut Circuit) -> Result<usize> {
        debug!(
            "solving {} devices, {} unknowns",
            circuit.devices().len(),
            circuit.matrix_size()
        );
        self.newton.solve(circuit, &self.options.eval_params())
    }
}

/// Solve the DC operating point of a circuit.
///
/// On success node voltages, branch currents and device probes hold the
/// operating point. On failure they hold the last iterate and the circuit
/// must be treated as unsolved.
pub fn solve(circuit: &mut Circuit, options: &SolveOptions) -> Result<usize> {
    Simulator::new(options.clone())?.run(circuit)
}
