//! Newton-Raphson iteration controller.

use log::{debug, info, trace, warn};

use crate::circuit::{validate_circuit, Circuit, Network};
use crate::devices::{DeviceInstance, EvalParams};
use crate::error::{NodalError, Result};

use super::mna::{MnaMatrix, Stamper};
use super::simulator::SolveOptions;

/// Controller state. `Converged` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    /// Buffers not yet sized for the circuit
    Init,
    /// Currently running the given 1-based iteration
    Iterating(usize),
    /// Finished after the given number of iterations
    Converged(usize),
    /// Gave up: singular matrix or iteration budget exhausted
    Failed,
}

/// Convergence predicate: every unknown must satisfy
/// `|new - prev| <= abs_tol + rel_tol * max(|new|, |prev|)`.
pub fn converged(abs_tol: f64, rel_tol: f64, prev: &[f64], next: &[f64]) -> bool {
    prev.iter().zip(next).all(|(&p, &n)| {
        let tol = abs_tol + rel_tol * n.abs().max(p.abs());
        (n - p).abs() <= tol
    })
}

/// Largest absolute change between two iterates.
fn residual(prev: &[f64], next: &[f64]) -> f64 {
    prev.iter()
        .zip(next)
        .map(|(p, n)| (n - p).abs())
        .fold(0.0, f64::max)
}

/// Newton-Raphson solver for the DC operating point.
#[derive(Debug)]
pub struct NewtonRaphson {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute convergence tolerance
    pub abs_tol: f64,
    /// Relative convergence tolerance
    pub rel_tol: f64,
    /// System matrix, cleared every iteration
    matrix: MnaMatrix,
    /// Previous solution for convergence check
    x_prev: Vec<f64>,
    /// Controller state
    state: SolveState,
    /// Largest change in the last step
    residual: f64,
}

impl Default for NewtonRaphson {
    fn default() -> Self {
        Self::new(&SolveOptions::default())
    }
}

impl NewtonRaphson {
    /// Create a new Newton-Raphson solver.
    pub fn new(options: &SolveOptions) -> Self {
        Self {
            max_iterations: options.max_iterations,
            abs_tol: options.abs_tol,
            rel_tol: options.rel_tol,
            matrix: MnaMatrix::new(0),
            x_prev: Vec::new(),
            state: SolveState::Init,
            residual: 0.0,
        }
    }

    /// Current controller state.
    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Largest absolute change between the last two iterates.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// The last two iterates `(previous, final)`.
    pub fn iterates(&self) -> (&[f64], &[f64]) {
        (&self.x_prev, self.matrix.solution())
    }

    /// Solve the circuit's operating point.
    ///
    /// Returns the number of iterations used. On failure node voltages hold
    /// the last iterate and must not be trusted.
    pub fn solve(&mut self, circuit: &mut Circuit, eval: &EvalParams) -> Result<usize> {
        self.state = SolveState::Init;
        self.residual = 0.0;
        let result = self.run(circuit, eval);
        if result.is_err() {
            self.state = SolveState::Failed;
        }
        result
    }

    fn run(&mut self, circuit: &mut Circuit, eval: &EvalParams) -> Result<usize> {
        validate_circuit(circuit)?;

        let size = circuit.matrix_size();
        if self.matrix.size() != size {
            self.matrix = MnaMatrix::new(size);
            self.x_prev = vec![0.0; size];
        }

        let (network, devices) = circuit.split_mut();

        for device in devices.iter_mut() {
            trace!("derive state of {}", device.name());
            device.derive_state(eval);
            device.begin_eval(eval);
        }

        if devices.iter().all(|d| d.class().linear) {
            // The circuit consists only of linear devices.
            // The solution can be obtained in a single step.
            self.state = SolveState::Iterating(1);
            self.assemble(network, devices, eval);
            self.solve_step()?;
            network.update(self.matrix.solution());
            return Ok(self.finish(network, devices, eval, 1));
        }

        // Use the previous solution as initial guess
        network.store(&mut self.x_prev);

        for iteration in 0..self.max_iterations {
            self.state = SolveState::Iterating(iteration + 1);

            let limited = self.assemble(network, devices, eval);
            self.solve_step()?;
            network.update(self.matrix.solution());

            self.residual = residual(&self.x_prev, self.matrix.solution());
            debug!(
                "iteration {}: residual {:.3e}, {} limited",
                iteration + 1,
                self.residual,
                limited
            );

            // A limited device was linearized away from its terminal
            // voltages, so this iterate does not solve the device equations.
            if iteration > 0
                && limited == 0
                && converged(self.abs_tol, self.rel_tol, &self.x_prev, self.matrix.solution())
            {
                return Ok(self.finish(network, devices, eval, iteration + 1));
            }

            // Save current solution for next iteration
            self.x_prev.copy_from_slice(self.matrix.solution());
        }

        warn!(
            "no convergence after {} iterations (residual {:.3e})",
            self.max_iterations, self.residual
        );
        Err(NodalError::convergence_failure(self.max_iterations, self.residual))
    }

    /// Clear the system, then let every device evaluate and stamp.
    ///
    /// Returns how many devices limited their step.
    fn assemble(&mut self, network: &Network, devices: &mut [DeviceInstance], eval: &EvalParams) -> usize {
        self.matrix.clear();
        let mut limited = 0;
        for device in devices.iter_mut() {
            if device.eval(network, eval) {
                trace!("{} limited its step", device.name());
                limited += 1;
            }
        }
        let mut stamper = Stamper::new(&mut self.matrix, network);
        for device in devices.iter() {
            device.stamp(&mut stamper);
        }
        limited
    }

    fn solve_step(&mut self) -> Result<()> {
        self.matrix.solve().map_err(|err| {
            warn!("linear solve failed: {err}");
            err
        })
    }

    /// Enter the converged state and let devices finalize their probes.
    fn finish(
        &mut self,
        network: &Network,
        devices: &mut [DeviceInstance],
        eval: &EvalParams,
        iterations: usize,
    ) -> usize {
        for device in devices.iter_mut() {
            device.end_eval(network, eval);
        }
        self.state = SolveState::Converged(iterations);
        info!("converged in {iterations} iterations");
        iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converged_predicate() {
        assert!(converged(1e-9, 1e-6, &[1.0, 2.0], &[1.0, 2.0]));
        // Relative part scales with magnitude
        assert!(converged(1e-9, 1e-6, &[1000.0], &[1000.0005]));
        assert!(!converged(1e-9, 1e-6, &[1.0], &[1.0005]));
        // Absolute part dominates near zero
        assert!(converged(1e-9, 1e-6, &[0.0], &[5e-10]));
        assert!(!converged(1e-9, 1e-6, &[0.0], &[5e-9]));
    }

    #[test]
    fn test_residual() {
        assert_eq!(residual(&[1.0, -2.0, 0.0], &[1.5, -4.0, 0.1]), 2.0);
    }

    #[test]
    fn test_initial_state() {
        let newton = NewtonRaphson::default();
        assert_eq!(newton.state(), SolveState::Init);
        assert_eq!(newton.max_iterations, crate::solver::DEFAULT_MAX_ITERATIONS);
    }
}
