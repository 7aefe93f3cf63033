//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for the DC operating point.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = z where:
//! - x contains node voltages and branch currents
//! - A is the conductance/coefficient matrix
//! - z is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C connect voltage sources to nodes
//! - D holds dependent-source coefficients between branches
//! - v is the vector of node voltages
//! - j is the vector of branch currents
//! - i is the sum of current sources into each node
//! - e is the vector of voltage source values

pub mod linear;
mod mna;
mod newton;
mod simulator;
mod sweep;

pub use linear::{mat_multiply_vec, Matrix};
pub use mna::{MnaMatrix, Stamper};
pub use newton::{converged, NewtonRaphson, SolveState};
pub use simulator::{solve, SolveOptions, Simulator};
pub use sweep::{dc_sweep, points, SweepTarget};

/// Default absolute convergence tolerance (volts or amperes).
pub const DEFAULT_ABS_TOL: f64 = 1e-9;

/// Default relative convergence tolerance.
pub const DEFAULT_REL_TOL: f64 = 1e-6;

/// Default Newton-Raphson iteration budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Pivots smaller than this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-15;
