//! Error types for the Nodal circuit simulator.
//!
//! This module provides a unified error type [`NodalError`] that covers
//! all error conditions that can occur during circuit construction, device
//! parameter validation, and the DC operating-point solve.

use thiserror::Error;

/// Result type alias using [`NodalError`].
pub type Result<T> = std::result::Result<T, NodalError>;

/// Unified error type for all Nodal operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodalError {
    // ============ Circuit Construction Errors ============
    /// Unknown device class identifier
    #[error("Unknown device class '{class}'")]
    UnknownDeviceClass { class: String },

    /// Wrong number of terminals for a device class
    #[error("Device '{device}' expects {expected} terminals, got {found}")]
    TerminalCount {
        device: String,
        expected: usize,
        found: usize,
    },

    /// Duplicate device instance identifier
    #[error("Duplicate device '{name}'")]
    DuplicateDevice { name: String },

    /// Device not found in circuit
    #[error("Device '{name}' not found in circuit")]
    DeviceNotFound { name: String },

    /// Node not found in circuit
    #[error("Node '{node}' not found in circuit")]
    NodeNotFound { node: String },

    /// Circuit topology error
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ Parameter Errors ============
    /// Parameter name not declared by the device class
    #[error("Unknown parameter '{param}' for device '{device}'")]
    UnknownParameter { device: String, param: String },

    /// Numeric parameter outside its declared range
    #[error("Parameter '{param}' of device '{device}' is out of range ({value}): {message}")]
    ParameterRange {
        device: String,
        param: String,
        value: f64,
        message: String,
    },

    /// Required parameter without a default was not supplied
    #[error("Missing required parameter '{param}' for device '{device}'")]
    MissingParameter { device: String, param: String },

    /// Parameter value of the wrong kind or not in the option set
    #[error("Invalid value for parameter '{param}' of device '{device}': {message}")]
    InvalidParameterValue {
        device: String,
        param: String,
        message: String,
    },

    /// Output probe name not declared by the device class
    #[error("Unknown output param '{name}' for device '{device}'")]
    UnknownProbe { device: String, name: String },

    // ============ Simulation Errors ============
    /// Circuit has no devices to solve
    #[error("Empty circuit - nothing to solve")]
    EmptyCircuit,

    /// Matrix is singular and cannot be solved
    #[error("Singular matrix at column {column} - circuit may have a floating node or a voltage source loop")]
    SingularMatrix { column: usize },

    /// Matrix and vector sizes disagree
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Newton-Raphson iteration did not converge
    #[error("Newton-Raphson did not converge after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },
}

impl NodalError {
    /// Create an unknown parameter error
    pub fn unknown_parameter(device: impl Into<String>, param: impl Into<String>) -> Self {
        Self::UnknownParameter {
            device: device.into(),
            param: param.into(),
        }
    }

    /// Create a parameter range error
    pub fn parameter_range(
        device: impl Into<String>,
        param: impl Into<String>,
        value: f64,
        message: impl Into<String>,
    ) -> Self {
        Self::ParameterRange {
            device: device.into(),
            param: param.into(),
            value,
            message: message.into(),
        }
    }

    /// Create an invalid parameter value error
    pub fn invalid_value(
        device: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameterValue {
            device: device.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an unknown probe error
    pub fn unknown_probe(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownProbe {
            device: device.into(),
            name: name.into(),
        }
    }

    /// Create a convergence failure error
    pub fn convergence_failure(iterations: usize, residual: f64) -> Self {
        Self::ConvergenceFailure {
            iterations,
            residual,
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_simulation_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }
}
