//! DC sweep: re-solve one circuit while stepping a device parameter.

use log::info;

use crate::circuit::Circuit;
use crate::devices::ParamValue;
use crate::error::Result;

use super::simulator::{Simulator, SolveOptions};

/// The device parameter stepped by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepTarget {
    /// Device instance name
    pub device: String,
    /// Numeric parameter name
    pub param: String,
}

impl SweepTarget {
    pub fn new(device: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            param: param.into(),
        }
    }
}

/// `count` evenly spaced values from `start` to `stop`, both included.
///
/// `stop` may be below `start`. A single point yields `start`.
pub fn points(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Solve `circuit` once per value, reading back one result per point.
///
/// Each point starts from the previous operating point. The first error
/// aborts the sweep; the parameter keeps the value that failed.
pub fn dc_sweep<T, F>(
    circuit: &mut Circuit,
    options: &SolveOptions,
    target: &SweepTarget,
    values: &[f64],
    mut readback: F,
) -> Result<Vec<T>>
where
    F: FnMut(f64, &Circuit) -> Result<T>,
{
    let mut simulator = Simulator::new(options.clone())?;
    let mut results = Vec::with_capacity(values.len());
    for &value in values {
        circuit.set_param(&target.device, &target.param, ParamValue::Number(value))?;
        simulator.run(circuit)?;
        results.push(readback(value, circuit)?);
    }
    info!(
        "swept {}.{} over {} points",
        target.device,
        target.param,
        values.len()
    );
    Ok(results)
}
