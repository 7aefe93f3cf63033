//! Shared PN-junction and FET helpers.
//!
//! The limiting functions keep Newton steps of nonlinear devices bounded:
//! each takes the raw voltage proposed by the last linear solve and the
//! voltage the device used in the previous iteration, and returns the
//! voltage the device should actually linearize around.

use std::f64::consts::SQRT_2;

use crate::{CELSIUS_TO_KELVIN, K, Q};

/// Sign of a polarity option: `-1.0` for `negative` (`pnp`, `pfet`), else `1.0`.
pub fn polarity(value: &str, negative: &str) -> f64 {
    if value.eq_ignore_ascii_case(negative) {
        -1.0
    } else {
        1.0
    }
}

/// Thermal voltage `k·T/q` at a temperature in degrees Celsius.
pub fn thermal_voltage(temp: f64) -> f64 {
    K * (temp + CELSIUS_TO_KELVIN) / Q
}

/// Junction constants at temperature: `(n·Vt, Vcrit)`.
///
/// `Vcrit` is the voltage where the junction current curve has a radius of
/// curvature minimum; above it, steps are limited logarithmically.
pub fn pn_temp(temp: f64, is: f64, n: f64) -> (f64, f64) {
    let vt = n * thermal_voltage(temp);
    let vcrit = vt * (vt / (SQRT_2 * is)).ln();
    (vt, vcrit)
}

/// Shockley junction current.
pub fn pn_current(v: f64, is: f64, vt: f64) -> f64 {
    is * ((v / vt).exp() - 1.0)
}

/// Junction small-signal conductance `dI/dV`.
pub fn pn_conductance(v: f64, is: f64, vt: f64) -> f64 {
    is / vt * (v / vt).exp()
}

/// Limit a junction voltage step.
pub fn pn_voltage(v_new: f64, v_old: f64, vt: f64, vcrit: f64) -> f64 {
    if v_new > vcrit && (v_new - v_old).abs() > 2.0 * vt {
        if v_old > 0.0 {
            let arg = 1.0 + (v_new - v_old) / vt;
            if arg > 0.0 {
                v_old + vt * arg.ln()
            } else {
                vcrit
            }
        } else {
            vt * (v_new / vt).ln()
        }
    } else {
        v_new
    }
}

/// Limit a gate-source voltage step relative to the threshold `vto`.
pub fn fet_voltage(v_new: f64, v_old: f64, vto: f64) -> f64 {
    let vtsthi = (2.0 * (v_old - vto)).abs() + 2.0;
    let vtstlo = (v_old - vto).abs() + 1.0;
    let vtox = vto + 3.5;
    let delv = v_new - v_old;

    if v_old >= vto {
        if v_old >= vtox {
            if delv <= 0.0 {
                // Going off
                if v_new >= vtox {
                    if -delv > vtstlo {
                        return v_old - vtstlo;
                    }
                    v_new
                } else {
                    v_new.max(vto + 2.0)
                }
            } else if delv >= vtsthi {
                // Staying on
                v_old + vtsthi
            } else {
                v_new
            }
        } else if delv <= 0.0 {
            // Middle region
            v_new.max(vto - 0.5)
        } else {
            v_new.min(vto + 4.0)
        }
    } else if delv <= 0.0 {
        // Off, going further off
        if -delv > vtsthi {
            v_old - vtsthi
        } else {
            v_new
        }
    } else {
        let vtemp = vto + 0.5;
        if v_new <= vtemp {
            if delv > vtstlo {
                v_old + vtstlo
            } else {
                v_new
            }
        } else {
            vtemp
        }
    }
}

/// Limit a drain-source voltage step.
pub fn fet_vds(v_new: f64, v_old: f64) -> f64 {
    if v_old >= 3.5 {
        if v_new > v_old {
            v_new.min(3.0 * v_old + 2.0)
        } else if v_new < 3.5 {
            v_new.max(2.0)
        } else {
            v_new
        }
    } else if v_new > v_old {
        v_new.min(4.0)
    } else {
        v_new.max(-0.5)
    }
}
