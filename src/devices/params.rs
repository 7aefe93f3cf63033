//! Device parameter schemas and validated parameter sets.
//!
//! Every device class declares a static list of [`ParamSpec`]s. Instance
//! parameters are checked against it once, when the device is created or a
//! parameter is changed, so the solve loop can read plain numbers.

use std::fmt;

use crate::error::{NodalError, Result};

/// Physical unit of a parameter or output probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Volt,
    Ampere,
    Ohm,
    Siemens,
    Watt,
    Farad,
    Henry,
    Celsius,
    AmperePerVoltSquared,
    PerVolt,
    Unitless,
}

impl Unit {
    /// Short unit symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Ohm => "Ω",
            Unit::Siemens => "S",
            Unit::Watt => "W",
            Unit::Farad => "F",
            Unit::Henry => "H",
            Unit::Celsius => "°C",
            Unit::AmperePerVoltSquared => "A/V²",
            Unit::PerVolt => "1/V",
            Unit::Unitless => "",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Accepted range of a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Range {
    /// Any finite value
    Any,
    /// Strictly greater than zero
    Positive,
    /// Greater than or equal to zero
    NonNegative,
}

impl Range {
    fn check(&self, value: f64) -> std::result::Result<(), &'static str> {
        if !value.is_finite() {
            return Err("value must be finite");
        }
        match self {
            Range::Any => Ok(()),
            Range::Positive if value > 0.0 => Ok(()),
            Range::Positive => Err("value must be > 0"),
            Range::NonNegative if value >= 0.0 => Ok(()),
            Range::NonNegative => Err("value must be >= 0"),
        }
    }
}

/// Kind-specific part of a parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// A number; `default: None` makes it required unless `optional`
    Number {
        default: Option<f64>,
        range: Range,
        unit: Unit,
        optional: bool,
    },
    /// One of a fixed set of strings
    Text {
        default: &'static str,
        options: &'static [&'static str],
    },
}

/// Declaration of a single device parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    /// A numeric parameter that must be supplied.
    pub const fn required(name: &'static str, title: &'static str, unit: Unit, range: Range) -> Self {
        Self {
            name,
            title,
            kind: ParamKind::Number {
                default: None,
                range,
                unit,
                optional: false,
            },
        }
    }

    /// A numeric parameter with a default value.
    pub const fn number(
        name: &'static str,
        title: &'static str,
        unit: Unit,
        default: f64,
        range: Range,
    ) -> Self {
        Self {
            name,
            title,
            kind: ParamKind::Number {
                default: Some(default),
                range,
                unit,
                optional: false,
            },
        }
    }

    /// A numeric parameter that may stay unset (e.g. a temperature override).
    pub const fn optional(name: &'static str, title: &'static str, unit: Unit, range: Range) -> Self {
        Self {
            name,
            title,
            kind: ParamKind::Number {
                default: None,
                range,
                unit,
                optional: true,
            },
        }
    }

    /// A text parameter restricted to `options`.
    pub const fn text(
        name: &'static str,
        title: &'static str,
        default: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            title,
            kind: ParamKind::Text { default, options },
        }
    }

    /// Per-instance temperature override shared by semiconductor models.
    pub const fn temp() -> Self {
        Self::optional("temp", "device temperature", Unit::Celsius, Range::Any)
    }

    fn validate(&self, device: &str, value: &ParamValue) -> Result<()> {
        match (&self.kind, value) {
            (ParamKind::Number { range, .. }, ParamValue::Number(x)) => range
                .check(*x)
                .map_err(|message| NodalError::parameter_range(device, self.name, *x, message)),
            (ParamKind::Text { options, .. }, ParamValue::Text(s)) => {
                if options.iter().any(|o| o.eq_ignore_ascii_case(s)) {
                    Ok(())
                } else {
                    Err(NodalError::invalid_value(
                        device,
                        self.name,
                        format!("expected one of {}", options.join(", ")),
                    ))
                }
            }
            (ParamKind::Number { .. }, ParamValue::Text(_)) => {
                Err(NodalError::invalid_value(device, self.name, "expected a number"))
            }
            (ParamKind::Text { .. }, ParamValue::Number(_)) => {
                Err(NodalError::invalid_value(device, self.name, "expected a string"))
            }
        }
    }
}

/// A parameter value as supplied by the netlist front end.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Shorthand for a numeric parameter value.
pub fn num(value: f64) -> ParamValue {
    ParamValue::Number(value)
}

/// Shorthand for a text parameter value.
pub fn text(value: &str) -> ParamValue {
    ParamValue::Text(value.to_string())
}

/// A parameter set validated against a class schema.
#[derive(Debug, Clone)]
pub struct Params {
    schema: &'static [ParamSpec],
    values: Vec<Option<ParamValue>>,
}

impl Params {
    /// Validate `given` against `schema` on behalf of `device`.
    pub fn new(device: &str, schema: &'static [ParamSpec], given: &[(&str, ParamValue)]) -> Result<Self> {
        let mut params = Self {
            schema,
            values: vec![None; schema.len()],
        };
        for (name, value) in given {
            params.set(device, name, value.clone())?;
        }
        for (spec, value) in schema.iter().zip(&params.values) {
            if let ParamKind::Number {
                default: None,
                optional: false,
                ..
            } = spec.kind
            {
                if value.is_none() {
                    return Err(NodalError::MissingParameter {
                        device: device.to_string(),
                        param: spec.name.to_string(),
                    });
                }
            }
        }
        Ok(params)
    }

    /// Replace a single parameter value after validating it.
    pub fn set(&mut self, device: &str, name: &str, value: ParamValue) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| NodalError::unknown_parameter(device, name))?;
        self.schema[index].validate(device, &value)?;
        self.values[index] = Some(value);
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|spec| spec.name == name)
    }

    /// The schema this set was validated against.
    pub fn schema(&self) -> &'static [ParamSpec] {
        self.schema
    }

    /// Numeric value, falling back to the declared default.
    /// Returns `None` for unset optional parameters.
    pub fn number_opt(&self, name: &str) -> Option<f64> {
        let index = self.position(name)?;
        match (&self.values[index], &self.schema[index].kind) {
            (Some(ParamValue::Number(x)), _) => Some(*x),
            (None, ParamKind::Number { default, .. }) => *default,
            _ => None,
        }
    }

    /// Numeric value, falling back to the declared default.
    ///
    /// Construction guarantees a value for every required parameter, so NaN
    /// is only returned for names the class does not declare.
    pub fn number(&self, name: &str) -> f64 {
        self.number_opt(name).unwrap_or(f64::NAN)
    }

    /// Text value, falling back to the declared default.
    pub fn text(&self, name: &str) -> &str {
        let Some(index) = self.position(name) else {
            return "";
        };
        match (&self.values[index], &self.schema[index].kind) {
            (Some(ParamValue::Text(s)), _) => s,
            (None, ParamKind::Text { default, .. }) => default,
            _ => "",
        }
    }

    /// Whether the parameter was given explicitly.
    pub fn is_set(&self, name: &str) -> bool {
        self.position(name)
            .map(|index| self.values[index].is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SCHEMA: &[ParamSpec] = &[
        ParamSpec::required("R", "resistance", Unit::Ohm, Range::Positive),
        ParamSpec::number("N", "emission coefficient", Unit::Unitless, 1.0, Range::Positive),
        ParamSpec::text("polarity", "transistor polarity", "npn", &["npn", "pnp"]),
        ParamSpec::temp(),
    ];

    #[test]
    fn test_defaults_and_overrides() {
        let params = Params::new("X1", SCHEMA, &[("R", num(10.0))]).unwrap();
        assert_eq!(params.number("R"), 10.0);
        assert_eq!(params.number("N"), 1.0);
        assert_eq!(params.text("polarity"), "npn");
        assert_eq!(params.number_opt("temp"), None);
        assert!(!params.is_set("N"));

        let params = Params::new("X1", SCHEMA, &[("R", num(1.0)), ("polarity", text("pnp"))]).unwrap();
        assert_eq!(params.text("polarity"), "pnp");
    }

    #[test]
    fn test_unknown_parameter() {
        let err = Params::new("X1", SCHEMA, &[("R", num(1.0)), ("Q", num(1.0))]).unwrap_err();
        assert!(matches!(err, NodalError::UnknownParameter { ref param, .. } if param == "Q"));
    }

    #[test]
    fn test_range_violation() {
        let err = Params::new("X1", SCHEMA, &[("R", num(-5.0))]).unwrap_err();
        assert!(matches!(err, NodalError::ParameterRange { value, .. } if value == -5.0));
    }

    #[test]
    fn test_missing_required() {
        let err = Params::new("X1", SCHEMA, &[]).unwrap_err();
        assert!(matches!(err, NodalError::MissingParameter { ref param, .. } if param == "R"));
    }

    #[test]
    fn test_wrong_kind_and_option() {
        let err = Params::new("X1", SCHEMA, &[("R", text("big"))]).unwrap_err();
        assert!(matches!(err, NodalError::InvalidParameterValue { .. }));

        let err = Params::new("X1", SCHEMA, &[("R", num(1.0)), ("polarity", text("nfet"))]).unwrap_err();
        assert!(matches!(err, NodalError::InvalidParameterValue { .. }));
    }

    #[test]
    fn test_set_revalidates() {
        let mut params = Params::new("X1", SCHEMA, &[("R", num(1.0))]).unwrap();
        params.set("X1", "R", num(2.0)).unwrap();
        assert_eq!(params.number("R"), 2.0);
        assert!(params.set("X1", "R", num(0.0)).is_err());
        assert_eq!(params.number("R"), 2.0);
    }
}
