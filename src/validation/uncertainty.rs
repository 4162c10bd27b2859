//! Uncertainty-shape validation
//!
//! Uncertainties attach to parameter names as either a symmetric scalar
//! or an asymmetric `[lower, upper]` pair. Validation checks that every
//! uncertainty key exists in the base mapping and that the values are
//! non-negative and sanely sized. A key that belongs to the
//! physical-parameter namespace gets a specific relocation message
//! rather than a generic "unknown parameter" error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::taxonomy::PHYSICAL_PARAMETER_NAMES;

/// Relative uncertainties above this are flagged as very large.
const REL_UNCERTAINTY_LARGE: f64 = 0.5;

/// Relative uncertainties below this are flagged as suspiciously small.
const REL_UNCERTAINTY_SMALL: f64 = 0.001;

/// A parameter uncertainty: symmetric scalar or `[lower, upper]` pair.
///
/// Serialized untagged, so the JSON shapes are `0.01` and `[0.005, 0.008]`.
/// Any other shape is a structural (serde) error, not a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Uncertainty {
    /// A single symmetric one-sigma value
    Symmetric(f64),
    /// Asymmetric `[lower, upper]` bounds
    Asymmetric([f64; 2]),
}

impl Uncertainty {
    /// The `(lower, upper)` pair, with symmetric values duplicated.
    #[must_use]
    pub const fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Symmetric(v) => (*v, *v),
            Self::Asymmetric([lower, upper]) => (*lower, *upper),
        }
    }
}

/// Validate fitted-parameter uncertainties against the parameter mapping.
///
/// `physical_parameters` is consulted so that an uncertainty filed under
/// the wrong mapping produces an actionable relocation message instead of
/// a generic unknown-key error.
#[must_use]
pub fn validate_parameter_uncertainties(
    parameters: &BTreeMap<String, f64>,
    uncertainties: &BTreeMap<String, Uncertainty>,
    physical_parameters: &BTreeMap<String, f64>,
) -> Vec<String> {
    let mut messages = Vec::new();

    for (name, uncertainty) in uncertainties {
        if !parameters.contains_key(name) {
            if physical_parameters.contains_key(name)
                || PHYSICAL_PARAMETER_NAMES.contains(&name.as_str())
            {
                messages.push(format!(
                    "Physical parameter '{name}' found in parameter_uncertainties. \
                     Move it to physical_parameter_uncertainties."
                ));
            } else {
                messages.push(format!(
                    "Uncertainty provided for unknown parameter '{name}'"
                ));
            }
            continue;
        }

        if let Some(msg) = check_bounds(name, uncertainty) {
            messages.push(msg);
            continue;
        }

        if let Some(msg) = check_relative_size(name, uncertainty, parameters[name]) {
            messages.push(msg);
        }
    }

    messages
}

/// Validate physical-parameter uncertainties against the physical mapping.
#[must_use]
pub fn validate_physical_parameter_uncertainties(
    physical_parameters: &BTreeMap<String, f64>,
    uncertainties: &BTreeMap<String, Uncertainty>,
) -> Vec<String> {
    let mut messages = Vec::new();

    for (name, uncertainty) in uncertainties {
        if !physical_parameters.contains_key(name) {
            messages.push(format!(
                "Uncertainty provided for unknown physical parameter '{name}'"
            ));
            continue;
        }
        if let Some(msg) = check_bounds(name, uncertainty) {
            messages.push(msg);
        }
    }

    messages
}

fn check_bounds(name: &str, uncertainty: &Uncertainty) -> Option<String> {
    let (lower, upper) = uncertainty.bounds();
    if lower < 0.0 || upper < 0.0 {
        return Some(format!(
            "Uncertainty bounds for '{name}' must be non-negative"
        ));
    }
    if lower > upper {
        return Some(format!(
            "Lower uncertainty for '{name}' ({lower}) > upper uncertainty ({upper})"
        ));
    }
    None
}

fn check_relative_size(name: &str, uncertainty: &Uncertainty, value: f64) -> Option<String> {
    if value == 0.0 {
        return None;
    }
    let (lower, upper) = uncertainty.bounds();
    let relative = (lower / value).abs().max((upper / value).abs());
    if relative > REL_UNCERTAINTY_LARGE {
        return Some(format!(
            "Warning: Uncertainty for '{name}' is very large ({:.1}% of parameter value)",
            relative * 100.0
        ));
    }
    if relative < REL_UNCERTAINTY_SMALL {
        return Some(format!(
            "Warning: Uncertainty for '{name}' is very small ({:.3}% of parameter value)",
            relative * 100.0
        ));
    }
    None
}
