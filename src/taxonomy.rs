//! Model and parameter taxonomy
//!
//! Static registries of model types, higher-order effect definitions and
//! per-parameter metadata. The registries drive two things: completeness
//! validation of a solution's parameter mapping, and the free-parameter
//! count used for model-comparison statistics (BIC). Physical parameters
//! are derived, not fitted, so they are excluded from the count.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Keys that may appear in a parameter mapping but are metadata, not
/// fitted quantities.
pub const METADATA_KEYS: &[&str] = &["t_ref", "limb_darkening_coeffs"];

/// The physical-parameter namespace: quantities derived from a fit
/// (masses, distances, proper motions, angles). Disjoint from the fitted
/// parameter key-space and never counted as free parameters.
pub const PHYSICAL_PARAMETER_NAMES: &[&str] = &[
    "M1",
    "M2",
    "Mtot",
    "D_L",
    "D_S",
    "thetaE",
    "piE",
    "piE_N",
    "piE_E",
    "mu_rel",
    "mu_rel_N",
    "mu_rel_E",
    "mu_rel_hel",
    "phi",
    "a_proj",
];

/// Microlensing model category.
///
/// The label encodes source and lens multiplicity ("1S2L" = one source,
/// two lenses). Unknown labels are permitted through the `Other`
/// catch-all and are exempt from required-parameter checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelType {
    /// Point source, single point lens ("1S1L")
    PointSourcePointLens,
    /// Point source, binary point lens ("1S2L")
    PointSourceBinaryLens,
    /// Binary source, single point lens ("2S1L")
    BinarySourcePointLens,
    /// Binary source, binary point lens ("2S2L")
    BinarySourceBinaryLens,
    /// Point source, triple point lens ("1S3L")
    PointSourceTripleLens,
    /// Binary source, triple point lens ("2S3L")
    BinarySourceTripleLens,
    /// Any other model label (permitted, unchecked)
    Other(String),
}

impl ModelType {
    /// The canonical label used on disk and in reports.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::PointSourcePointLens => "1S1L",
            Self::PointSourceBinaryLens => "1S2L",
            Self::BinarySourcePointLens => "2S1L",
            Self::BinarySourceBinaryLens => "2S2L",
            Self::PointSourceTripleLens => "1S3L",
            Self::BinarySourceTripleLens => "2S3L",
            Self::Other(label) => label,
        }
    }

    /// Core parameters this model type requires in `parameters`.
    ///
    /// `Other` models contribute no enforced requirement.
    #[must_use]
    pub fn required_core_params(&self) -> &'static [&'static str] {
        match self {
            Self::PointSourcePointLens | Self::BinarySourcePointLens => &["t0", "u0", "tE"],
            Self::PointSourceBinaryLens | Self::BinarySourceBinaryLens => {
                &["t0", "u0", "tE", "s", "q", "alpha"]
            }
            Self::PointSourceTripleLens | Self::BinarySourceTripleLens => {
                &["t0", "u0", "tE", "s1", "q1", "alpha1", "s2", "q2", "alpha2"]
            }
            Self::Other(_) => &[],
        }
    }

    /// Whether this model has two sources (two source-flux channels per band).
    #[must_use]
    pub fn is_binary_source(&self) -> bool {
        self.label().starts_with("2S")
    }

    /// Whether this model has a binary lens (caustic-crossing geometry).
    #[must_use]
    pub fn is_binary_lens(&self) -> bool {
        matches!(
            self,
            Self::PointSourceBinaryLens | Self::BinarySourceBinaryLens
        )
    }
}

impl ModelType {
    fn from_label(label: &str) -> Self {
        match label {
            "1S1L" => Self::PointSourcePointLens,
            "1S2L" => Self::PointSourceBinaryLens,
            "2S1L" => Self::BinarySourcePointLens,
            "2S2L" => Self::BinarySourceBinaryLens,
            "1S3L" => Self::PointSourceTripleLens,
            "2S3L" => Self::BinarySourceTripleLens,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for ModelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ModelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ModelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Definition of a higher-order effect: which parameters it pulls into the
/// fit and whether it needs a reference time.
#[derive(Debug, Clone, Copy)]
pub struct EffectDefinition {
    /// Effect name as used in `higher_order_effects`
    pub name: &'static str,
    /// Whether the effect requires `t_ref` to be set
    pub requires_t_ref: bool,
    /// Parameters that must be present when the effect is active
    pub required_params: &'static [&'static str],
    /// Parameters that are commonly fitted but not mandatory
    pub optional_params: &'static [&'static str],
}

/// Registry of known higher-order effects. Unknown effect names are
/// reported by the completeness check but do not abort validation.
pub const HIGHER_ORDER_EFFECTS: &[EffectDefinition] = &[
    EffectDefinition {
        name: "parallax",
        requires_t_ref: true,
        required_params: &["piEN", "piEE"],
        optional_params: &[],
    },
    EffectDefinition {
        name: "finite-source",
        requires_t_ref: false,
        required_params: &["rho"],
        optional_params: &[],
    },
    EffectDefinition {
        name: "lens-orbital-motion",
        requires_t_ref: true,
        required_params: &["dsdt", "dadt"],
        optional_params: &["dzdt"],
    },
    EffectDefinition {
        name: "xallarap",
        requires_t_ref: true,
        required_params: &[],
        optional_params: &[],
    },
    EffectDefinition {
        name: "gaussian-process",
        requires_t_ref: false,
        required_params: &[],
        optional_params: &["ln_K", "ln_lambda", "ln_period", "ln_gamma"],
    },
    EffectDefinition {
        name: "stellar-rotation",
        requires_t_ref: false,
        required_params: &[],
        optional_params: &["v_rot_sin_i", "epsilon"],
    },
    EffectDefinition {
        name: "fitted-limb-darkening",
        requires_t_ref: false,
        required_params: &[],
        optional_params: &["u1", "u2", "u3", "u4"],
    },
];

/// Look up a higher-order effect definition by name.
#[must_use]
pub fn effect_definition(name: &str) -> Option<&'static EffectDefinition> {
    HIGHER_ORDER_EFFECTS.iter().find(|def| def.name == name)
}

/// Synthesize the per-band flux parameter names a model requires.
///
/// Single-source models need a source and a blend flux per band;
/// binary-source models need two source-flux channels plus the blend.
#[must_use]
pub fn required_flux_params(model_type: &ModelType, bands: &[String]) -> Vec<String> {
    let mut flux_params = Vec::with_capacity(bands.len() * 3);
    for band in bands {
        if model_type.is_binary_source() {
            flux_params.push(format!("F{band}_S1"));
            flux_params.push(format!("F{band}_S2"));
        } else {
            flux_params.push(format!("F{band}_S"));
        }
        flux_params.push(format!("F{band}_B"));
    }
    flux_params
}

/// Count the free (fitted) parameters in a parameter mapping.
///
/// Every key counts except designated metadata keys and any key in the
/// physical-parameter namespace: physical quantities are derived from the
/// fit and must never inflate the model-complexity penalty in BIC.
/// Unrecognized keys that look like model parameters are counted.
#[must_use]
pub fn count_model_parameters(parameters: &BTreeMap<String, f64>) -> usize {
    parameters
        .keys()
        .filter(|key| {
            !METADATA_KEYS.contains(&key.as_str())
                && !PHYSICAL_PARAMETER_NAMES.contains(&key.as_str())
        })
        .count()
}

/// Check whether a solution's parameter mapping is complete for its model
/// type, active higher-order effects and bands.
///
/// Returns human-readable messages; an empty list means no issues.
#[must_use]
pub fn check_solution_completeness(
    model_type: &ModelType,
    parameters: &BTreeMap<String, f64>,
    higher_order_effects: &[String],
    bands: &[String],
    t_ref: Option<f64>,
) -> Vec<String> {
    let mut messages = Vec::new();

    let core = model_type.required_core_params();
    for param in core {
        if !parameters.contains_key(*param) {
            messages.push(format!(
                "Missing required core parameter '{param}' for model type '{model_type}'"
            ));
        }
    }

    let mut recognized: Vec<&str> = core.to_vec();

    for effect in higher_order_effects {
        let Some(def) = effect_definition(effect) else {
            let known: Vec<&str> = HIGHER_ORDER_EFFECTS.iter().map(|d| d.name).collect();
            messages.push(format!(
                "Unknown higher-order effect: '{effect}'. Valid effects: {known:?}"
            ));
            continue;
        };
        for param in def.required_params {
            if !parameters.contains_key(*param) {
                messages.push(format!(
                    "Missing required parameter '{param}' for effect '{effect}'"
                ));
            }
        }
        for param in def.optional_params {
            if !parameters.contains_key(*param) {
                messages.push(format!(
                    "Warning: Optional parameter '{param}' not provided for effect '{effect}'"
                ));
            }
        }
        if def.requires_t_ref && t_ref.is_none() {
            messages.push(format!(
                "Reference time (t_ref) required for effect '{effect}'"
            ));
        }
        recognized.extend(def.required_params);
        recognized.extend(def.optional_params);
    }

    let flux_params = required_flux_params(model_type, bands);
    for param in &flux_params {
        if !parameters.contains_key(param) {
            messages.push(format!(
                "Missing required flux parameter '{param}' for bands {bands:?}"
            ));
        }
    }

    // Soft warning for keys nothing in the taxonomy accounts for. Metadata
    // and physical keys are handled elsewhere and stay quiet here, and
    // catch-all models have no registry to check against.
    if matches!(model_type, ModelType::Other(_)) {
        return messages;
    }
    for key in parameters.keys() {
        let key = key.as_str();
        if recognized.contains(&key)
            || flux_params.iter().any(|p| p == key)
            || METADATA_KEYS.contains(&key)
            || PHYSICAL_PARAMETER_NAMES.contains(&key)
        {
            continue;
        }
        messages.push(format!(
            "Warning: Parameter '{key}' not recognized for model type '{model_type}'"
        ));
    }

    messages
}
