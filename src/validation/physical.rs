//! Cross-parameter physical consistency checks
//!
//! Sanity checks over the derived (physical) parameter mapping: mass
//! budgets, parallax vector-magnitude identity, distance ordering and
//! magnitude plausibility. No I/O, no mutation.

use std::collections::BTreeMap;

/// Relative tolerance for identities that should hold exactly up to
/// rounding in the submitter's pipeline (Mtot vs M1+M2, |piE| vs its
/// components).
const CONSISTENCY_REL_TOL: f64 = 0.01;

/// Distances beyond this are outside any plausible Galactic geometry (kpc).
const MAX_PLAUSIBLE_DISTANCE_KPC: f64 = 25.0;

/// Masses beyond this are far above any plausible lens (solar masses).
const MAX_PLAUSIBLE_MASS_MSUN: f64 = 50.0;

/// Validate a physical-parameter mapping for internal consistency.
///
/// Checks are independent and each failure contributes one message:
///
/// - `Mtot` must match `M1 + M2` when all three are present
/// - `piE` must match the Euclidean norm of `piE_N`/`piE_E`
/// - lens distance `D_L` must not exceed source distance `D_S`, and
///   either distance beyond a Galactic-scale threshold is flagged
/// - any single mass far above a stellar-mass threshold is flagged
#[must_use]
pub fn validate_physical_parameters(parameters: &BTreeMap<String, f64>) -> Vec<String> {
    let mut messages = Vec::new();
    let get = |key: &str| parameters.get(key).copied();

    if let (Some(m1), Some(m2), Some(mtot)) = (get("M1"), get("M2"), get("Mtot")) {
        let sum = m1 + m2;
        if !within_tolerance(mtot, sum) {
            messages.push(format!(
                "Mtot ({mtot}) does not match M1 + M2 ({sum})"
            ));
        }
    }

    if let (Some(north), Some(east), Some(magnitude)) = (get("piE_N"), get("piE_E"), get("piE")) {
        let norm = north.hypot(east);
        if !within_tolerance(magnitude, norm) {
            messages.push(format!(
                "piE magnitude ({magnitude}) does not match sqrt(piE_N^2 + piE_E^2) ({norm})"
            ));
        }
    }

    if let (Some(d_l), Some(d_s)) = (get("D_L"), get("D_S")) {
        if d_l > d_s {
            messages.push(format!(
                "Lens distance D_L ({d_l} kpc) exceeds source distance D_S ({d_s} kpc)"
            ));
        }
    }
    for key in ["D_L", "D_S"] {
        if let Some(distance) = get(key) {
            if distance > MAX_PLAUSIBLE_DISTANCE_KPC {
                messages.push(format!(
                    "Warning: {key} ({distance} kpc) is unusually large for a Galactic event"
                ));
            }
        }
    }

    for key in ["M1", "M2", "Mtot"] {
        if let Some(mass) = get(key) {
            if mass > MAX_PLAUSIBLE_MASS_MSUN {
                messages.push(format!(
                    "Warning: {key} ({mass} M_sun) is very large for a microlens"
                ));
            }
        }
    }

    messages
}

fn within_tolerance(reported: f64, derived: f64) -> bool {
    let scale = reported.abs().max(derived.abs()).max(f64::MIN_POSITIVE);
    (reported - derived).abs() / scale <= CONSISTENCY_REL_TOL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(keys: &[(&str, f64)]) -> BTreeMap<String, f64> {
        keys.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_mass_consistency() {
        let ok = params(&[("M1", 0.5), ("M2", 0.3), ("Mtot", 0.8)]);
        assert!(validate_physical_parameters(&ok).is_empty());

        let bad = params(&[("M1", 0.5), ("M2", 0.3), ("Mtot", 1.0)]);
        let msgs = validate_physical_parameters(&bad);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Mtot (1) does not match"));
    }

    #[test]
    fn test_vector_consistency() {
        // 3-4-5 triangle
        let ok = params(&[("piE_N", 0.3), ("piE_E", 0.4), ("piE", 0.5)]);
        assert!(validate_physical_parameters(&ok).is_empty());

        let bad = params(&[("piE_N", 0.3), ("piE_E", 0.4), ("piE", 0.6)]);
        let msgs = validate_physical_parameters(&bad);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("piE magnitude"));
    }

    #[test]
    fn test_distance_ordering() {
        let ok = params(&[("D_L", 4.0), ("D_S", 8.0)]);
        assert!(validate_physical_parameters(&ok).is_empty());

        let swapped = params(&[("D_L", 9.0), ("D_S", 8.0)]);
        let msgs = validate_physical_parameters(&swapped);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Lens distance D_L"));
    }

    #[test]
    fn test_large_distance_warning() {
        let far = params(&[("D_L", 30.0)]);
        let msgs = validate_physical_parameters(&far);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("unusually large"));
    }

    #[test]
    fn test_mass_magnitude_warning() {
        let ok = params(&[("M1", 1.0)]);
        assert!(validate_physical_parameters(&ok).is_empty());

        let huge = params(&[("M1", 100.0)]);
        let msgs = validate_physical_parameters(&huge);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("very large"));
    }

    #[test]
    fn test_independent_checks_accumulate() {
        let p = params(&[("D_L", 30.0), ("D_S", 8.0), ("M1", 100.0)]);
        let msgs = validate_physical_parameters(&p);
        // ordering violation + large-distance warning + large-mass warning
        assert_eq!(msgs.len(), 3);
    }
}
