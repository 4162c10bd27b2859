//! Property-based tests for microlens-submit
//!
//! Mathematical invariants of the free-parameter count, the
//! relative-probability reconciliation and the serde shapes, with
//! ProptestConfig::with_cases(100).

use std::collections::BTreeMap;

use microlens_submit::taxonomy::{
    count_model_parameters, METADATA_KEYS, PHYSICAL_PARAMETER_NAMES,
};
use microlens_submit::{relative_probability_plan, Event, ModelType, Uncertainty};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Parameter keys that never collide with metadata or physical names
fn arb_fitted_keys(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z]{2,6}_[0-9]", 0..=max)
        .prop_map(|set| set.into_iter().collect())
}

fn arb_excluded_keys() -> impl Strategy<Value = Vec<String>> {
    let pool: Vec<String> = METADATA_KEYS
        .iter()
        .chain(PHYSICAL_PARAMETER_NAMES)
        .map(|k| (*k).to_string())
        .collect();
    proptest::sample::subsequence(pool.clone(), 0..=pool.len())
}

fn arb_log_likelihoods(n: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-10_000.0f64..-1.0, n)
}

// ============================================================================
// Free-Parameter Count Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: metadata and physical keys never contribute to the count
    #[test]
    fn prop_count_ignores_excluded_namespaces(
        fitted in arb_fitted_keys(8),
        excluded in arb_excluded_keys(),
    ) {
        let mut params: BTreeMap<String, f64> =
            fitted.iter().map(|k| (k.clone(), 1.0)).collect();
        let baseline = count_model_parameters(&params);
        prop_assert_eq!(baseline, fitted.len());

        for key in &excluded {
            params.insert(key.clone(), 1.0);
        }
        prop_assert_eq!(count_model_parameters(&params), baseline);
    }

    /// Property: the count is insensitive to parameter values
    #[test]
    fn prop_count_depends_only_on_keys(
        fitted in arb_fitted_keys(8),
        value in -1e6f64..1e6,
    ) {
        let a: BTreeMap<String, f64> = fitted.iter().map(|k| (k.clone(), 0.0)).collect();
        let b: BTreeMap<String, f64> = fitted.iter().map(|k| (k.clone(), value)).collect();
        prop_assert_eq!(count_model_parameters(&a), count_model_parameters(&b));
    }
}

// ============================================================================
// Relative-Probability Reconciliation Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: derived probabilities are a distribution over the
    /// remaining mass and order by log-likelihood when k and n are equal
    #[test]
    fn prop_bic_weights_form_distribution(
        log_likelihoods in arb_log_likelihoods(4),
        n_data in 10u64..100_000,
    ) {
        let mut event = Event::new("rmdc26_2001");
        let mut ids = Vec::new();
        for log_likelihood in &log_likelihoods {
            let sol = event.add_solution(
                ModelType::PointSourcePointLens,
                [
                    ("t0".to_string(), 2_459_123.5),
                    ("u0".to_string(), 0.1),
                    ("tE".to_string(), 20.0),
                ]
                .into(),
            );
            sol.log_likelihood = Some(*log_likelihood);
            sol.n_data_points = Some(n_data);
            ids.push(sol.solution_id().to_string());
        }

        let (probs, _) = relative_probability_plan(&event).unwrap();
        let total: f64 = probs.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(probs.values().all(|p| (0.0..=1.0 + 1e-12).contains(p)));

        // Same k, same n: better likelihood never gets a smaller share
        for (i, id_i) in ids.iter().enumerate() {
            for (j, id_j) in ids.iter().enumerate() {
                if log_likelihoods[i] > log_likelihoods[j] {
                    prop_assert!(probs[id_i] >= probs[id_j] - 1e-12, "{i} vs {j}");
                }
            }
        }
    }
}

// ============================================================================
// Serde Shape Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: uncertainties survive a JSON round trip
    #[test]
    fn prop_uncertainty_round_trip(
        symmetric in 0.0f64..1e3,
        lower in 0.0f64..1e3,
        upper in 0.0f64..1e3,
    ) {
        for unc in [
            Uncertainty::Symmetric(symmetric),
            Uncertainty::Asymmetric([lower, upper]),
        ] {
            let json = serde_json::to_string(&unc).unwrap();
            let back: Uncertainty = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(unc, back);
        }
    }

    /// Property: every model-type label parses back to itself
    #[test]
    fn prop_model_type_label_round_trip(label in "[12]S[123]L|[a-z]{1,8}") {
        let model: ModelType = label.parse().unwrap();
        prop_assert_eq!(model.label(), label.as_str());
    }
}
