//! Challenge-tier registry and event-id legality
//!
//! Each tier either constrains event ids to a prefix plus numeric range
//! or to an explicit allow-list. The `"None"` tier is the sentinel an
//! unrecognized tier is coerced to during submission validation; it
//! accepts every event id.

use std::ops::RangeInclusive;

/// The sentinel tier that skips event-id validation.
pub const NONE_TIER: &str = "None";

/// How a tier decides event-id membership.
#[derive(Debug, Clone)]
pub enum TierRule {
    /// Ids of the form `<prefix><number>` with the number in range
    PrefixRange {
        /// Required id prefix
        prefix: &'static str,
        /// Inclusive numeric range after the prefix
        range: RangeInclusive<u32>,
    },
    /// An explicit list of legal event ids
    AllowList(&'static [&'static str]),
}

struct TierDefinition {
    name: &'static str,
    rule: Option<TierRule>,
}

/// Tier registry for the 2026 data challenge. `"None"` has no rule and
/// accepts everything.
const TIERS: &[TierDefinition] = &[
    TierDefinition {
        name: NONE_TIER,
        rule: None,
    },
    TierDefinition {
        name: "beginner",
        rule: Some(TierRule::PrefixRange {
            prefix: "rmdc26_",
            range: 1000..=1499,
        }),
    },
    TierDefinition {
        name: "experienced",
        rule: Some(TierRule::PrefixRange {
            prefix: "rmdc26_",
            range: 1000..=2999,
        }),
    },
    TierDefinition {
        name: "test",
        rule: Some(TierRule::AllowList(&[
            "rmdc26_2001",
            "rmdc26_2002",
            "rmdc26_2003",
        ])),
    },
];

/// Names of all recognized tiers.
#[must_use]
pub fn available_tiers() -> Vec<&'static str> {
    TIERS.iter().map(|tier| tier.name).collect()
}

/// Whether `tier` names a recognized tier.
#[must_use]
pub fn is_recognized_tier(tier: &str) -> bool {
    TIERS.iter().any(|def| def.name == tier)
}

/// Whether `event_id` is legal under `tier`.
///
/// Unrecognized tiers reject everything; callers are expected to have
/// coerced the tier to `"None"` first.
#[must_use]
pub fn validate_event_id(event_id: &str, tier: &str) -> bool {
    let Some(def) = TIERS.iter().find(|def| def.name == tier) else {
        return false;
    };
    match &def.rule {
        None => true,
        Some(TierRule::PrefixRange { prefix, range }) => event_id
            .strip_prefix(prefix)
            .and_then(|suffix| suffix.parse::<u32>().ok())
            .is_some_and(|number| range.contains(&number)),
        Some(TierRule::AllowList(ids)) => ids.contains(&event_id),
    }
}

/// A descriptive message for an illegal event id, or `None` if legal.
#[must_use]
pub fn event_validation_error(event_id: &str, tier: &str) -> Option<String> {
    if validate_event_id(event_id, tier) {
        return None;
    }
    let def = TIERS.iter().find(|def| def.name == tier)?;
    let detail = match &def.rule {
        None => return None,
        Some(TierRule::PrefixRange { prefix, range }) => format!(
            "expected '{prefix}<number>' with number in {}..={}",
            range.start(),
            range.end()
        ),
        Some(TierRule::AllowList(ids)) => format!("expected one of {ids:?}"),
    };
    Some(format!(
        "Event id '{event_id}' is not valid for tier '{tier}': {detail}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_tiers() {
        let tiers = available_tiers();
        assert!(tiers.contains(&"None"));
        assert!(tiers.contains(&"beginner"));
        assert!(tiers.contains(&"experienced"));
        assert!(tiers.contains(&"test"));
        assert!(!is_recognized_tier("expert"));
    }

    #[test]
    fn test_prefix_range_membership() {
        assert!(validate_event_id("rmdc26_1000", "beginner"));
        assert!(validate_event_id("rmdc26_1499", "beginner"));
        assert!(!validate_event_id("rmdc26_1500", "beginner"));
        assert!(validate_event_id("rmdc26_2500", "experienced"));
        assert!(!validate_event_id("ogle_1000", "beginner"));
        assert!(!validate_event_id("rmdc26_", "beginner"));
        assert!(!validate_event_id("rmdc26_10x0", "beginner"));
    }

    #[test]
    fn test_allow_list_membership() {
        assert!(validate_event_id("rmdc26_2001", "test"));
        assert!(!validate_event_id("rmdc26_2004", "test"));
    }

    #[test]
    fn test_none_tier_accepts_everything() {
        assert!(validate_event_id("anything-goes", NONE_TIER));
        assert!(event_validation_error("anything-goes", NONE_TIER).is_none());
    }

    #[test]
    fn test_unrecognized_tier_rejects() {
        assert!(!validate_event_id("rmdc26_1000", "expert"));
        assert!(event_validation_error("rmdc26_1000", "expert").is_none());
    }

    #[test]
    fn test_error_message_names_rule() {
        let msg = event_validation_error("bad", "beginner").unwrap();
        assert!(msg.contains("rmdc26_"));
        assert!(msg.contains("1000..=1499"));

        let msg = event_validation_error("bad", "test").unwrap();
        assert!(msg.contains("rmdc26_2001"));
    }
}
