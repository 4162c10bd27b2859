//! Persistence-free validators
//!
//! Pure functions over already-parsed mappings: cross-parameter physical
//! consistency, uncertainty-shape validation and tier/event-id legality.
//! All validators return lists of human-readable messages; an empty list
//! means no issues. They never fail for validation shortfalls, only for
//! structurally malformed input (which serde rejects upstream).

pub mod physical;
pub mod tier;
pub mod uncertainty;

pub use physical::validate_physical_parameters;
pub use tier::{available_tiers, event_validation_error, is_recognized_tier, validate_event_id};
pub use uncertainty::{
    validate_parameter_uncertainties, validate_physical_parameter_uncertainties, Uncertainty,
};
