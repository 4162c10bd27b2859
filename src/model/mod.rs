//! Core data model: Solution, Event and Submission records
//!
//! The records mirror the on-disk JSON layout one-to-one: a submission
//! manifest, one directory per event, one file per solution. All maps are
//! `BTreeMap` so serialized output is deterministic.

mod event;
pub(crate) mod solution;
mod submission;

pub use event::Event;
pub use solution::{Notes, Solution};
pub use submission::{load, EventStatus, SolutionStatus, Submission, SubmissionStatus};
