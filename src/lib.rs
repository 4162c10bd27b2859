//! # microlens-submit: Microlensing Data Challenge Submission Toolkit
//!
//! A file-backed workspace for assembling, validating and packaging
//! microlensing event-fit submissions. Teams record one [`Solution`] per
//! model fit, grouped under challenge [`Event`]s inside a single
//! [`Submission`] project directory; when the project is complete, a
//! single call produces a judge-ready zip archive.
//!
//! ## Design Principles
//!
//! - **Everything is a file**: one JSON record per solution, one manifest
//!   per event, one manifest per submission. Saves are deterministic
//!   (sorted maps, pretty JSON) so project directories diff cleanly.
//! - **Advise, then enforce**: validation returns message lists and never
//!   blocks day-to-day work; only export demands a clean bill of health.
//! - **All-or-nothing export**: the archive plan is built and verified in
//!   full before a single byte is written, so a failed export never
//!   leaves a half-written zip behind.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use microlens_submit::{load, ModelType};
//! use std::collections::BTreeMap;
//!
//! let mut submission = load("./my_project")?;
//! submission.team_name = "Team Alpha".to_string();
//! submission.tier = "beginner".to_string();
//! submission.repo_url = Some("https://github.com/team-alpha/fits".to_string());
//! submission
//!     .hardware_info
//!     .insert("cpu_details".to_string(), serde_json::json!("32-core EPYC"));
//!
//! let params: BTreeMap<String, f64> = [
//!     ("t0".to_string(), 2_459_123.5),
//!     ("u0".to_string(), 0.12),
//!     ("tE".to_string(), 22.4),
//! ]
//! .into();
//! let event = submission.get_event("rmdc26_1042");
//! let solution = event.add_solution(ModelType::PointSourcePointLens, params);
//! solution.log_likelihood = Some(-1234.56);
//! solution.n_data_points = Some(1250);
//!
//! submission.save(false)?;
//! submission.export("./submission.zip")?;
//! # Ok::<(), microlens_submit::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod export;
pub mod model;
pub mod taxonomy;
pub mod validation;

pub use error::{Error, Result};
pub use export::{relative_probability_plan, RelProbStrategy};
pub use model::{
    load, Event, EventStatus, Notes, Solution, SolutionStatus, Submission, SubmissionStatus,
};
pub use taxonomy::ModelType;
pub use validation::Uncertainty;
