//! Solution record - one candidate model fit
//!
//! The atomic record of the submission tree: fitted parameters and their
//! uncertainties, derived physical quantities, fit statistics, lifecycle
//! flags and attached artifact paths. Instances are created through
//! [`Event::add_solution`](crate::model::Event::add_solution) and written
//! to disk when the owning submission is saved.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::taxonomy::{check_solution_completeness, ModelType};
use crate::validation::{
    validate_parameter_uncertainties, validate_physical_parameter_uncertainties,
    validate_physical_parameters, Uncertainty,
};

/// Free-text notes, either stored inline in the record or backed by a
/// file under the project directory.
///
/// Callers read notes through [`Notes::resolve`] without caring which
/// storage mode is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notes {
    /// Text stored directly in the solution record
    Inline(String),
    /// Text stored in a file, canonically
    /// `events/<event_id>/solutions/<solution_id>.md` after a save
    FileBacked(PathBuf),
}

impl Default for Notes {
    fn default() -> Self {
        Self::Inline(String::new())
    }
}

impl Notes {
    /// Whether there is any note content to speak of.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inline(text) => text.is_empty(),
            Self::FileBacked(_) => false,
        }
    }

    /// The backing file path, if the notes are file-backed.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Inline(_) => None,
            Self::FileBacked(path) => Some(path),
        }
    }

    /// Resolve the effective note text regardless of storage mode.
    ///
    /// Relative file paths are resolved against `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a backing file cannot be read.
    pub fn resolve(&self, project_root: &Path) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::FileBacked(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    project_root.join(path)
                };
                Ok(fs::read_to_string(full)?)
            }
        }
    }

    /// Whether the backing file lives under the temporary-notes
    /// convention (a relative path rooted at `tmp/`). Temporary files are
    /// relocated to their canonical location on save.
    #[must_use]
    pub(crate) fn is_temporary(&self) -> bool {
        self.file_path().is_some_and(|path| {
            !path.is_absolute()
                && path
                    .components()
                    .next()
                    .is_some_and(|c| c == Component::Normal("tmp".as_ref()))
        })
    }
}

/// One candidate model fit for a microlensing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    solution_id: String,
    /// Optional user-chosen name, unique within the owning event
    /// (enforced at validation/save time, not at assignment)
    #[serde(default)]
    pub alias: Option<String>,
    /// Model category of this fit
    pub model_type: ModelType,
    /// Fitting software used to produce the fit
    #[serde(default)]
    pub model_name: Option<String>,
    /// Fitted parameter values, keyed by parameter name
    pub parameters: BTreeMap<String, f64>,
    /// Active higher-order effects, in the order they were applied
    #[serde(default)]
    pub higher_order_effects: Vec<String>,
    /// Reference time for time-dependent effects
    #[serde(default)]
    pub t_ref: Option<f64>,
    /// Photometric bands used in the fit
    #[serde(default)]
    pub bands: Vec<String>,
    /// Whether astrometric information was used
    #[serde(default)]
    pub used_astrometry: bool,
    /// Whether postage-stamp data was used
    #[serde(default)]
    pub used_postage_stamps: bool,
    /// Name of the limb-darkening model employed
    #[serde(default)]
    pub limb_darkening_model: Option<String>,
    /// Fixed limb-darkening coefficients per band
    #[serde(default)]
    pub limb_darkening_coeffs: BTreeMap<String, f64>,
    /// Uncertainties for keys in `parameters`
    #[serde(default)]
    pub parameter_uncertainties: BTreeMap<String, Uncertainty>,
    /// Derived astrophysical quantities (disjoint key-space from
    /// `parameters`)
    #[serde(default)]
    pub physical_parameters: BTreeMap<String, f64>,
    /// Uncertainties for keys in `physical_parameters`
    #[serde(default)]
    pub physical_parameter_uncertainties: BTreeMap<String, Uncertainty>,
    /// How uncertainties were estimated (e.g. "mcmc_posterior")
    #[serde(default)]
    pub uncertainty_method: Option<String>,
    /// Confidence level of the quoted uncertainties (e.g. 0.68)
    #[serde(default)]
    pub confidence_level: Option<f64>,
    /// Log-likelihood of the fit
    #[serde(default)]
    pub log_likelihood: Option<f64>,
    /// Log-prior of the fit
    #[serde(default)]
    pub log_prior: Option<f64>,
    /// Probability of this being the best model among its event's active
    /// solutions; user-supplied or derived at export time
    #[serde(default)]
    pub relative_probability: Option<f64>,
    /// Number of data points used in the fit
    #[serde(default)]
    pub n_data_points: Option<u64>,
    /// Free-form compute metrics (CPU hours, wall time, ...)
    #[serde(default)]
    pub compute_info: BTreeMap<String, serde_json::Value>,
    /// Posterior-sample file path or URL
    #[serde(default)]
    pub posterior_path: Option<PathBuf>,
    /// Lightcurve plot path or URL
    #[serde(default)]
    pub lightcurve_plot_path: Option<PathBuf>,
    /// Lens-plane plot path or URL
    #[serde(default)]
    pub lens_plane_plot_path: Option<PathBuf>,
    /// Free-text notes, inline or file-backed
    #[serde(default)]
    pub notes: Notes,
    /// Whether this solution is included in exports
    #[serde(default = "default_true")]
    pub is_active: bool,
    creation_timestamp: DateTime<Utc>,
    /// In-memory-vs-persisted marker; never serialized
    #[serde(skip)]
    pub(crate) saved: bool,
}

const fn default_true() -> bool {
    true
}

impl Solution {
    /// Create a new solution with a generated identifier.
    pub(crate) fn new(model_type: ModelType, parameters: BTreeMap<String, f64>) -> Self {
        Self {
            solution_id: Uuid::new_v4().to_string(),
            alias: None,
            model_type,
            model_name: None,
            parameters,
            higher_order_effects: Vec::new(),
            t_ref: None,
            bands: Vec::new(),
            used_astrometry: false,
            used_postage_stamps: false,
            limb_darkening_model: None,
            limb_darkening_coeffs: BTreeMap::new(),
            parameter_uncertainties: BTreeMap::new(),
            physical_parameters: BTreeMap::new(),
            physical_parameter_uncertainties: BTreeMap::new(),
            uncertainty_method: None,
            confidence_level: None,
            log_likelihood: None,
            log_prior: None,
            relative_probability: None,
            n_data_points: None,
            compute_info: BTreeMap::new(),
            posterior_path: None,
            lightcurve_plot_path: None,
            lens_plane_plot_path: None,
            notes: Notes::default(),
            is_active: true,
            creation_timestamp: Utc::now(),
            saved: false,
        }
    }

    /// The immutable, globally unique identifier of this solution.
    #[must_use]
    pub fn solution_id(&self) -> &str {
        &self.solution_id
    }

    /// When this solution was created (fixed at construction).
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.creation_timestamp
    }

    /// Whether the current in-memory state has been persisted.
    #[must_use]
    pub const fn saved(&self) -> bool {
        self.saved
    }

    /// Exclude this solution from exports.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Include this solution in exports again.
    pub fn activate(&mut self) {
        self.is_active = true;
    }

    /// Record compute timing metadata.
    ///
    /// Safe to call repeatedly; previous values are overwritten.
    pub fn set_compute_info(&mut self, cpu_hours: Option<f64>, wall_time_hours: Option<f64>) {
        if let Some(hours) = cpu_hours {
            self.compute_info
                .insert("cpu_hours".to_string(), serde_json::json!(hours));
        }
        if let Some(hours) = wall_time_hours {
            self.compute_info
                .insert("wall_time_hours".to_string(), serde_json::json!(hours));
        }
    }

    /// Store notes inline in the record.
    pub fn set_notes(&mut self, text: impl Into<String>) {
        self.notes = Notes::Inline(text.into());
    }

    /// Point the notes at a file (relative paths resolve against the
    /// project root; `tmp/`-rooted paths are relocated on save).
    pub fn set_notes_file(&mut self, path: impl Into<PathBuf>) {
        self.notes = Notes::FileBacked(path.into());
    }

    /// Read the effective note text regardless of storage mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if file-backed notes cannot be read.
    pub fn notes_text(&self, project_root: &Path) -> Result<String> {
        self.notes.resolve(project_root)
    }

    /// The three artifact attributes, as `(name, slot)` pairs. Used by
    /// save/export path rewriting.
    pub(crate) fn artifact_slots(&mut self) -> [(&'static str, &mut Option<PathBuf>); 3] {
        [
            ("lightcurve_plot_path", &mut self.lightcurve_plot_path),
            ("lens_plane_plot_path", &mut self.lens_plane_plot_path),
            ("posterior_path", &mut self.posterior_path),
        ]
    }

    /// Validate this solution in isolation: parameter completeness,
    /// internal consistency, physical sanity and uncertainty shape.
    #[must_use]
    pub fn run_validation(&self) -> Vec<String> {
        let mut messages = check_solution_completeness(
            &self.model_type,
            &self.parameters,
            &self.higher_order_effects,
            &self.bands,
            self.t_ref,
        );
        messages.extend(self.validate_consistency());
        messages.extend(validate_physical_parameters(&self.physical_parameters));
        messages.extend(validate_parameter_uncertainties(
            &self.parameters,
            &self.parameter_uncertainties,
            &self.physical_parameters,
        ));
        messages.extend(validate_physical_parameter_uncertainties(
            &self.physical_parameters,
            &self.physical_parameter_uncertainties,
        ));
        messages
    }

    fn validate_consistency(&self) -> Vec<String> {
        let mut messages = Vec::new();
        let get = |key: &str| self.parameters.get(key).copied();

        if let Some(t_e) = get("tE") {
            if t_e <= 0.0 {
                messages.push("Einstein crossing time (tE) must be positive".to_string());
            }
        }
        if let Some(q) = get("q") {
            if q <= 0.0 || q > 1.0 {
                messages.push("Mass ratio (q) should be between 0 and 1".to_string());
            }
        }
        if let Some(s) = get("s") {
            if s <= 0.0 {
                messages.push("Separation (s) must be positive".to_string());
            } else if self.model_type.is_binary_lens() && !(0.5..=2.0).contains(&s) {
                messages.push(
                    "Warning: Separation (s) outside typical caustic crossing range (0.5-2.0)"
                        .to_string(),
                );
            }
        }
        if let Some(p) = self.relative_probability {
            if !(0.0..=1.0).contains(&p) {
                messages.push("Relative probability should be between 0 and 1".to_string());
            }
        }

        messages
    }

    /// Write this solution's JSON record under its owning event directory.
    pub(crate) fn write_record(&self, event_dir: &Path) -> Result<()> {
        let solutions_dir = event_dir.join("solutions");
        fs::create_dir_all(&solutions_dir)?;
        let out_path = solutions_dir.join(format!("{}.json", self.solution_id));
        fs::write(out_path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
