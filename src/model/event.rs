//! Event - a named collection of solutions
//!
//! Groups every candidate fit for one physical microlensing event.
//! Events are created on first reference through
//! [`Submission::get_event`](crate::model::Submission::get_event) and
//! persisted as one directory per event with one JSON file per solution.
//! Events do not own a back-reference to their submission; I/O methods
//! take the project root explicitly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Solution;
use crate::taxonomy::ModelType;

/// A named collection of solutions for one microlensing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    event_id: String,
    /// Owned solutions, keyed by solution id. Excluded from the
    /// `event.json` manifest; each solution persists as its own file.
    #[serde(skip)]
    solutions: BTreeMap<String, Solution>,
}

impl Event {
    /// Create an empty event.
    #[must_use]
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            solutions: BTreeMap::new(),
        }
    }

    /// The event identifier.
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// All owned solutions, keyed by solution id.
    #[must_use]
    pub const fn solutions(&self) -> &BTreeMap<String, Solution> {
        &self.solutions
    }

    /// Mutable access to the owned solutions.
    pub fn solutions_mut(&mut self) -> &mut BTreeMap<String, Solution> {
        &mut self.solutions
    }

    /// Create and attach a new solution with a generated identifier.
    ///
    /// Never deduplicates by content; every call produces a fresh record.
    pub fn add_solution(
        &mut self,
        model_type: ModelType,
        parameters: BTreeMap<String, f64>,
    ) -> &mut Solution {
        let solution = Solution::new(model_type, parameters);
        let id = solution.solution_id().to_string();
        self.solutions.entry(id).or_insert(solution)
    }

    /// Fetch a solution by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no solution has that id.
    pub fn get_solution(&self, solution_id: &str) -> Result<&Solution> {
        self.solutions.get(solution_id).ok_or_else(|| Error::NotFound {
            kind: "solution",
            id: solution_id.to_string(),
        })
    }

    /// Fetch a solution by identifier for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no solution has that id.
    pub fn get_solution_mut(&mut self, solution_id: &str) -> Result<&mut Solution> {
        self.solutions
            .get_mut(solution_id)
            .ok_or_else(|| Error::NotFound {
                kind: "solution",
                id: solution_id.to_string(),
            })
    }

    /// All solutions currently marked active.
    #[must_use]
    pub fn active_solutions(&self) -> Vec<&Solution> {
        self.solutions.values().filter(|s| s.is_active).collect()
    }

    /// Deactivate every owned solution (they stay on disk but drop out of
    /// exports).
    pub fn clear_solutions(&mut self) {
        for solution in self.solutions.values_mut() {
            solution.is_active = false;
        }
    }

    /// Detach a solution from this event, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no solution has that id.
    pub fn remove_solution(&mut self, solution_id: &str) -> Result<Solution> {
        self.solutions
            .remove(solution_id)
            .ok_or_else(|| Error::NotFound {
                kind: "solution",
                id: solution_id.to_string(),
            })
    }

    /// Validate every owned solution, prefixing messages with the
    /// solution id.
    #[must_use]
    pub fn run_validation(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (solution_id, solution) in &self.solutions {
            for msg in solution.run_validation() {
                messages.push(format!("Solution {solution_id}: {msg}"));
            }
        }
        messages
    }

    /// Reconstruct an event from its on-disk directory.
    ///
    /// Reads `event.json` if present (otherwise synthesizes a default
    /// from the directory name), then loads every `solutions/*.json`.
    /// Loaded solutions are marked saved.
    pub(crate) fn from_dir(event_dir: &Path) -> Result<Self> {
        let manifest = event_dir.join("event.json");
        let mut event = if manifest.exists() {
            serde_json::from_str(&fs::read_to_string(&manifest)?)?
        } else {
            Self::new(event_dir.file_name().map_or_else(
                || event_dir.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            ))
        };

        let solutions_dir = event_dir.join("solutions");
        if solutions_dir.exists() {
            for entry in fs::read_dir(&solutions_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    let mut solution: Solution =
                        serde_json::from_str(&fs::read_to_string(&path)?)?;
                    solution.saved = true;
                    event
                        .solutions
                        .insert(solution.solution_id().to_string(), solution);
                }
            }
        }
        Ok(event)
    }

    /// Write this event's manifest and every owned solution under the
    /// project root.
    pub(crate) fn save(&self, project_root: &Path) -> Result<()> {
        let event_dir = project_root.join("events").join(&self.event_id);
        fs::create_dir_all(&event_dir)?;
        fs::write(
            event_dir.join("event.json"),
            serde_json::to_vec_pretty(self)?,
        )?;
        for solution in self.solutions.values() {
            solution.write_record(&event_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(keys: &[(&str, f64)]) -> BTreeMap<String, f64> {
        keys.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    fn pspl_params() -> BTreeMap<String, f64> {
        params(&[("t0", 2_459_123.5), ("u0", 0.1), ("tE", 20.0)])
    }

    #[test]
    fn test_add_solution_generates_fresh_ids() {
        let mut event = Event::new("rmdc26_2001");
        let id1 = event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        let id2 = event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        assert_ne!(id1, id2);
        assert_eq!(event.solutions().len(), 2);
    }

    #[test]
    fn test_get_solution_not_found() {
        let event = Event::new("rmdc26_2001");
        let err = event.get_solution("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "solution", .. }));
    }

    #[test]
    fn test_active_solutions_filter() {
        let mut event = Event::new("rmdc26_2001");
        let id1 = event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        event.add_solution(ModelType::PointSourcePointLens, pspl_params());

        event.get_solution_mut(&id1).unwrap().deactivate();
        assert_eq!(event.active_solutions().len(), 1);

        event.clear_solutions();
        assert!(event.active_solutions().is_empty());
    }

    #[test]
    fn test_run_validation_prefixes_solution_id() {
        let mut event = Event::new("rmdc26_2001");
        let id = event
            .add_solution(
                ModelType::PointSourcePointLens,
                params(&[("t0", 1.0), ("u0", 0.1)]),
            )
            .solution_id()
            .to_string();
        let msgs = event.run_validation();
        assert!(msgs.iter().any(|m| m.starts_with(&format!("Solution {id}:"))));
    }

    #[test]
    fn test_event_manifest_excludes_solutions() {
        let mut event = Event::new("rmdc26_2001");
        event.add_solution(ModelType::PointSourcePointLens, pspl_params());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("rmdc26_2001"));
        assert!(!json.contains("solution_id"));
    }
}
