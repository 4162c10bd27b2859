//! Submission - the project-root aggregate
//!
//! Owns the event tree, the persistence layout under the project
//! directory, validation orchestration and alias bookkeeping. Obtain an
//! instance via [`load`], mutate events and solutions in memory, then
//! call [`Submission::save`] to persist or
//! [`Submission::export`](crate::export) for the judge-ready archive.
//!
//! On-disk layout:
//!
//! ```text
//! <project_root>/
//!   submission.json                  # metadata (not events, not the path)
//!   aliases.json                     # "<event_id> <alias>" -> solution_id
//!   events/<event_id>/
//!     event.json
//!     solutions/<solution_id>.json
//!     solutions/<solution_id>.md     # file-backed notes, post-save
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::solution::Notes;
use crate::model::{Event, Solution};
use crate::validation::tier::NONE_TIER;
use crate::validation::{available_tiers, event_validation_error, is_recognized_tier};

/// Top-level object representing an on-disk submission project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    /// Project root on disk; environmental, never serialized as content
    #[serde(skip)]
    project_path: PathBuf,
    /// Name of the participating team (required for export)
    #[serde(default)]
    pub team_name: String,
    /// Challenge tier (required for export; coerced to `"None"` when
    /// unrecognized, see [`Submission::validate_and_normalize`])
    #[serde(default)]
    pub tier: String,
    /// Team codebase repository URL (required for export)
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Free-form description of the compute platform (required for export)
    #[serde(default)]
    pub hardware_info: BTreeMap<String, serde_json::Value>,
    /// Owned events, keyed by event id; excluded from the manifest
    #[serde(skip)]
    events: BTreeMap<String, Event>,
}

/// Per-solution display status, produced by [`Submission::solution_status`].
#[derive(Debug, Clone, Serialize)]
pub struct SolutionStatus {
    /// Whether the solution has been persisted
    pub saved: bool,
    /// The solution's alias, if any
    pub alias: Option<String>,
    /// Model type label
    pub model_type: String,
    /// Whether the solution would be exported
    pub is_active: bool,
}

/// Per-event display status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventStatus {
    /// Solutions persisted to disk
    pub saved: usize,
    /// Solutions only in memory
    pub unsaved: usize,
    /// Total owned solutions
    pub total: usize,
    /// Status per solution id
    pub solutions: BTreeMap<String, SolutionStatus>,
}

/// Saved/unsaved counts and alias conflicts for display purposes only.
/// Computing this never mutates the submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionStatus {
    /// Solutions persisted to disk
    pub saved: usize,
    /// Solutions only in memory
    pub unsaved: usize,
    /// Total solutions across all events
    pub total: usize,
    /// Alias-conflict messages (informational here, fatal at save)
    pub duplicate_aliases: Vec<String>,
    /// Status per event id
    pub events: BTreeMap<String, EventStatus>,
}

impl Submission {
    /// The project root this submission reads from and writes to.
    #[must_use]
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// All owned events, keyed by event id.
    #[must_use]
    pub const fn events(&self) -> &BTreeMap<String, Event> {
        &self.events
    }

    /// Fetch an event by identifier without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event does not exist.
    pub fn event(&self, event_id: &str) -> Result<&Event> {
        self.events.get(event_id).ok_or_else(|| Error::NotFound {
            kind: "event",
            id: event_id.to_string(),
        })
    }

    /// Return the event with `event_id`, creating it on first reference.
    ///
    /// This is deliberately insert-on-miss: referencing an unknown event
    /// id brings it into existence rather than failing.
    pub fn get_event(&mut self, event_id: &str) -> &mut Event {
        self.events
            .entry(event_id.to_string())
            .or_insert_with(|| Event::new(event_id))
    }

    /// Strictly validate the submission, normalizing the tier as a side
    /// effect.
    ///
    /// Checks metadata completeness, tier/event-id legality, every
    /// event's solutions, and cross-event alias uniqueness. An
    /// unrecognized tier is **coerced to `"None"`** (`self.tier` is
    /// mutated) and the correction reported as a message; this mutation
    /// is intentional, load-bearing behavior, hence the method name.
    ///
    /// Callers preparing an export must treat a non-empty result as a
    /// hard stop; [`Submission::save`] treats it as warnings.
    pub fn validate_and_normalize(&mut self) -> Vec<String> {
        let mut messages = Vec::new();

        if self.team_name.is_empty() {
            messages.push("team_name is required".to_string());
        }
        if self.tier.is_empty() {
            messages.push("tier is required".to_string());
        }
        if self.repo_url.as_deref().unwrap_or_default().is_empty() {
            messages.push("repo_url is required (team repository URL)".to_string());
        }
        if self.hardware_info.is_empty() {
            messages.push("Hardware info is missing".to_string());
        }

        if !self.tier.is_empty() {
            if !is_recognized_tier(&self.tier) {
                messages.push(format!(
                    "Invalid tier '{}' changed to '{NONE_TIER}'. Available tiers: {:?}.",
                    self.tier,
                    available_tiers()
                ));
                warn!(tier = %self.tier, "unrecognized tier coerced to 'None'");
                self.tier = NONE_TIER.to_string();
            }
            if self.tier != NONE_TIER {
                for event_id in self.events.keys() {
                    if let Some(msg) = event_validation_error(event_id, &self.tier) {
                        messages.push(msg);
                    }
                }
            }
        }

        for (event_id, event) in &self.events {
            for msg in event.run_validation() {
                messages.push(format!("Event {event_id}: {msg}"));
            }
        }

        messages.extend(self.validate_alias_uniqueness());
        messages
    }

    /// The same checks as [`Submission::validate_and_normalize`] under
    /// warning semantics: nothing in the result blocks a save, and
    /// callers decide what to surface. The tier-coercion side effect
    /// applies here too.
    pub fn run_validation_warnings(&mut self) -> Vec<String> {
        self.validate_and_normalize()
    }

    /// Look up a solution by its event-scoped alias.
    #[must_use]
    pub fn get_solution_by_alias(&self, event_id: &str, alias: &str) -> Option<&Solution> {
        self.events.get(event_id)?.solutions().values().find(|sol| {
            sol.alias.as_deref() == Some(alias)
        })
    }

    /// Saved/unsaved counts and alias conflicts, for display only.
    #[must_use]
    pub fn solution_status(&self) -> SubmissionStatus {
        let mut status = SubmissionStatus {
            duplicate_aliases: self.validate_alias_uniqueness(),
            ..SubmissionStatus::default()
        };
        for (event_id, event) in &self.events {
            let mut event_status = EventStatus {
                total: event.solutions().len(),
                ..EventStatus::default()
            };
            for (solution_id, solution) in event.solutions() {
                if solution.saved() {
                    event_status.saved += 1;
                    status.saved += 1;
                } else {
                    event_status.unsaved += 1;
                    status.unsaved += 1;
                }
                status.total += 1;
                event_status.solutions.insert(
                    solution_id.clone(),
                    SolutionStatus {
                        saved: solution.saved(),
                        alias: solution.alias.clone(),
                        model_type: solution.model_type.label().to_string(),
                        is_active: solution.is_active,
                    },
                );
            }
            status.events.insert(event_id.clone(), event_status);
        }
        status
    }

    /// Persist the current state of the submission to the project root.
    ///
    /// Validation shortfalls are logged and never block a save (`force`
    /// only changes the logged guidance). Alias conflicts are fatal and
    /// abort before anything is written. On success every in-memory
    /// solution is marked saved; on-disk solutions absent from memory are
    /// left alone (see [`Submission::remove_solution`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasConflict`] for duplicate aliases, otherwise
    /// only I/O and serialization errors.
    pub fn save(&mut self, force: bool) -> Result<()> {
        let messages = self.validate_and_normalize();
        if messages.is_empty() {
            info!("submission is valid and ready for export");
        } else {
            warn!(
                count = messages.len(),
                "saving with validation warnings; fix them before exporting"
            );
            for msg in &messages {
                warn!("  {msg}");
            }
            if force {
                warn!("forced save with validation warnings");
            }
        }

        let alias_errors = self.validate_alias_uniqueness();
        if !alias_errors.is_empty() {
            return Err(Error::AliasConflict(alias_errors.join("\n")));
        }

        let unsaved = self.unsaved_count();
        let project = self.project_path.clone();
        fs::create_dir_all(project.join("events"))?;

        self.relocate_temporary_notes(&project)?;

        fs::write(
            project.join("submission.json"),
            serde_json::to_vec_pretty(self)?,
        )?;
        fs::write(
            project.join("aliases.json"),
            serde_json::to_vec_pretty(&self.build_alias_lookup())?,
        )?;

        for event in self.events.values() {
            event.save(&project)?;
        }
        for event in self.events.values_mut() {
            for solution in event.solutions_mut().values_mut() {
                solution.saved = true;
            }
        }

        if unsaved > 0 {
            info!(count = unsaved, "saved new solution(s) to disk");
        } else {
            info!("saved submission to disk");
        }
        Ok(())
    }

    /// Remove an event and all its solutions from the in-memory project.
    ///
    /// Refuses when the event still has saved solutions unless `force`
    /// is set; unsaved temporary notes files are deleted either way.
    /// Returns `false` if the event did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when saved solutions exist and `force` is false.
    pub fn remove_event(&mut self, event_id: &str, force: bool) -> Result<bool> {
        let Some(event) = self.events.remove(event_id) else {
            return Ok(false);
        };
        let saved_count = event.solutions().values().filter(|s| s.saved()).count();
        if saved_count > 0 && !force {
            self.events.insert(event_id.to_string(), event);
            return Err(Error::Other(format!(
                "Cannot remove event '{event_id}' with {saved_count} saved solution(s) without \
                 force. Use clear_solutions() to exclude them from exports instead, or pass \
                 force=true."
            )));
        }
        for solution in event.solutions().values() {
            if !solution.saved() && solution.notes.is_temporary() {
                if let Some(path) = solution.notes.file_path() {
                    let full = self.project_path.join(path);
                    if full.exists() {
                        fs::remove_file(&full)?;
                        info!(path = %full.display(), "removed temporary notes file");
                    }
                }
            }
        }
        info!(
            event_id,
            solutions = event.solutions().len(),
            "removed event"
        );
        Ok(true)
    }

    /// Remove a single solution from memory and delete its on-disk
    /// record and canonical notes file.
    ///
    /// This is the explicit counterpart to [`Submission::save`] never
    /// deleting files: removing a persisted solution requires this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown event or solution id.
    pub fn remove_solution(&mut self, event_id: &str, solution_id: &str) -> Result<()> {
        let project = self.project_path.clone();
        let event = self.events.get_mut(event_id).ok_or_else(|| Error::NotFound {
            kind: "event",
            id: event_id.to_string(),
        })?;
        let solution = event.remove_solution(solution_id)?;

        if let Some(path) = solution.notes.file_path() {
            let full = if path.is_absolute() {
                path.to_path_buf()
            } else {
                project.join(path)
            };
            if solution.notes.is_temporary() || solution.saved() {
                if full.exists() {
                    fs::remove_file(&full)?;
                }
            }
        }
        let record = project
            .join("events")
            .join(event_id)
            .join("solutions")
            .join(format!("{solution_id}.json"));
        if record.exists() {
            fs::remove_file(&record)?;
        }
        info!(event_id, solution_id, "removed solution");
        Ok(())
    }

    /// Flat `"<event_id> <alias>" -> solution_id` lookup table, persisted
    /// as `aliases.json` for fast external lookup without loading the
    /// whole tree.
    #[must_use]
    pub fn build_alias_lookup(&self) -> BTreeMap<String, String> {
        let mut lookup = BTreeMap::new();
        for (event_id, event) in &self.events {
            for solution in event.solutions().values() {
                if let Some(alias) = solution.alias.as_deref() {
                    if !alias.is_empty() {
                        lookup.insert(
                            format!("{event_id} {alias}"),
                            solution.solution_id().to_string(),
                        );
                    }
                }
            }
        }
        lookup
    }

    pub(crate) fn validate_alias_uniqueness(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (event_id, event) in &self.events {
            let mut alias_map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for solution in event.solutions().values() {
                if let Some(alias) = solution.alias.as_deref() {
                    if !alias.is_empty() {
                        alias_map.entry(alias).or_default().push(solution.solution_id());
                    }
                }
            }
            for (alias, solution_ids) in alias_map {
                if solution_ids.len() > 1 {
                    errors.push(format!(
                        "Duplicate alias '{alias}' found in event '{event_id}' for solutions \
                         {solution_ids:?}. Aliases must be unique within each event; rename one \
                         and re-save."
                    ));
                }
            }
        }
        errors
    }

    fn unsaved_count(&self) -> usize {
        self.events
            .values()
            .flat_map(|event| event.solutions().values())
            .filter(|solution| !solution.saved())
            .count()
    }

    /// Move `tmp/`-convention notes files to their canonical location and
    /// rewrite the stored paths. Only runs during save.
    fn relocate_temporary_notes(&mut self, project: &Path) -> Result<()> {
        for (event_id, event) in &mut self.events {
            let event_id = event_id.clone();
            for solution in event.solutions_mut().values_mut() {
                if !solution.notes.is_temporary() {
                    continue;
                }
                let Some(src_rel) = solution.notes.file_path() else {
                    continue;
                };
                let canonical = Path::new("events")
                    .join(&event_id)
                    .join("solutions")
                    .join(format!("{}.md", solution.solution_id()));
                let src = project.join(src_rel);
                let dst = project.join(&canonical);
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                if src.exists() {
                    fs::rename(&src, &dst)?;
                }
                solution.notes = Notes::FileBacked(canonical);
            }
        }
        Ok(())
    }
}

/// Load an existing submission project or initialize a fresh one.
///
/// The single entry point for obtaining a [`Submission`]. A missing
/// directory is created with the standard layout and an empty manifest;
/// an existing one is reconstructed from `submission.json` plus every
/// event/solution file on disk.
///
/// # Errors
///
/// Returns I/O or JSON errors if the on-disk state cannot be read.
pub fn load(project_path: impl AsRef<Path>) -> Result<Submission> {
    let project = project_path.as_ref();
    let events_dir = project.join("events");

    if !project.exists() {
        fs::create_dir_all(&events_dir)?;
        let submission = Submission {
            project_path: project.to_path_buf(),
            ..Submission::default()
        };
        fs::write(
            project.join("submission.json"),
            serde_json::to_vec_pretty(&submission)?,
        )?;
        return Ok(submission);
    }

    let manifest = project.join("submission.json");
    let mut submission: Submission = if manifest.exists() {
        serde_json::from_str(&fs::read_to_string(&manifest)?)?
    } else {
        Submission::default()
    };
    submission.project_path = project.to_path_buf();

    if events_dir.exists() {
        for entry in fs::read_dir(&events_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                let event = Event::from_dir(&path)?;
                submission.events.insert(event.event_id().to_string(), event);
            }
        }
    }

    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::ModelType;

    fn pspl_params() -> BTreeMap<String, f64> {
        [("t0", 2_459_123.5), ("u0", 0.1), ("tE", 20.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn ready_submission() -> Submission {
        Submission {
            team_name: "Team Alpha".to_string(),
            tier: NONE_TIER.to_string(),
            repo_url: Some("https://example.org/team/repo".to_string()),
            hardware_info: [("cpu_details".to_string(), serde_json::json!("Test CPU"))]
                .into_iter()
                .collect(),
            ..Submission::default()
        }
    }

    #[test]
    fn test_get_event_inserts_on_miss() {
        let mut sub = ready_submission();
        assert!(sub.event("rmdc26_2001").is_err());
        sub.get_event("rmdc26_2001");
        assert!(sub.event("rmdc26_2001").is_ok());
        // Second reference returns the same event
        sub.get_event("rmdc26_2001")
            .add_solution(ModelType::PointSourcePointLens, pspl_params());
        assert_eq!(sub.event("rmdc26_2001").unwrap().solutions().len(), 1);
    }

    #[test]
    fn test_missing_metadata_messages() {
        let mut sub = Submission::default();
        let msgs = sub.validate_and_normalize();
        assert!(msgs.iter().any(|m| m.contains("team_name")));
        assert!(msgs.iter().any(|m| m.contains("tier is required")));
        assert!(msgs.iter().any(|m| m.contains("repo_url")));
        assert!(msgs.iter().any(|m| m.contains("Hardware info")));
    }

    #[test]
    fn test_unrecognized_tier_is_coerced() {
        let mut sub = ready_submission();
        sub.tier = "expert".to_string();
        let msgs = sub.validate_and_normalize();
        assert_eq!(sub.tier, NONE_TIER);
        assert!(msgs.iter().any(|m| m.contains("Invalid tier 'expert'")));

        // Second pass is clean: the coercion already happened
        let msgs = sub.validate_and_normalize();
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_event_id_checked_against_tier() {
        let mut sub = ready_submission();
        sub.tier = "test".to_string();
        sub.get_event("rmdc26_2001");
        sub.get_event("not-an-event");
        let msgs = sub.validate_and_normalize();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("not-an-event"));
    }

    #[test]
    fn test_alias_conflict_detection() {
        let mut sub = ready_submission();
        let event = sub.get_event("rmdc26_2001");
        event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .alias = Some("best".to_string());
        event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .alias = Some("best".to_string());

        let msgs = sub.validate_alias_uniqueness();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Duplicate alias 'best'"));

        // Same alias in different events is fine
        sub.get_event("rmdc26_2002")
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .alias = Some("best".to_string());
        assert_eq!(sub.validate_alias_uniqueness().len(), 1);
    }

    #[test]
    fn test_alias_lookup_is_flat_and_sorted() {
        let mut sub = ready_submission();
        let id_b = sub
            .get_event("rmdc26_2002")
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        sub.get_event("rmdc26_2002")
            .get_solution_mut(&id_b)
            .unwrap()
            .alias = Some("late".to_string());
        let id_a = sub
            .get_event("rmdc26_2001")
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        sub.get_event("rmdc26_2001")
            .get_solution_mut(&id_a)
            .unwrap()
            .alias = Some("early".to_string());

        let lookup = sub.build_alias_lookup();
        let keys: Vec<&String> = lookup.keys().collect();
        assert_eq!(keys, vec!["rmdc26_2001 early", "rmdc26_2002 late"]);
        assert_eq!(lookup["rmdc26_2001 early"], id_a);
    }

    #[test]
    fn test_solution_status_counts() {
        let mut sub = ready_submission();
        let event = sub.get_event("rmdc26_2001");
        event.add_solution(ModelType::PointSourcePointLens, pspl_params());
        let id = event
            .add_solution(ModelType::PointSourcePointLens, pspl_params())
            .solution_id()
            .to_string();
        event.get_solution_mut(&id).unwrap().deactivate();

        let status = sub.solution_status();
        assert_eq!(status.total, 2);
        assert_eq!(status.unsaved, 2);
        assert_eq!(status.saved, 0);
        assert!(status.duplicate_aliases.is_empty());
        assert!(!status.events["rmdc26_2001"].solutions[&id].is_active);
    }

    #[test]
    fn test_manifest_excludes_events_and_path() {
        let mut sub = ready_submission();
        sub.get_event("rmdc26_2001");
        let json = serde_json::to_string(&sub).unwrap();
        assert!(!json.contains("rmdc26_2001"));
        assert!(!json.contains("project_path"));
        assert!(json.contains("Team Alpha"));
    }
}
