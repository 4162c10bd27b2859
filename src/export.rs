//! Export pipeline - judge-ready zip archives
//!
//! Produces a single compressed archive of the submission manifest plus,
//! for every event, its active solutions with all referenced artifact
//! files embedded under a normalized per-solution subdirectory.
//!
//! The full plan (which bytes, which files, which archive paths) is built
//! and verified before the archive writer is opened, so every logic
//! failure (strict validation, missing artifacts) surfaces with zero
//! partial output; after the writer opens, the only failure mode left is
//! I/O, and that path removes the partial file.
//!
//! Missing relative probabilities are reconciled here, per event, via the
//! Bayesian Information Criterion; see [`relative_probability_plan`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{Event, Notes, Submission};
use crate::taxonomy::count_model_parameters;

/// How an event's missing relative probabilities were filled in.
/// Diagnostic only; never persisted as solution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelProbStrategy {
    /// BIC-derived Akaike-style weights over the remaining mass
    Bic,
    /// Equal split of the remaining mass (some solution lacked the data
    /// needed for BIC)
    EqualSplit,
}

/// One planned archive member.
enum ArchiveEntry {
    /// Bytes rendered in memory (manifests, rewritten solution records)
    Data { arc_path: String, bytes: Vec<u8> },
    /// A file copied from disk (plots, posteriors, notes)
    File { arc_path: String, source: PathBuf },
}

impl Submission {
    /// Create the export archive at `output_path`.
    ///
    /// Runs strict validation first and derives missing relative
    /// probabilities into export-only copies; the live submission is
    /// never mutated beyond tier normalization. All-or-nothing: on any
    /// error no usable archive exists at `output_path` (a pre-existing
    /// file there is left untouched unless writing had already begun).
    ///
    /// # Errors
    ///
    /// [`Error::ValidationFailed`] when strict validation reports
    /// anything; [`Error::MissingArtifact`] when a referenced file is not
    /// on disk; otherwise I/O and archive errors.
    pub fn export(&mut self, output_path: impl AsRef<Path>) -> Result<()> {
        let messages = self.validate_and_normalize();
        if !messages.is_empty() {
            return Err(Error::ValidationFailed(messages.join("\n")));
        }

        let entries = build_export_plan(self)?;
        write_archive(output_path.as_ref(), &entries)
    }
}

/// Derive relative probabilities for active solutions that lack one.
///
/// Solutions with an explicit probability are never touched; the
/// remaining mass `max(1 - sum(provided), 0)` is distributed over the
/// rest. If **every** solution in the group has a log-likelihood, a
/// positive data-point count and a non-zero free-parameter count, the
/// shares are Akaike-style weights `exp(-0.5 * (BIC - BIC_min))`
/// (minimum subtracted for numerical stability) normalized to the
/// remaining mass, with `BIC = k * ln(n) - 2 * log_likelihood`. If any
/// solution falls short, the whole group falls back to an equal split;
/// this all-or-nothing policy is deliberate.
///
/// Returns the per-solution assignments and the strategy used, or `None`
/// when nothing needed computing.
#[must_use]
pub fn relative_probability_plan(
    event: &Event,
) -> Option<(BTreeMap<String, f64>, RelProbStrategy)> {
    let active = event.active_solutions();
    if active.is_empty() {
        return None;
    }

    let provided_sum: f64 = active
        .iter()
        .filter_map(|sol| sol.relative_probability)
        .sum();
    let need_calc: Vec<_> = active
        .iter()
        .filter(|sol| sol.relative_probability.is_none())
        .collect();
    if need_calc.is_empty() {
        return None;
    }
    let remaining = (1.0 - provided_sum).max(0.0);

    let can_calc = need_calc.iter().all(|sol| {
        sol.log_likelihood.is_some()
            && sol.n_data_points.is_some_and(|n| n > 0)
            && count_model_parameters(&sol.parameters) > 0
    });

    let mut assignments = BTreeMap::new();
    if can_calc {
        let bic_values: Vec<(&str, f64)> = need_calc
            .iter()
            .filter_map(|sol| {
                let log_likelihood = sol.log_likelihood?;
                let n = sol.n_data_points? as f64;
                let k = count_model_parameters(&sol.parameters) as f64;
                Some((sol.solution_id(), k.mul_add(n.ln(), -2.0 * log_likelihood)))
            })
            .collect();
        let bic_min = bic_values
            .iter()
            .map(|(_, bic)| *bic)
            .fold(f64::INFINITY, f64::min);
        let weights: Vec<(&str, f64)> = bic_values
            .iter()
            .map(|(id, bic)| (*id, (-0.5 * (bic - bic_min)).exp()))
            .collect();
        let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();
        for (id, weight) in weights {
            let share = if weight_sum > 0.0 {
                remaining * weight / weight_sum
            } else {
                remaining / bic_values.len() as f64
            };
            assignments.insert(id.to_string(), share);
        }
        warn!(
            event_id = event.event_id(),
            "relative_probability calculated using BIC"
        );
        Some((assignments, RelProbStrategy::Bic))
    } else {
        let share = remaining / need_calc.len() as f64;
        for sol in need_calc {
            assignments.insert(sol.solution_id().to_string(), share);
        }
        warn!(
            event_id = event.event_id(),
            "relative_probability set equally due to missing data"
        );
        Some((assignments, RelProbStrategy::EqualSplit))
    }
}

/// Build the complete archive plan, verifying every referenced artifact
/// exists on disk. No archive is opened here.
fn build_export_plan(submission: &Submission) -> Result<Vec<ArchiveEntry>> {
    let project = submission.project_path();
    let mut entries = vec![ArchiveEntry::Data {
        arc_path: "submission.json".to_string(),
        bytes: serde_json::to_vec_pretty(submission)?,
    }];

    for (event_id, event) in submission.events() {
        entries.push(ArchiveEntry::Data {
            arc_path: format!("events/{event_id}/event.json"),
            bytes: serde_json::to_vec_pretty(event)?,
        });

        let rel_probs = relative_probability_plan(event)
            .map(|(assignments, _)| assignments)
            .unwrap_or_default();

        for solution in event.active_solutions() {
            let solution_id = solution.solution_id().to_string();
            let sol_dir_arc = format!("events/{event_id}/solutions/{solution_id}");
            let mut export_sol = solution.clone();

            // Rewrite artifact paths to the normalized per-solution
            // layout and plan the file copies, verifying sources now so
            // nothing fails after the writer opens.
            for (attribute, slot) in export_sol.artifact_slots() {
                let Some(original) = slot.clone() else {
                    continue;
                };
                let source = if original.is_absolute() {
                    original.clone()
                } else {
                    project.join(&original)
                };
                if !source.exists() {
                    return Err(Error::MissingArtifact {
                        solution_id: solution_id.clone(),
                        attribute,
                        path: source,
                    });
                }
                let filename = source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| Error::MissingArtifact {
                        solution_id: solution_id.clone(),
                        attribute,
                        path: source.clone(),
                    })?;
                let arc_path = format!("{sol_dir_arc}/{filename}");
                entries.push(ArchiveEntry::File {
                    arc_path: arc_path.clone(),
                    source,
                });
                *slot = Some(PathBuf::from(arc_path));
            }

            // File-backed notes travel with the solution; inline notes
            // already live in the JSON.
            if let Notes::FileBacked(notes_path) = &solution.notes {
                let source = if notes_path.is_absolute() {
                    notes_path.clone()
                } else {
                    project.join(notes_path)
                };
                if source.exists() {
                    let filename = source
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| format!("{solution_id}.md"));
                    let arc_path = format!("{sol_dir_arc}/{filename}");
                    entries.push(ArchiveEntry::File {
                        arc_path: arc_path.clone(),
                        source,
                    });
                    export_sol.notes = Notes::FileBacked(PathBuf::from(arc_path));
                }
            }

            if export_sol.relative_probability.is_none() {
                export_sol.relative_probability = rel_probs.get(&solution_id).copied();
            }

            entries.push(ArchiveEntry::Data {
                arc_path: format!("{sol_dir_arc}.json"),
                bytes: serde_json::to_vec_pretty(&export_sol)?,
            });
        }
    }

    Ok(entries)
}

/// Write the planned entries to a deflate-compressed zip. Any failure
/// removes the partial file so no unusable archive is left behind.
fn write_archive(output_path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let result = write_archive_inner(output_path, entries);
    if result.is_err() {
        let _ = fs::remove_file(output_path);
    }
    result
}

fn write_archive_inner(output_path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let file = fs::File::create(output_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match entry {
            ArchiveEntry::Data { arc_path, bytes } => {
                writer.start_file(arc_path.as_str(), options)?;
                writer.write_all(bytes)?;
            }
            ArchiveEntry::File { arc_path, source } => {
                writer.start_file(arc_path.as_str(), options)?;
                let mut src = fs::File::open(source)?;
                std::io::copy(&mut src, &mut writer)?;
            }
        }
    }
    writer.finish()?;
    Ok(())
}
