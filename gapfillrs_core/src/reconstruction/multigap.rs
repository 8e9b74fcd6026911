//! Gap-filling a draft model for several media
use crate::configuration::{Solver as SolverKind, CONFIGURATION};
use crate::flux_analysis::fba::fba;
use crate::io::media::MediaDatabase;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::solvers::solver_for;
use crate::reconstruction::boundary::create_exchange_reactions;
use crate::reconstruction::gapfill::{
    gap_fill, GapFillError, GapFillFailure, GapFillOptions, GapFillOutcome,
};
use crate::reconstruction::medium::{Medium, MediumConstraints};
use crate::reconstruction::GAPFILL_PROVENANCE_KEY;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// How the media of a multi medium gap-fill are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GapFillStrategy {
    /// Media are handled in order, reactions added for one medium are part of the draft
    /// for the next
    #[default]
    Sequential,
    /// Media are handled in parallel against the same draft, the selected reactions are
    /// merged and added once
    Independent,
}

/// Summary of a multi medium gap-fill
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapFillReport {
    /// Ids of the reactions added to the draft, in the order they were added
    pub reactions_added: Vec<String>,
    /// Number of metabolites copied from the universe
    pub metabolites_added: usize,
    /// Media for which no set of reactions was found
    pub failed_media: Vec<String>,
    /// Media missing from the media database
    pub skipped_media: Vec<String>,
    /// Outcome for every medium which was attempted, in input order
    pub outcomes: IndexMap<String, GapFillOutcome>,
}

impl Display for GapFillReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Added {} reactions and {} metabolites",
            self.reactions_added.len(),
            self.metabolites_added
        )?;
        if !self.failed_media.is_empty() {
            write!(f, ", failed media: {}", self.failed_media.join(", "))?;
        }
        if !self.skipped_media.is_empty() {
            write!(f, ", unknown media: {}", self.skipped_media.join(", "))?;
        }
        Ok(())
    }
}

/// Make sure the draft can be gap-filled: it needs exchange reactions and a growth reaction
///
/// Exchange reactions are created for every extracellular metabolite when the draft has none.
pub fn prepare_draft(draft: &mut Model) -> Result<(), GapFillError> {
    if draft.exchange_reactions().next().is_none() {
        let (lower_bound, upper_bound) = CONFIGURATION
            .read()
            .map(|c| (c.lower_bound, c.upper_bound))
            .unwrap_or((-1000., 1000.));
        let created = create_exchange_reactions(draft, Some(lower_bound), Some(upper_bound));
        log::info!("Draft had no exchange reactions, created {}", created.len());
    }
    if draft.growth_reaction().is_none() {
        return Err(GapFillError::NoGrowthReaction);
    }
    Ok(())
}

/// Compounds secreted by `spent_model` when it grows on its own bounds
///
/// # Parameters
/// - `spent_model`: Model of the organism conditioning the medium
/// - `solver`: Backend used for the flux balance analysis
/// - `tolerance`: Export flux above which a compound counts as secreted
///
/// # Returns
/// Compound keys of the secreted metabolites, empty (with a warning) when the model can't grow
pub fn spent_medium_compounds(
    spent_model: &Model,
    solver: SolverKind,
    tolerance: f64,
) -> Result<Vec<String>, GapFillError> {
    let mut solver = solver_for(solver, None)?;
    let solution = fba(spent_model, None, solver.as_mut())?;
    if !solution.is_optimal() {
        log::warn!(
            "Spent medium model could not be solved ({:?}), no compounds added",
            solution.status
        );
        return Ok(Vec::new());
    }
    let mut compounds = IndexSet::new();
    for reaction in spent_model.exchange_reactions() {
        let Some((met_id, coef)) = reaction.boundary_metabolite() else {
            continue;
        };
        if -coef * solution.flux(&reaction.id) > tolerance {
            let key = match spent_model.metabolites.get(met_id) {
                Some(met) => met.compound_key().to_string(),
                None => Metabolite::new(met_id).compound_key().to_string(),
            };
            compounds.insert(key);
        }
    }
    log::info!("Spent medium adds {} compounds", compounds.len());
    Ok(compounds.into_iter().collect())
}

/// Gap-fill `draft` so it grows on each of the requested media
///
/// # Parameters
/// - `draft`: Model to repair, modified in place
/// - `universe`: Model holding the candidate reactions
/// - `media`: Names of media in `media_db`, handled in order
/// - `media_db`: Media compositions
/// - `options`: Gap-filling options, including the [`GapFillStrategy`]
/// - `spent_model`: Optional model whose secretions are added to every medium
///
/// # Returns
/// A [`GapFillReport`]. Media which can't be filled or aren't in the database are recorded in
/// the report, solver and model errors abort.
pub fn multi_gap_fill<S: AsRef<str>>(
    draft: &mut Model,
    universe: &Model,
    media: &[S],
    media_db: &MediaDatabase,
    options: &GapFillOptions,
    spent_model: Option<&Model>,
) -> Result<GapFillReport, GapFillError> {
    prepare_draft(draft)?;
    let extra_compounds = match spent_model {
        Some(spent) => {
            let lp_solver = CONFIGURATION
                .read()
                .map(|c| c.lp_solver)
                .unwrap_or(SolverKind::default_milp());
            spent_medium_compounds(spent, lp_solver, options.tolerance)?
        }
        None => Vec::new(),
    };

    let mut report = GapFillReport::default();
    let mut requested = Vec::new();
    for name in media.iter().map(|m| m.as_ref()) {
        match media_db.get(name) {
            Some(compounds) => {
                let mut medium = Medium::new(name, compounds.to_vec(), options.max_uptake);
                medium.extend(&extra_compounds);
                requested.push(medium);
            }
            None => {
                log::warn!("Medium {} is not in the media database, skipping", name);
                report.skipped_media.push(name.to_string());
            }
        }
    }

    match options.strategy {
        GapFillStrategy::Sequential => {
            for medium in &requested {
                log::info!("Gap-filling for medium {}", medium.name);
                let constraints = medium_constraints(medium, draft, universe);
                let outcome = gap_fill(draft, universe, &constraints, options)?;
                if let GapFillOutcome::Filled(ids) = &outcome {
                    let selections = ids
                        .iter()
                        .map(|id| (id.clone(), vec![medium.name.clone()]))
                        .collect();
                    install(draft, universe, &selections, &mut report)?;
                }
                record(&mut report, &medium.name, outcome);
            }
        }
        GapFillStrategy::Independent => {
            let snapshot = draft.clone();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.processes.max(1) as usize)
                .build()
                .map_err(|e| GapFillError::ThreadPool(e.to_string()))?;
            let results: Vec<(&str, Result<GapFillOutcome, GapFillError>)> = pool.install(|| {
                requested
                    .par_iter()
                    .map(|medium| {
                        log::info!("Gap-filling for medium {}", medium.name);
                        let constraints = medium_constraints(medium, &snapshot, universe);
                        (
                            medium.name.as_str(),
                            gap_fill(&snapshot, universe, &constraints, options),
                        )
                    })
                    .collect()
            });
            let mut selections: IndexMap<String, Vec<String>> = IndexMap::new();
            for (name, result) in results {
                let outcome = result?;
                if let GapFillOutcome::Filled(ids) = &outcome {
                    for id in ids {
                        selections
                            .entry(id.clone())
                            .or_default()
                            .push(name.to_string());
                    }
                }
                record(&mut report, name, outcome);
            }
            install(draft, universe, &selections, &mut report)?;
        }
    }
    log::info!("{}", report);
    Ok(report)
}

/// Bounds of a medium over both draft and universe, the draft's upper bounds win
fn medium_constraints(medium: &Medium, draft: &Model, universe: &Model) -> MediumConstraints {
    let mut constraints = medium.to_constraints(universe);
    constraints.merge(&medium.to_constraints(draft));
    constraints
}

fn record(report: &mut GapFillReport, medium: &str, outcome: GapFillOutcome) {
    match &outcome {
        GapFillOutcome::Failed(GapFillFailure::Infeasible) => {
            log::warn!("Failed to gap-fill model for medium {}", medium);
            report.failed_media.push(medium.to_string());
        }
        GapFillOutcome::Failed(GapFillFailure::Halted) => {
            log::warn!(
                "Solver stopped before gap-filling finished for medium {}",
                medium
            );
            report.failed_media.push(medium.to_string());
        }
        GapFillOutcome::Filled(ids) => {
            log::info!("Medium {} needs {} reactions", medium, ids.len())
        }
    }
    report.outcomes.insert(medium.to_string(), outcome);
}

/// Copy the selected universe reactions (and missing metabolites) into the draft
///
/// `selections` maps reaction ids to the media they were selected for, which are stored as
/// provenance in the reaction annotation.
fn install(
    draft: &mut Model,
    universe: &Model,
    selections: &IndexMap<String, Vec<String>>,
    report: &mut GapFillReport,
) -> Result<(), ModelError> {
    for (id, media) in selections {
        let mut reaction = universe
            .reactions
            .get(id)
            .cloned()
            .ok_or_else(|| ModelError::ReactionNotFound(id.clone()))?;
        for met_id in reaction.metabolites.keys() {
            if draft.metabolites.contains_key(met_id) {
                continue;
            }
            let metabolite = universe
                .metabolites
                .get(met_id)
                .cloned()
                .unwrap_or_else(|| Metabolite::new(met_id));
            draft.add_metabolite(metabolite);
            report.metabolites_added += 1;
        }
        reaction.objective_coefficient = 0.;
        reaction.annotation.insert(
            GAPFILL_PROVENANCE_KEY.to_string(),
            Value::Array(media.iter().cloned().map(Value::String).collect()),
        );
        draft.add_reaction(reaction)?;
        report.reactions_added.push(id.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};

    fn reaction(id: &str, stoich: &[(&str, f64)], lb: f64, ub: f64) -> Reaction {
        ReactionBuilder::default()
            .id(id)
            .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
            .lower_bound(lb)
            .upper_bound(ub)
            .build()
            .unwrap()
    }

    /// Secretes B when it grows on A
    fn donor() -> Model {
        let mut model = Model::new_empty();
        for met in ["A_e", "B_e", "C_c"] {
            model.add_metabolite(Metabolite::new(met));
        }
        create_exchange_reactions(&mut model, Some(0.), Some(1000.));
        model.set_flux_bounds("EX_A_e", -10., 1000.).unwrap();
        model
            .add_reaction(reaction(
                "SPLIT",
                &[("A_e", -1.), ("B_e", 1.), ("C_c", 1.)],
                0.,
                1000.,
            ))
            .unwrap();
        let mut growth = reaction("Growth", &[("C_c", -1.)], 0., 1000.);
        growth.objective_coefficient = 1.;
        model.add_reaction(growth).unwrap();
        model
    }

    #[test]
    fn spent_medium_lists_secretions() {
        let compounds =
            spent_medium_compounds(&donor(), SolverKind::default_milp(), 1e-7).unwrap();
        assert_eq!(compounds, vec!["B".to_string()]);
    }

    #[test]
    fn prepare_draft_creates_exchanges() {
        let mut draft = Model::new_empty();
        draft.add_metabolite(Metabolite::new("A_e"));
        draft.add_metabolite(Metabolite::new("A_c"));
        let mut growth = reaction("Growth", &[("A_c", -1.)], 0., 1000.);
        growth.objective_coefficient = 1.;
        draft.add_reaction(growth).unwrap();
        prepare_draft(&mut draft).unwrap();
        assert!(draft.reactions["EX_A_e"].is_exchange);
        assert_eq!(draft.exchange_reactions().count(), 1);
    }

    #[test]
    fn prepare_draft_requires_growth() {
        let mut draft = Model::new_empty();
        draft.add_metabolite(Metabolite::new("A_e"));
        assert_eq!(
            prepare_draft(&mut draft),
            Err(GapFillError::NoGrowthReaction)
        );
    }

    #[test]
    fn install_copies_metabolites_and_provenance() {
        let mut draft = Model::new_empty();
        draft.add_metabolite(Metabolite::new("A_c"));
        let mut universe = Model::new_empty();
        universe.add_metabolite(Metabolite::new("A_c"));
        universe.add_metabolite(Metabolite::new("B_c"));
        universe
            .add_reaction(reaction("A2B", &[("A_c", -1.), ("B_c", 1.)], 0., 1000.))
            .unwrap();
        let mut selections = IndexMap::new();
        selections.insert(
            "A2B".to_string(),
            vec!["M9".to_string(), "LB".to_string()],
        );
        let mut report = GapFillReport::default();
        install(&mut draft, &universe, &selections, &mut report).unwrap();
        assert_eq!(report.reactions_added, vec!["A2B".to_string()]);
        assert_eq!(report.metabolites_added, 1);
        assert!(draft.metabolites.contains_key("B_c"));
        assert_eq!(
            draft.reactions["A2B"].annotation[GAPFILL_PROVENANCE_KEY],
            serde_json::json!(["M9", "LB"])
        );
    }

    #[test]
    fn report_summary() {
        let report = GapFillReport {
            reactions_added: vec!["R1".to_string()],
            metabolites_added: 2,
            failed_media: vec!["LB".to_string()],
            skipped_media: vec![],
            outcomes: IndexMap::new(),
        };
        assert_eq!(
            report.to_string(),
            "Added 1 reactions and 2 metabolites, failed media: LB"
        );
    }
}
