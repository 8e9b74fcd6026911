//! Minimum cost selection of universe reactions restoring growth of a draft model
//!
//! The selection is a mixed integer linear program over the draft reactions (always active)
//! and the candidate reactions of the universe, each gated by a binary variable:
//!
//! ```text
//! minimize    Σ w_c·y_c
//! subject to  S·v = 0
//!             v_c - ub_c·y_c <= 0,  v_c - lb_c·y_c >= 0   for every candidate c
//!             v_growth >= min_growth
//!             lb <= v <= ub
//! ```
use crate::configuration::{Solver as SolverKind, CONFIGURATION};
use crate::flux_analysis::fba::FbaError;
use crate::flux_analysis::{add_mass_balance, effective_bounds};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{solver_for, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::OptimizationStatus;
use crate::reconstruction::medium::MediumConstraints;
use crate::reconstruction::multigap::GapFillStrategy;
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Options controlling gap-filling, defaults are taken from the global configuration
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(default)]
pub struct GapFillOptions {
    /// Growth flux the repaired model must reach
    pub min_growth: f64,
    /// Magnitude used in place of infinite bounds in the gating constraints
    pub big_m: f64,
    /// Cost of activating a candidate reaction, candidates not listed cost 1
    pub penalties: IndexMap<String, f64>,
    /// Uptake rate of every medium compound
    pub max_uptake: f64,
    /// Backend used for the mixed integer program
    pub solver: SolverKind,
    /// Time limit (seconds) of every solve
    pub time_limit: Option<f64>,
    /// Tolerance used when reading fluxes
    pub tolerance: f64,
    /// How several media are combined
    pub strategy: GapFillStrategy,
    /// Worker threads used by [`GapFillStrategy::Independent`]
    pub processes: u32,
}

impl Default for GapFillOptions {
    fn default() -> Self {
        let config = CONFIGURATION
            .read()
            .map(|c| c.clone())
            .unwrap_or_default();
        Self {
            min_growth: config.min_growth,
            big_m: config.big_m,
            penalties: IndexMap::new(),
            max_uptake: config.max_uptake,
            solver: config.milp_solver,
            time_limit: config.time_limit,
            tolerance: config.tolerance,
            strategy: GapFillStrategy::Sequential,
            processes: config.processes,
        }
    }
}

/// Outcome of gap-filling for a single medium
#[derive(Debug, Clone, PartialEq)]
pub enum GapFillOutcome {
    /// Ids of the universe reactions to activate, empty when the draft already grows
    Filled(IndexSet<String>),
    /// No set of reactions could be found
    Failed(GapFillFailure),
}

impl GapFillOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, GapFillOutcome::Filled(_))
    }
}

/// Why no set of reactions was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFillFailure {
    /// Even the full universe can't make the draft grow
    Infeasible,
    /// The solver stopped (time or iteration limit) before proving optimality
    Halted,
}

/// Errors preventing gap-filling from being attempted or completed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GapFillError {
    /// The draft model has no reaction in its objective
    #[error("Draft model has no growth reaction")]
    NoGrowthReaction,
    /// The optimization problem could not be built
    #[error("Unable to build gap-filling problem: {0}")]
    Problem(#[from] ProblemError),
    /// The solver failed, distinct from an infeasible problem
    #[error("Solver failure: {0}")]
    Solver(#[from] SolverError),
    /// The model could not be updated
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Flux balance analysis of the spent medium model failed
    #[error("Spent medium analysis failed: {0}")]
    Fba(#[from] FbaError),
    /// The worker pool for independent gap-filling could not be started
    #[error("Unable to start worker threads: {0}")]
    ThreadPool(String),
}

/// Id of the binary variable activating a candidate reaction
fn activation_id(reaction_id: &str) -> String {
    format!("active:{}", reaction_id)
}

/// Universe reactions that may be added to the draft
pub(crate) fn candidate_reactions<'a>(
    draft: &'a Model,
    universe: &'a Model,
) -> impl Iterator<Item = &'a Reaction> + 'a {
    universe
        .reactions
        .values()
        .filter(move |r| !draft.reactions.contains_key(&r.id) && !r.is_growth())
}

/// Find the cheapest set of universe reactions letting `draft` grow under `constraints`
///
/// # Parameters
/// - `draft`: Model to repair, its growth reaction must reach `options.min_growth`
/// - `universe`: Model holding the candidate reactions
/// - `constraints`: Bounds overriding those of draft and universe reactions (the medium)
/// - `options`: See [`GapFillOptions`]
///
/// # Returns
/// [`GapFillOutcome::Filled`] with the reactions to add, or [`GapFillOutcome::Failed`] when
/// the problem is infeasible or the solver gave up. Solver malfunctions are errors.
pub fn gap_fill(
    draft: &Model,
    universe: &Model,
    constraints: &MediumConstraints,
    options: &GapFillOptions,
) -> Result<GapFillOutcome, GapFillError> {
    let growth = draft
        .growth_reaction()
        .ok_or(GapFillError::NoGrowthReaction)?;
    let overrides = Some(constraints.bounds());
    let mut problem = Problem::new_minimization();

    for reaction in draft.reactions.values() {
        let (lower_bound, upper_bound) = effective_bounds(reaction, overrides);
        problem.add_variable(Variable::continuous(&reaction.id, lower_bound, upper_bound))?;
    }

    let candidates: Vec<&Reaction> = candidate_reactions(draft, universe).collect();
    for reaction in &candidates {
        let (lower_bound, upper_bound) = effective_bounds(reaction, overrides);
        let lower_bound = clamp_infinite(lower_bound, options.big_m);
        let upper_bound = clamp_infinite(upper_bound, options.big_m);
        let active = activation_id(&reaction.id);
        // inactive candidates carry no flux, active ones stay within their own bounds
        problem.add_variable(Variable::continuous(
            &reaction.id,
            lower_bound.min(0.),
            upper_bound.max(0.),
        ))?;
        problem.add_variable(Variable::binary(&active))?;
        problem.add_new_inequality_constraint(
            &format!("gate_upper:{}", reaction.id),
            &[reaction.id.as_str(), active.as_str()],
            &[1., -upper_bound],
            f64::NEG_INFINITY,
            0.,
        )?;
        problem.add_new_inequality_constraint(
            &format!("gate_lower:{}", reaction.id),
            &[reaction.id.as_str(), active.as_str()],
            &[1., -lower_bound],
            0.,
            f64::INFINITY,
        )?;
        let weight = options.penalties.get(&reaction.id).copied().unwrap_or(1.);
        problem.add_new_linear_objective_term(&active, weight)?;
    }

    add_mass_balance(
        &mut problem,
        draft.reactions.values().chain(candidates.iter().copied()),
    )?;
    problem.add_new_inequality_constraint(
        "min_growth",
        &[growth.id.as_str()],
        &[1.],
        options.min_growth,
        f64::INFINITY,
    )?;

    log::debug!(
        "Gap-filling {} draft reactions against {} candidates",
        draft.reactions.len(),
        candidates.len()
    );
    let mut solver = solver_for(options.solver, options.time_limit)?;
    let solution = problem.solve(solver.as_mut())?;

    match solution.status {
        OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {
            let selected: IndexSet<String> = candidates
                .iter()
                .filter(|r| {
                    solution
                        .value(&activation_id(&r.id))
                        .is_some_and(|y| y > 0.5)
                })
                .map(|r| r.id.clone())
                .collect();
            log::debug!("Gap-filling selected {} reactions", selected.len());
            Ok(GapFillOutcome::Filled(selected))
        }
        OptimizationStatus::Infeasible => Ok(GapFillOutcome::Failed(GapFillFailure::Infeasible)),
        OptimizationStatus::SolverHalted => Ok(GapFillOutcome::Failed(GapFillFailure::Halted)),
        OptimizationStatus::Unbounded => Err(GapFillError::Solver(SolverError::Backend(
            "gap-filling problem reported as unbounded".to_string(),
        ))),
        OptimizationStatus::NumericalError => Err(GapFillError::Solver(SolverError::Backend(
            "numerical error while gap-filling".to_string(),
        ))),
    }
}

fn clamp_infinite(bound: f64, big_m: f64) -> f64 {
    if bound.is_infinite() {
        big_m.copysign(bound)
    } else {
        bound
    }
}
