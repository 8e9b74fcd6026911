//! Flux balance analysis: maximize the growth objective subject to steady state
use crate::flux_analysis::{add_mass_balance, effective_bounds};
use crate::metabolic_model::model::Model;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::OptimizationStatus;
use crate::reconstruction::medium::MediumConstraints;
use indexmap::IndexMap;
use nalgebra::DVector;
use thiserror::Error;

/// Result of a flux balance analysis
#[derive(Debug, Clone)]
pub struct FluxSolution {
    /// Status reported by the solver
    pub status: OptimizationStatus,
    /// Optimal value of the objective, None if the problem couldn't be solved
    pub objective_value: Option<f64>,
    /// Flux through every reaction, keyed by reaction id (empty if the problem couldn't be solved)
    pub fluxes: IndexMap<String, f64>,
}

impl FluxSolution {
    /// Whether fluxes are available
    pub fn is_optimal(&self) -> bool {
        matches!(
            self.status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        )
    }

    /// Flux through a reaction, 0 for reactions without a value
    pub fn flux(&self, reaction_id: &str) -> f64 {
        self.fluxes.get(reaction_id).copied().unwrap_or(0.)
    }

    /// Largest absolute violation of steady state, `|S·v|∞`
    pub fn max_imbalance(&self, model: &Model) -> f64 {
        let (matrix, _, reactions) = model.stoichiometric_matrix();
        let v = DVector::from_iterator(reactions.len(), reactions.iter().map(|r| self.flux(r)));
        let mut product = DVector::<f64>::zeros(matrix.nrows());
        for (col, column) in matrix.col_iter().enumerate() {
            for (row, coef) in column.row_indices().iter().zip(column.values()) {
                product[*row] += coef * v[col];
            }
        }
        product.amax()
    }
}

/// Errors that prevent a flux balance analysis from running
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FbaError {
    /// No reaction carries an objective coefficient
    #[error("Model has no objective reaction")]
    NoObjective,
    /// The problem could not be built
    #[error("Unable to build flux balance problem: {0}")]
    Problem(#[from] ProblemError),
    /// The solver failed
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Maximize the objective of `model` under steady state
///
/// # Parameters
/// - `model`: Model to analyse, reactions with a non-zero objective coefficient form the objective
/// - `constraints`: Optional bounds overriding those of the model (e.g. a medium)
/// - `solver`: Backend used to solve the linear program
///
/// # Returns
/// A [`FluxSolution`], infeasibility is reported through its status
pub fn fba(
    model: &Model,
    constraints: Option<&MediumConstraints>,
    solver: &mut dyn Solver,
) -> Result<FluxSolution, FbaError> {
    if model.growth_reaction().is_none() {
        return Err(FbaError::NoObjective);
    }
    let overrides = constraints.map(|c| c.bounds());
    let mut problem = Problem::new_maximization();
    for reaction in model.reactions.values() {
        let (lower_bound, upper_bound) = effective_bounds(reaction, overrides);
        problem.add_variable(Variable::continuous(&reaction.id, lower_bound, upper_bound))?;
        if reaction.is_growth() {
            problem.add_new_linear_objective_term(&reaction.id, reaction.objective_coefficient)?;
        }
    }
    add_mass_balance(&mut problem, model.reactions.values())?;

    let solution = problem.solve(solver)?;
    log::debug!(
        "FBA finished with status {:?}, objective {:?}",
        solution.status,
        solution.objective_value
    );
    Ok(FluxSolution {
        status: solution.status,
        objective_value: solution.objective_value,
        fluxes: solution.variable_values.unwrap_or_default(),
    })
}
