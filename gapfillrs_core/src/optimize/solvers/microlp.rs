//! Implements a solver interface for microlp, a pure rust simplex and branch and bound solver
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, ProblemSolution};
use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection};

/// Solver backed by microlp
///
/// Handles continuous, integer and binary variables. Since it is a simplex solver the
/// solutions it returns are vertices of the feasible polytope.
#[derive(Debug, Default, Clone)]
pub struct MicrolpSolver {}

impl MicrolpSolver {
    pub fn new() -> Self {
        Self {}
    }

    /// Translate the problem into a microlp problem, returning it along with the
    /// microlp variables in the same order as the problem's variables
    fn build(problem: &Problem) -> Result<(microlp::Problem, Vec<microlp::Variable>), SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut native = microlp::Problem::new(direction);
        let mut columns = Vec::with_capacity(problem.variables().len());
        for (id, variable) in problem.variables() {
            let cost = problem.objective().coefficient(id);
            let column = match variable.variable_type {
                VariableType::Continuous => {
                    native.add_var(cost, (variable.lower_bound, variable.upper_bound))
                }
                VariableType::Binary => native.add_integer_var(cost, (0, 1)),
                VariableType::Integer => native.add_integer_var(
                    cost,
                    (
                        integer_bound(id, variable.lower_bound)?,
                        integer_bound(id, variable.upper_bound)?,
                    ),
                ),
            };
            columns.push(column);
        }

        for (id, constraint) in problem.constraints() {
            let mut terms = Vec::with_capacity(constraint.terms().len());
            for term in constraint.terms() {
                let index = problem.variable_index(&term.variable).ok_or_else(|| {
                    SolverError::MalformedProblem(format!(
                        "constraint {} references unknown variable {}",
                        id, term.variable
                    ))
                })?;
                terms.push((columns[index], term.coefficient));
            }
            let (lower_bound, upper_bound) = constraint.range();
            if lower_bound == upper_bound {
                native.add_constraint(&terms[..], ComparisonOp::Eq, lower_bound);
                continue;
            }
            if lower_bound.is_finite() {
                native.add_constraint(&terms[..], ComparisonOp::Ge, lower_bound);
            }
            if upper_bound.is_finite() {
                native.add_constraint(&terms[..], ComparisonOp::Le, upper_bound);
            }
        }
        Ok((native, columns))
    }
}

/// Integer variables in microlp take i32 bounds, infinite bounds are clamped to the i32 range
fn integer_bound(id: &str, bound: f64) -> Result<i32, SolverError> {
    if bound.is_nan() {
        return Err(SolverError::MalformedProblem(format!(
            "integer variable {} has a NaN bound",
            id
        )));
    }
    Ok(bound.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn integer_variable_capable(&self) -> bool {
        true
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let (native, columns) = Self::build(problem)?;
        match native.solve() {
            Ok(solution) => {
                let variable_values: IndexMap<String, f64> = problem
                    .variables()
                    .keys()
                    .zip(columns.iter())
                    .map(|(id, column)| (id.clone(), solution[*column]))
                    .collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective()),
                    variable_values: Some(variable_values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Unbounded))
            }
            Err(err) => Err(SolverError::Backend(err.to_string())),
        }
    }
}
