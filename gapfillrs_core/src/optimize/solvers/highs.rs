//! Implements a solver interface for HiGHS
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, ProblemSolution};
use highs::{HighsModelStatus, RowProblem, Sense};
use indexmap::IndexMap;

/// Solver backed by HiGHS, handles continuous and mixed integer problems
#[derive(Debug, Default, Clone)]
pub struct HighsSolver {
    time_limit: Option<f64>,
}

impl HighsSolver {
    pub fn new(time_limit: Option<f64>) -> Self {
        Self { time_limit }
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn integer_variable_capable(&self) -> bool {
        true
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let mut native = RowProblem::default();
        let mut columns = Vec::with_capacity(problem.variables().len());
        for (id, variable) in problem.variables() {
            let cost = problem.objective().coefficient(id);
            let column = match variable.variable_type {
                VariableType::Continuous => {
                    native.add_column(cost, variable.lower_bound..=variable.upper_bound)
                }
                VariableType::Binary => native.add_integer_column(cost, 0.0..=1.0),
                VariableType::Integer => native
                    .add_integer_column(cost, variable.lower_bound..=variable.upper_bound),
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
            native.add_row(lower_bound..=upper_bound, terms);
        }

        let sense = match problem.objective().sense() {
            ObjectiveSense::Minimize => Sense::Minimise,
            ObjectiveSense::Maximize => Sense::Maximise,
        };
        let mut model = native.optimise(sense);
        model.set_option("output_flag", false);
        if let Some(limit) = self.time_limit {
            model.set_option("time_limit", limit);
        }
        let solved = model.solve();

        let status = match solved.status() {
            HighsModelStatus::Optimal => OptimizationStatus::Optimal,
            HighsModelStatus::Infeasible => OptimizationStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                OptimizationStatus::Unbounded
            }
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                OptimizationStatus::SolverHalted
            }
            HighsModelStatus::ModelEmpty => OptimizationStatus::Optimal,
            other => return Err(SolverError::Backend(format!("{:?}", other))),
        };
        if status != OptimizationStatus::Optimal {
            return Ok(ProblemSolution::without_values(status));
        }
        let solution = solved.get_solution();
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solution.columns().iter().copied())
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective().evaluate(&variable_values)),
            variable_values: Some(variable_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::variable::Variable;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mixed_integer_program() {
        let mut problem = Problem::new_minimization();
        problem.add_variable(Variable::continuous("v", 0., 10.)).unwrap();
        problem.add_variable(Variable::binary("y")).unwrap();
        problem
            .add_new_inequality_constraint("gate", &["v", "y"], &[1., -10.], f64::NEG_INFINITY, 0.)
            .unwrap();
        problem
            .add_new_inequality_constraint("demand", &["v"], &[1.], 1., f64::INFINITY)
            .unwrap();
        problem.add_new_linear_objective_term("y", 1.).unwrap();
        let solution = problem.solve(&mut HighsSolver::new(None)).unwrap();
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 1., epsilon = 1e-6);
    }
}
