//! Implements a solver interface for Clarabel
//!
//! Clarabel solves conic problems of the form
//! minimize q'x subject to Ax + s = b, s in K. Equality constraints are placed in the
//! zero cone, inequality constraints and finite variable bounds in the nonnegative cone.
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemType};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use nalgebra_sparse::CooMatrix;

/// Interior point solver for continuous problems
#[derive(Debug, Default, Clone)]
pub struct ClarabelSolver {
    time_limit: Option<f64>,
}

impl ClarabelSolver {
    pub fn new(time_limit: Option<f64>) -> Self {
        Self { time_limit }
    }
}

/// Rows of the constraint matrix, collected before being assembled
#[derive(Default)]
struct ConeRows {
    /// (row entries, rhs) for rows in the zero cone
    equalities: Vec<(Vec<(usize, f64)>, f64)>,
    /// (row entries, rhs) for rows in the nonnegative cone
    inequalities: Vec<(Vec<(usize, f64)>, f64)>,
}

impl ConeRows {
    fn from_problem(problem: &Problem) -> Result<Self, SolverError> {
        let mut rows = ConeRows::default();
        for (id, constraint) in problem.constraints() {
            let mut entries = Vec::with_capacity(constraint.terms().len());
            for term in constraint.terms() {
                let index = problem.variable_index(&term.variable).ok_or_else(|| {
                    SolverError::MalformedProblem(format!(
                        "constraint {} references unknown variable {}",
                        id, term.variable
                    ))
                })?;
                entries.push((index, term.coefficient));
            }
            let (lower_bound, upper_bound) = constraint.range();
            rows.push_range(entries, lower_bound, upper_bound);
        }
        for (index, variable) in problem.variables().values().enumerate() {
            rows.push_range(vec![(index, 1.)], variable.lower_bound, variable.upper_bound);
        }
        Ok(rows)
    }

    /// lower <= a'x <= upper, infinite sides are skipped
    fn push_range(&mut self, entries: Vec<(usize, f64)>, lower_bound: f64, upper_bound: f64) {
        if lower_bound == upper_bound {
            self.equalities.push((entries, upper_bound));
            return;
        }
        if lower_bound.is_finite() {
            let negated = entries.iter().map(|(i, c)| (*i, -c)).collect();
            self.inequalities.push((negated, -lower_bound));
        }
        if upper_bound.is_finite() {
            self.inequalities.push((entries, upper_bound));
        }
    }

    /// Assemble A and b, zero cone rows first
    fn assemble(self, n_variables: usize) -> (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>) {
        let n_equalities = self.equalities.len();
        let n_inequalities = self.inequalities.len();
        let mut coo = CooMatrix::new(n_equalities + n_inequalities, n_variables);
        let mut b = Vec::with_capacity(n_equalities + n_inequalities);
        for (row, (entries, rhs)) in self
            .equalities
            .into_iter()
            .chain(self.inequalities)
            .enumerate()
        {
            for (col, coef) in entries {
                coo.push(row, col, coef);
            }
            b.push(rhs);
        }
        let csc = nalgebra_sparse::CscMatrix::from(&coo);
        let a = CscMatrix::new(
            csc.nrows(),
            csc.ncols(),
            csc.col_offsets().to_vec(),
            csc.row_indices().to_vec(),
            csc.values().to_vec(),
        );
        let mut cones = Vec::new();
        if n_equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_equalities));
        }
        if n_inequalities > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(n_inequalities));
        }
        (a, b, cones)
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn integer_variable_capable(&self) -> bool {
        false
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        if problem.has_integer_variables() {
            return Err(SolverError::UnsupportedProblemType {
                solver: self.name().to_string(),
                problem_type: ProblemType::LinearMixedInteger,
            });
        }
        let n = problem.variables().len();
        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };
        let q: Vec<f64> = problem
            .variables()
            .keys()
            .map(|id| sign * problem.objective().coefficient(id))
            .collect();
        let p = CscMatrix::<f64>::zeros((n, n));
        let (a, b, cones) = ConeRows::from_problem(problem)?.assemble(n);

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .time_limit(self.time_limit.unwrap_or(f64::INFINITY))
            .build()
            .map_err(|e| SolverError::Backend(e.to_string()))?;
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        };
        if !matches!(
            status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        ) {
            return Ok(ProblemSolution::without_values(status));
        }
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solver.solution.x.iter().copied())
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective().evaluate(&variable_values)),
            variable_values: Some(variable_values),
        })
    }
}
