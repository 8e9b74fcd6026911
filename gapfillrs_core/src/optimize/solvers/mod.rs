//! Solver backends able to solve a [`Problem`]
use crate::configuration::Solver as SolverKind;
use crate::optimize::problem::{Problem, ProblemType};
use crate::optimize::ProblemSolution;
use thiserror::Error;

pub mod clarabel;
#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "minilp")]
pub mod microlp;

/// Interface every optimization backend implements
pub trait Solver {
    /// Name of the backend, used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether the backend handles integer and binary variables
    fn integer_variable_capable(&self) -> bool;

    /// Solve the problem
    ///
    /// Infeasibility, unboundedness and time limits are reported through the status of the
    /// returned [`ProblemSolution`], an `Err` means the backend itself failed.
    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create a solver of the requested kind
///
/// # Parameters
/// - `kind`: Which backend to create
/// - `time_limit`: Optional time limit in seconds, honoured by backends which support one
pub fn solver_for(kind: SolverKind, time_limit: Option<f64>) -> Result<Box<dyn Solver>, SolverError> {
    match kind {
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::new(time_limit))),
        SolverKind::Microlp => microlp_solver(),
        SolverKind::Highs => highs_solver(time_limit),
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Ok(Box::new(microlp::MicrolpSolver::new()))
        }
    } else {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Err(SolverError::Unavailable("microlp (enable the `minilp` feature)".to_string()))
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "highs")] {
        fn highs_solver(time_limit: Option<f64>) -> Result<Box<dyn Solver>, SolverError> {
            Ok(Box::new(highs::HighsSolver::new(time_limit)))
        }
    } else {
        fn highs_solver(_time_limit: Option<f64>) -> Result<Box<dyn Solver>, SolverError> {
            Err(SolverError::Unavailable("HiGHS (enable the `highs` feature)".to_string()))
        }
    }
}

/// Errors raised by the solver backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The backend was not compiled in
    #[error("Solver {0} is not available")]
    Unavailable(String),
    /// The problem has variable types the backend can't handle
    #[error("Solver {solver} can't solve {problem_type:?} problems")]
    UnsupportedProblemType {
        solver: String,
        problem_type: ProblemType,
    },
    /// The problem could not be translated for the backend
    #[error("Malformed problem: {0}")]
    MalformedProblem(String),
    /// The backend reported an internal failure
    #[error("Solver backend failed: {0}")]
    Backend(String),
}
