//! Provides struct representing an optimization problem
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::{Variable, VariableBuilder, VariableType};
use crate::optimize::ProblemSolution;
use indexmap::IndexMap;
use thiserror::Error;

/// An optimization problem with a linear objective and linear constraints
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Type of problem
    problem_type: ProblemType,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            problem_type: ProblemType::LinearContinuous,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        if variable.variable_type != VariableType::Continuous {
            self.problem_type = ProblemType::LinearMixedInteger;
        }
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        name: Option<&str>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let mut builder = VariableBuilder::default();
        builder
            .id(id)
            .variable_type(variable_type)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound);
        if let Some(name) = name {
            builder.name(name);
        }
        let variable = builder
            .build()
            .map_err(|e| ProblemError::InvalidVariable(e.to_string()))?;
        self.add_variable(variable)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, id: &str, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(id, &constraint)?;
        self.constraints.insert(id.to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(id, Constraint::new_equality(variables, coefficients, equals))
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(
            id,
            Constraint::new_inequality(variables, coefficients, lower_bound, upper_bound),
        )
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains_key(variable_id) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective.add_linear_term(variable_id, coefficient);
        Ok(())
    }
    // endregion Adding Objective Terms

    // region Accessors
    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn problem_type(&self) -> &ProblemType {
        &self.problem_type
    }

    /// Position of a variable, solvers use this to map ids to columns
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }
    // endregion Accessors

    // region Solving
    /// Solve the problem with the given solver
    pub fn solve(&self, solver: &mut dyn Solver) -> Result<ProblemSolution, SolverError> {
        if self.has_integer_variables() && !solver.integer_variable_capable() {
            return Err(SolverError::UnsupportedProblemType {
                solver: solver.name().to_string(),
                problem_type: self.problem_type.clone(),
            });
        }
        log::debug!(
            "Solving {:?} problem with {} variables and {} constraints using {}",
            self.problem_type,
            self.variables.len(),
            self.constraints.len(),
            solver.name()
        );
        solver.solve(self)
    }
    // endregion Solving

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        };
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, id: &str, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        let (lower_bound, upper_bound) = constraint.range();
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        if constraint
            .terms()
            .iter()
            .any(|t| !self.variables.contains_key(&t.variable))
        {
            return Err(ProblemError::NonExistentVariablesInConstraint);
        }
        Ok(())
    }
    // endregion Validation Functions

    // region Check Problem
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|v| v.variable_type != VariableType::Continuous)
    }
    // endregion Check Problem
}

/// Types of optimization problems
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemType {
    /// Problem with linear objectives and constraints, and continuous variables
    LinearContinuous,
    /// Problem with linear objective and constraints, with integer and continuous variables
    LinearMixedInteger,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when the variable builder is missing required fields
    #[error("Unable to build variable: {0}")]
    InvalidVariable(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the model")]
    NonExistentVariablesInObjective,
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn new_problem() {
        let max_problem = Problem::new_maximization();
        assert_eq!(max_problem.objective.sense(), ObjectiveSense::Maximize);

        let min_problem = Problem::new_minimization();
        assert_eq!(min_problem.objective.sense(), ObjectiveSense::Minimize);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        problem
            .add_new_variable("x", None, VariableType::Continuous, 64., 100.)
            .unwrap();
        let var = problem.variables.get("x").unwrap();
        assert_eq!(var.variable_type, VariableType::Continuous);
        assert_eq!(problem.variable_index("x"), Some(0));
        assert!((var.lower_bound - 64.0).abs() < 1e-25);
        assert!((var.upper_bound - 100.0).abs() < 1e-25);
        assert_eq!(problem.problem_type, ProblemType::LinearContinuous);

        // Adding a binary variable makes this a mixed integer problem
        problem.add_variable(Variable::binary("y")).unwrap();
        assert_eq!(problem.variable_index("y"), Some(1));
        assert_eq!(problem.problem_type, ProblemType::LinearMixedInteger);
        assert!(problem.has_integer_variables());
    }

    #[test]
    fn add_bad_variable() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        let res = problem.add_new_variable("x", None, VariableType::Continuous, 100., 64.);
        assert_eq!(res, Err(ProblemError::InvalidVariableBounds));

        problem
            .add_new_variable("x", Some("flux"), VariableType::Continuous, 0., 64.)
            .unwrap();
        let res = problem.add_new_variable("x", None, VariableType::Continuous, 0., 64.);
        assert_eq!(res, Err(ProblemError::VariableIdAlreadyExists));
    }

    #[test]
    fn add_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_variable(Variable::continuous("x", 64., 100.)).unwrap();
        problem.add_variable(Variable::continuous("y", 64., 100.)).unwrap();

        problem
            .add_new_equality_constraint("eq", &["x", "y"], &[2., 3.], 200.)
            .unwrap();
        match problem.constraints.get("eq").unwrap() {
            Constraint::Equality { equals, .. } => assert!((equals - 200.).abs() < 1e-25),
            Constraint::Inequality { .. } => panic!("Incorrect constraint type added"),
        }

        problem
            .add_new_inequality_constraint("ineq", &["x", "y"], &[2., 3.], 100., 200.)
            .unwrap();
        assert_eq!(problem.constraints.get("ineq").unwrap().range(), (100., 200.));

        let res = problem.add_new_equality_constraint("eq", &["x"], &[1.], 1.);
        assert_eq!(res, Err(ProblemError::ConstraintAlreadyExists));
    }

    #[test]
    fn add_bad_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_variable(Variable::continuous("x", 64., 100.)).unwrap();

        let res = problem.add_new_inequality_constraint("bad", &["x"], &[2.], 200., 100.);
        assert_eq!(res, Err(ProblemError::InvalidConstraintBounds));

        let res = problem.add_new_equality_constraint("missing", &["x", "z"], &[1., 1.], 0.);
        assert_eq!(res, Err(ProblemError::NonExistentVariablesInConstraint));
    }
}
