//! Provides struct for representing an optimization problem's objective

use indexmap::IndexMap;

/// Represents the linear Objective of an optimization problem
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients of the variables in the objective, keyed by variable id
    pub(crate) terms: IndexMap<String, f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub(crate) sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: IndexMap::new(),
            sense,
        }
    }

    /// Sense of the objective
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Add a new Linear term to the objective, adding to the coefficient if the variable
    /// already appears
    pub fn add_linear_term(&mut self, variable_id: &str, coefficient: f64) {
        *self.terms.entry(variable_id.to_string()).or_insert(0.) += coefficient;
    }

    /// Coefficient of a variable (0 when absent)
    pub fn coefficient(&self, variable_id: &str) -> f64 {
        self.terms.get(variable_id).copied().unwrap_or(0.)
    }

    /// Evaluate the objective at the given variable values
    pub fn evaluate(&self, values: &IndexMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v).copied().unwrap_or(0.))
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}
