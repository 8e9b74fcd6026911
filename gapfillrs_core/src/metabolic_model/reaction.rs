//! This module provides a struct for representing reactions
use crate::configuration::CONFIGURATION;
use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

/// Annotation key holding the systems biology ontology term of a reaction
pub const SBO_KEY: &str = "sbo";
/// SBO term for exchange reactions
pub const SBO_EXCHANGE: &str = "SBO:0000627";
/// SBO term for sink reactions
pub const SBO_SINK: &str = "SBO:0000632";
/// SBO term for biomass production
pub const SBO_BIOMASS: &str = "SBO:0000629";
/// SBO term for the non growth associated ATP maintenance reaction
pub const SBO_ATP_MAINTENANCE: &str = "SBO:0000630";

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None", setter(into, strip_option))]
    pub name: Option<String>,
    /// Gene protein reaction rule, kept as written in the source model
    #[builder(default = "String::new()", setter(into))]
    pub gene_reaction_rule: String,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().map(|c| c.lower_bound).unwrap_or(-1000.)")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().map(|c| c.upper_bound).unwrap_or(1000.)")]
    pub upper_bound: f64,
    /// Weight of this reaction in the growth objective
    #[builder(default = "0.")]
    pub objective_coefficient: f64,
    /// Boundary reaction exchanging an extracellular metabolite with the environment
    #[builder(default = "false")]
    pub is_exchange: bool,
    /// Boundary reaction draining an internal metabolite
    #[builder(default = "false")]
    pub is_sink: bool,
    /// Reaction subsystem
    #[builder(default = "None", setter(into, strip_option))]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<Value>,
    /// Reaction Annotations
    #[builder(default = "IndexMap::new()")]
    pub annotation: IndexMap<String, Value>,
}

impl Reaction {
    /// A reaction is reversible when its bounds allow flux in both directions
    pub fn reversible(&self) -> bool {
        self.lower_bound < 0. && self.upper_bound > 0.
    }

    /// Whether this reaction touches a single metabolite
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// Whether this reaction is (part of) the growth objective
    pub fn is_growth(&self) -> bool {
        self.objective_coefficient != 0.
    }

    /// The metabolite crossing the boundary, for boundary reactions
    pub fn boundary_metabolite(&self) -> Option<(&str, f64)> {
        if !self.is_boundary() {
            return None;
        }
        self.metabolites
            .first()
            .map(|(met, coef)| (met.as_str(), *coef))
    }

    /// SBO term stored in the annotation, if any
    pub fn sbo_term(&self) -> Option<&str> {
        self.annotation.get(SBO_KEY).and_then(|v| v.as_str())
    }

    /// Store an SBO term in the annotation
    pub fn set_sbo_term(&mut self, term: &str) {
        self.annotation
            .insert(SBO_KEY.to_string(), Value::String(term.to_string()));
    }
}
