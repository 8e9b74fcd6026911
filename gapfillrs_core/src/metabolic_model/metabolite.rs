//! This module provides the metabolite struct representing a metabolite

use std::hash::Hash;

use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

use crate::configuration::CONFIGURATION;

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique), includes the compartment suffix
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None", setter(into, strip_option))]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None", setter(into, strip_option))]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite, alternatives separated by `;`
    #[builder(default = "None", setter(into, strip_option))]
    pub formula: Option<String>,
    /// Notes about the metabolite
    #[builder(default = "None")]
    pub notes: Option<Value>,
    /// Metabolite annotations
    #[builder(default = "IndexMap::new()")]
    pub annotation: IndexMap<String, Value>,
}

impl Metabolite {
    /// Create a metabolite with only an id
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: 0,
            formula: None,
            notes: None,
            annotation: IndexMap::new(),
        }
    }

    /// Whether this metabolite lives in the extracellular compartment
    ///
    /// The compartment field wins when present, otherwise the `_<compartment>` id suffix is used.
    pub fn is_extracellular(&self) -> bool {
        let extracellular = CONFIGURATION
            .read()
            .map(|c| c.extracellular_compartment.clone())
            .unwrap_or_else(|_| "e".to_string());
        match &self.compartment {
            Some(compartment) => *compartment == extracellular,
            None => self.id.ends_with(&format!("_{}", extracellular)),
        }
    }

    /// Identifier used to name this metabolite in media, i.e. the id without the SBML `M_`
    /// prefix and without the compartment suffix
    pub fn compound_key(&self) -> &str {
        let id = self.id.strip_prefix("M_").unwrap_or(&self.id);
        let suffix = match &self.compartment {
            Some(c) => format!("_{}", c),
            None => "_e".to_string(),
        };
        id.strip_suffix(suffix.as_str()).unwrap_or(id)
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        if let Some(ref compartment) = self.compartment {
            compartment.hash(state)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracellular_from_suffix() {
        assert!(Metabolite::new("glc__D_e").is_extracellular());
        assert!(Metabolite::new("M_glc__D_e").is_extracellular());
        assert!(!Metabolite::new("glc__D_c").is_extracellular());
    }

    #[test]
    fn extracellular_from_compartment() {
        let met = MetaboliteBuilder::default()
            .id("glucose_out")
            .compartment("e")
            .build()
            .unwrap();
        assert!(met.is_extracellular());
        let met = MetaboliteBuilder::default()
            .id("glc__D_e")
            .compartment("c")
            .build()
            .unwrap();
        assert!(!met.is_extracellular());
    }

    #[test]
    fn compound_key() {
        assert_eq!(Metabolite::new("M_glc__D_e").compound_key(), "glc__D");
        assert_eq!(Metabolite::new("o2_e").compound_key(), "o2");
        let met = MetaboliteBuilder::default()
            .id("nh4_p")
            .compartment("p")
            .build()
            .unwrap();
        assert_eq!(met.compound_key(), "nh4");
    }
}
