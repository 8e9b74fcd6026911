//! Module providing COBRA JSON IO for Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::io::{Flavor, IoError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, SBO_EXCHANGE, SBO_SINK};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

/// Bounds are optional so infinite bounds survive a round trip as `null`
#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Annotations are kept as a map, anything which isn't a JSON object is dropped
fn annotation_map(value: Option<Value>) -> IndexMap<String, Value> {
    match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => IndexMap::new(),
    }
}

fn annotation_value(annotation: &IndexMap<String, Value>) -> Option<Value> {
    if annotation.is_empty() {
        return None;
    }
    Some(Value::Object(
        annotation
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    ))
}

fn finite(bound: f64) -> Option<f64> {
    bound.is_finite().then_some(bound)
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes,
            annotation: annotation_map(g.annotation),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes,
            annotation: annotation_map(m.annotation),
        }
    }
}

impl From<JsonReaction> for Reaction {
    fn from(r: JsonReaction) -> Self {
        Self {
            id: r.id,
            metabolites: r.metabolites,
            name: r.name,
            gene_reaction_rule: r.gene_reaction_rule,
            lower_bound: r.lower_bound.unwrap_or(f64::NEG_INFINITY),
            upper_bound: r.upper_bound.unwrap_or(f64::INFINITY),
            objective_coefficient: r.objective_coefficient.unwrap_or_default(),
            is_exchange: false,
            is_sink: false,
            subsystem: r.subsystem,
            notes: r.notes,
            annotation: annotation_map(r.annotation),
        }
    }
}

/// Exchange and sink flags of a reaction read from file, as (is_exchange, is_sink)
fn boundary_flags(reaction: &Reaction, model: &Model) -> (bool, bool) {
    match reaction.sbo_term() {
        Some(SBO_EXCHANGE) => (true, false),
        Some(SBO_SINK) => (false, true),
        Some(_) => (false, false),
        None => match reaction.boundary_metabolite() {
            Some((met_id, _)) if !reaction.is_growth() => {
                let extracellular = model
                    .metabolites
                    .get(met_id)
                    .is_some_and(|m| m.is_extracellular());
                (extracellular, !extracellular)
            }
            _ => (false, false),
        },
    }
}

/// Rename the genes of a gene reaction rule, keeping operators and parentheses
fn convert_gene_rule(rule: &str, flavor: Flavor) -> String {
    let mut converted = String::with_capacity(rule.len());
    let mut token = String::new();
    let flush = |token: &mut String, converted: &mut String| {
        if token.is_empty() {
            return;
        }
        match token.as_str() {
            "and" | "or" | "AND" | "OR" => converted.push_str(token),
            gene => converted.push_str(&flavor.convert_id(gene, "G_")),
        }
        token.clear();
    };
    for c in rule.chars() {
        if c.is_whitespace() || c == '(' || c == ')' {
            flush(&mut token, &mut converted);
            converted.push(c);
        } else {
            token.push(c);
        }
    }
    flush(&mut token, &mut converted);
    converted
}
// endregion Conversions

impl Model {
    /// Read a model in COBRA JSON format
    ///
    /// Boundary flags are restored from the `sbo` annotation of each reaction. Reactions
    /// without one are classified by structure: a single metabolite reaction outside the
    /// objective is an exchange when its metabolite is extracellular and a sink otherwise.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
        let path = path.as_ref();
        let model_str = fs::read_to_string(path).map_err(|e| IoError::read(path, e))?;
        let json_model = serde_json::from_str::<JsonModel>(&model_str)
            .map_err(|e| IoError::parse(path, e))?;
        Model::from_json(json_model).map_err(|source| IoError::Model {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a model in COBRA JSON format, rewriting its ids in the requested flavor
    ///
    /// Metabolite, reaction and gene ids, stoichiometries and gene rules are converted, so
    /// models read with the same flavor share one id convention whatever their files use.
    pub fn read_json_as<P: AsRef<Path>>(path: P, flavor: Flavor) -> Result<Model, IoError> {
        let path = path.as_ref();
        let model = Model::read_json(path)?;
        Model::from_json(model.to_json(flavor)).map_err(|source| IoError::Model {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the model in COBRA JSON format, with ids in the requested flavor
    pub fn write_json<P: AsRef<Path>>(&self, path: P, flavor: Flavor) -> Result<(), IoError> {
        let path = path.as_ref();
        let json_model = self.to_json(flavor);
        let model_string =
            serde_json::to_string(&json_model).map_err(|e| IoError::parse(path, e))?;
        fs::write(path, model_string).map_err(|e| IoError::write(path, e))?;
        Ok(())
    }

    fn from_json(json_model: JsonModel) -> Result<Self, ModelError> {
        let mut model = Model {
            id: json_model.id,
            compartments: json_model.compartments,
            version: json_model.version,
            ..Model::default()
        };
        json_model
            .genes
            .into_iter()
            .for_each(|g| model.add_gene(Gene::from(g)));
        json_model
            .metabolites
            .into_iter()
            .for_each(|m| model.add_metabolite(Metabolite::from(m)));
        for rxn in json_model.reactions {
            let mut reaction = Reaction::from(rxn);
            let (is_exchange, is_sink) = boundary_flags(&reaction, &model);
            reaction.is_exchange = is_exchange;
            reaction.is_sink = is_sink;
            model.add_reaction(reaction)?;
        }
        Ok(model)
    }

    fn to_json(&self, flavor: Flavor) -> JsonModel {
        let genes = self
            .genes
            .values()
            .map(|g| JsonGene {
                id: flavor.convert_id(&g.id, "G_"),
                name: g.name.clone(),
                notes: g.notes.clone(),
                annotation: annotation_value(&g.annotation),
            })
            .collect();
        let metabolites = self
            .metabolites
            .values()
            .map(|m| JsonMetabolite {
                id: flavor.convert_id(&m.id, "M_"),
                name: m.name.clone(),
                compartment: m.compartment.clone(),
                charge: Some(m.charge),
                formula: m.formula.clone(),
                notes: m.notes.clone(),
                annotation: annotation_value(&m.annotation),
            })
            .collect();
        let reactions = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: flavor.convert_id(&r.id, "R_"),
                name: r.name.clone(),
                metabolites: r
                    .metabolites
                    .iter()
                    .map(|(m, c)| (flavor.convert_id(m, "M_"), *c))
                    .collect(),
                lower_bound: finite(r.lower_bound),
                upper_bound: finite(r.upper_bound),
                gene_reaction_rule: convert_gene_rule(&r.gene_reaction_rule, flavor),
                objective_coefficient: r.is_growth().then_some(r.objective_coefficient),
                subsystem: r.subsystem.clone(),
                notes: r.notes.clone(),
                annotation: annotation_value(&r.annotation),
            })
            .collect();

        JsonModel {
            metabolites,
            reactions,
            genes,
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }
}

#[cfg(test)]
mod json_tests {
    use super::*;
    use crate::metabolic_model::gene::GeneBuilder;
    use crate::reconstruction::GAPFILL_PROVENANCE_KEY;
    use std::path::PathBuf;

    fn test_model_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join(name)
    }

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{"original_bigg_ids":["glc_D_e"]},
"annotation":{
"bigg.metabolite":["glc__D"],
"kegg.compound":["C00031"],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        let met = Metabolite::from(met);
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.name.unwrap(), "D-Glucose");
        assert_eq!(met.compartment.unwrap(), "e");
        assert_eq!(met.charge, 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
        assert_eq!(met.annotation["sbo"], Value::String("SBO:0000247".to_string()));
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{"adp_c":1.0,"atp_c":-1.0,"f6p_c":-1.0,"fdp_c":1.0,"h_c":1.0},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis",
"annotation":{"ec-code":["2.7.1.11"],"sbo":"SBO:0000176"}
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        let reaction = Reaction::from(reaction);
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.metabolites.len(), 5);
        assert_eq!(reaction.metabolites["atp_c"], -1.);
        assert_eq!(reaction.lower_bound, 0.);
        assert_eq!(reaction.upper_bound, 1000.);
        assert_eq!(reaction.gene_reaction_rule, "b3916 or b1723");
        assert_eq!(reaction.objective_coefficient, 0.);
        assert_eq!(reaction.sbo_term(), Some("SBO:0000176"));
    }

    #[test]
    fn null_bounds_are_infinite() {
        let data = r#"{"id":"R","metabolites":{},"lower_bound":null,"upper_bound":null}"#;
        let reaction = Reaction::from(serde_json::from_str::<JsonReaction>(data).unwrap());
        assert_eq!(reaction.lower_bound, f64::NEG_INFINITY);
        assert_eq!(reaction.upper_bound, f64::INFINITY);
    }

    #[test]
    fn gene_rules_follow_flavor() {
        assert_eq!(
            convert_gene_rule("(b3916 or b1723) and G_b0001", Flavor::Cobra),
            "(b3916 or b1723) and b0001"
        );
        assert_eq!(
            convert_gene_rule("(b3916 or b1723) and G_b0001", Flavor::Fbc2),
            "(G_b3916 or G_b1723) and G_b0001"
        );
        assert_eq!(convert_gene_rule("", Flavor::Fbc2), "");
    }

    #[test]
    fn read_json() {
        let model = Model::read_json(test_model_path("toy_draft.json")).unwrap();
        assert_eq!(model.id.as_deref(), Some("toy_draft"));
        assert_eq!(model.metabolites.len(), 4);
        assert_eq!(model.reactions.len(), 4);
        assert_eq!(model.genes.len(), 2);
        // flagged through the sbo annotation
        assert!(model.reactions["EX_glc__D_e"].is_exchange);
        // flagged by structure
        assert!(model.reactions["EX_o2_e"].is_exchange);
        assert!(!model.reactions["EX_o2_e"].is_sink);
        assert_eq!(model.growth_reaction().unwrap().id, "Growth");
        assert!(!model.reactions["Growth"].is_sink);
        assert_eq!(model.reactions["GLCt"].gene_reaction_rule, "b1101 or b2417");
    }

    #[test]
    fn read_errors_carry_path() {
        let missing = test_model_path("does_not_exist.json");
        match Model::read_json(&missing) {
            Err(IoError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result {:?}", other),
        }
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"metabolites\": [").unwrap();
        assert!(matches!(
            Model::read_json(&broken),
            Err(IoError::Parse { .. })
        ));
    }

    #[test]
    fn missing_metabolites_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inconsistent.json");
        fs::write(
            &path,
            r#"{"metabolites":[],"reactions":[{"id":"R","metabolites":{"a_c":-1},"lower_bound":0,"upper_bound":1}]}"#,
        )
        .unwrap();
        match Model::read_json(&path) {
            Err(IoError::Model { path: p, source }) => {
                assert_eq!(p, path);
                assert!(matches!(source, ModelError::MissingMetabolites { .. }));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn read_in_flavor() {
        let model = Model::read_json_as(test_model_path("toy_draft.json"), Flavor::Fbc2).unwrap();
        assert!(model.uses_sbml_prefixes());
        assert_eq!(model.growth_reaction().unwrap().id, "R_Growth");
        assert_eq!(model.reactions["R_GLCt"].gene_reaction_rule, "G_b1101 or G_b2417");
        assert!(model.genes.contains_key("G_b2417"));
        assert!(model.reactions["R_EX_o2_e"].is_exchange);

        let bare = Model::read_json_as(test_model_path("toy_draft.json"), Flavor::Cobra).unwrap();
        assert!(!bare.uses_sbml_prefixes());
        assert!(bare.reactions.contains_key("GLCt"));
    }

    #[test]
    fn write_fbc2_then_cobra() {
        let mut model = Model::read_json(test_model_path("toy_draft.json")).unwrap();
        model.add_gene(GeneBuilder::default().id("b9999").name("extra").build().unwrap());
        model.reactions["GLCt"].annotation.insert(
            GAPFILL_PROVENANCE_KEY.to_string(),
            serde_json::json!(["M9"]),
        );
        model.reactions["EX_o2_e"].lower_bound = f64::NEG_INFINITY;

        let dir = tempfile::tempdir().unwrap();
        let fbc2_path = dir.path().join("fbc2.json");
        model.write_json(&fbc2_path, Flavor::Fbc2).unwrap();
        let prefixed = Model::read_json(&fbc2_path).unwrap();
        assert!(prefixed.uses_sbml_prefixes());
        assert!(prefixed.reactions.contains_key("R_EX_glc__D_e"));
        assert!(prefixed.genes.contains_key("G_b9999"));
        let transport = &prefixed.reactions["R_GLCt"];
        assert_eq!(transport.metabolites["M_glc__D_e"], -1.);
        assert_eq!(transport.gene_reaction_rule, "G_b1101 or G_b2417");
        assert_eq!(transport.annotation[GAPFILL_PROVENANCE_KEY], serde_json::json!(["M9"]));
        assert_eq!(prefixed.reactions["R_EX_o2_e"].lower_bound, f64::NEG_INFINITY);
        assert!(prefixed.reactions["R_EX_o2_e"].is_exchange);

        let cobra_path = dir.path().join("cobra.json");
        prefixed.write_json(&cobra_path, Flavor::Cobra).unwrap();
        let bare = Model::read_json(&cobra_path).unwrap();
        assert_eq!(
            bare.reactions.keys().collect::<Vec<_>>(),
            model.reactions.keys().collect::<Vec<_>>()
        );
        assert_eq!(bare.growth_reaction().unwrap().id, "Growth");
        assert_eq!(bare.reactions["GLCt"].gene_reaction_rule, "b1101 or b2417");
    }
}
