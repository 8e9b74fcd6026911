//! Process wide defaults used when building models and solving gap-filling problems
use std::path::PathBuf;
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug)]
pub struct Configuration {
    /// Default lower flux bound for new reactions
    pub lower_bound: f64,
    /// Default upper flux bound for new reactions
    pub upper_bound: f64,
    /// Absolute tolerance used when reading values back from a solver
    pub tolerance: f64,
    /// Solver used for purely continuous problems (flux balance analysis)
    pub lp_solver: Solver,
    /// Solver used for problems with binary variables (gap-filling)
    pub milp_solver: Solver,
    /// Number of worker threads used when media are gap-filled independently
    pub processes: u32,
    /// Maximum uptake rate of each compound in a medium
    pub max_uptake: f64,
    /// Minimum growth flux for a model to be considered growing
    pub min_growth: f64,
    /// Magnitude substituted for unbounded fluxes in indicator constraints
    pub big_m: f64,
    /// Time limit (in seconds) for a single solve, None for no limit
    pub time_limit: Option<f64>,
    /// Compartment id marking extracellular metabolites
    pub extracellular_compartment: String,
    /// Directory holding the prebuilt universes and the media library
    pub data_dir: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            lp_solver: Solver::default_milp(),
            milp_solver: Solver::default_milp(),
            processes: 1,
            max_uptake: 10.,
            min_growth: 0.1,
            big_m: 1000.,
            time_limit: None,
            extracellular_compartment: "e".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Configuration {
    /// Path of a prebuilt universe, `<data_dir>/universe_<name>.json`
    pub fn universe_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("universe_{}.json", name))
    }

    /// Path of the universe used when none is requested
    pub fn default_universe_path(&self) -> PathBuf {
        self.universe_path("bacteria")
    }

    /// Path of the bundled media library
    pub fn media_library_path(&self) -> PathBuf {
        self.data_dir.join("media_db.tsv")
    }
}

/// Enum used to specify which solver backend to use
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the Clarabel interior point solver, continuous problems only
    Clarabel,
    /// Use the pure rust microlp simplex/branch and bound solver, requires the minilp feature
    Microlp,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
}

impl Solver {
    /// Mixed integer capable solver picked from the enabled features, HiGHS preferred
    pub fn default_milp() -> Self {
        if cfg!(feature = "highs") {
            Solver::Highs
        } else {
            Solver::Microlp
        }
    }
}

impl std::str::FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(Solver::Clarabel),
            "microlp" | "minilp" => Ok(Solver::Microlp),
            "highs" => Ok(Solver::Highs),
            other => Err(format!("unknown solver `{}`", other)),
        }
    }
}
