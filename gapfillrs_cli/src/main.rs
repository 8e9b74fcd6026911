//! Gap-fill a metabolic model for a given set of media
//!
//! Usage:
//!   gapfill draft.json -m M9,LB                  # default universe and media library
//!   gapfill draft.json -m M9 --universe-file universe.json --mediadb media.tsv -o out.json
//!   gapfill draft.json -m M9,LB --independent -v # media filled in parallel, info logging
//!   gapfill draft.json -m M9 --penalties scores.tsv --fbc2

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use gapfillrs_core::configuration::CONFIGURATION;
use gapfillrs_core::io::biomass::read_biomass_db;
use gapfillrs_core::io::media::MediaDatabase;
use gapfillrs_core::io::penalties::read_penalties;
use gapfillrs_core::io::Flavor;
use gapfillrs_core::metabolic_model::model::Model;
use gapfillrs_core::reconstruction::biomass::add_biomass_equation;
use gapfillrs_core::reconstruction::gapfill::GapFillOptions;
use gapfillrs_core::reconstruction::multigap::{multi_gap_fill, GapFillStrategy};

#[derive(Parser)]
#[command(name = "gapfill")]
#[command(author, version, about = "GapFill a metabolic model for a given set of media")]
struct Cli {
    /// Model to gap-fill (COBRA JSON)
    #[arg(value_name = "INPUTFILE")]
    input: PathBuf,

    /// List of media (comma-separated)
    #[arg(short, long, required = true, value_delimiter = ',')]
    media: Vec<String>,

    /// Media database file
    #[arg(long)]
    mediadb: Option<PathBuf>,

    /// Add spent medium compounds generated from the given species model
    #[arg(long = "spent-medium", value_name = "SPECIES")]
    spent: Option<PathBuf>,

    /// Pre-built universe model (default: bacteria)
    #[arg(short, long, conflicts_with = "universe_file")]
    universe: Option<String>,

    /// Reaction universe file (COBRA JSON)
    #[arg(long)]
    universe_file: Option<PathBuf>,

    /// Output file, defaults to `<input>_gapfill.json`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read and write bare (cobra style) identifiers
    #[arg(long, conflicts_with = "fbc2")]
    cobra: bool,

    /// Read and write SBML style prefixed identifiers
    ///
    /// Without `--cobra` or `--fbc2` models are read with the identifiers their files use and
    /// written in the default flavor, so the draft and the universe must share one convention.
    #[arg(long)]
    fbc2: bool,

    /// Reaction penalties (tab separated `reaction id`, `penalty` rows, no header)
    #[arg(long)]
    penalties: Option<PathBuf>,

    /// Biomass database, replaces the growth reaction with one of its compositions
    #[arg(long)]
    biomass: Option<PathBuf>,

    /// Composition to use from the biomass database (default: the first one)
    #[arg(long, requires = "biomass")]
    biomass_id: Option<String>,

    /// Gap-fill each medium against the draft independently and merge the results
    #[arg(long)]
    independent: bool,

    /// Uptake rate of every medium compound
    #[arg(long)]
    max_uptake: Option<f64>,

    /// Growth rate the gap-filled model must reach
    #[arg(long)]
    min_growth: Option<f64>,

    /// Increase logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flavor requested on the command line, if any
    fn requested_flavor(&self) -> Option<Flavor> {
        if self.fbc2 {
            Some(Flavor::Fbc2)
        } else if self.cobra {
            Some(Flavor::Cobra)
        } else {
            None
        }
    }

    fn flavor(&self) -> Flavor {
        self.requested_flavor().unwrap_or_default()
    }

    fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => {
                let stem = self
                    .input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "model".to_string());
                self.input.with_file_name(format!("{}_gapfill.json", stem))
            }
        }
    }
}

fn load_model(path: &Path, what: &str, flavor: Option<Flavor>) -> Result<Model> {
    match flavor {
        Some(flavor) => Model::read_json_as(path, flavor),
        None => Model::read_json(path),
    }
    .with_context(|| format!("Failed to load {}: {}", what, path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = {
        let mut config = CONFIGURATION
            .write()
            .map_err(|_| anyhow!("configuration lock poisoned"))?;
        if let Some(max_uptake) = cli.max_uptake {
            config.max_uptake = max_uptake;
        }
        if let Some(min_growth) = cli.min_growth {
            config.min_growth = min_growth;
        }
        config.clone()
    };

    log::info!("Loading model...");
    let mut model = load_model(&cli.input, "model", cli.requested_flavor())?;

    let spent_model = match &cli.spent {
        Some(path) => {
            log::info!("Loading model for spent medium species...");
            Some(load_model(path, "model", cli.requested_flavor())?)
        }
        None => None,
    };

    log::info!("Loading reaction universe...");
    let universe_path = match (&cli.universe_file, &cli.universe) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => config.universe_path(name),
        (None, None) => config.default_universe_path(),
    };
    let universe = load_model(&universe_path, "universe model", cli.requested_flavor())?;

    log::info!("Loading media...");
    let mediadb = cli
        .mediadb
        .clone()
        .unwrap_or_else(|| config.media_library_path());
    let media_db = MediaDatabase::read_tsv(&mediadb)
        .with_context(|| format!("Failed to load media database: {}", mediadb.display()))?;

    if let Some(path) = &cli.biomass {
        let database = read_biomass_db(path, true, Some(&model))
            .with_context(|| format!("Failed to load biomass database: {}", path.display()))?;
        let (biomass_id, coeffs) = match &cli.biomass_id {
            Some(id) => (
                id.as_str(),
                database
                    .get(id)
                    .ok_or_else(|| anyhow!("Biomass {} not in {}", id, path.display()))?,
            ),
            None => database
                .first()
                .map(|(id, coeffs)| (id.as_str(), coeffs))
                .ok_or_else(|| anyhow!("No biomass composition in {}", path.display()))?,
        };
        let reaction_id = add_biomass_equation(&mut model, coeffs, Some(biomass_id))?;
        log::info!("Growth objective set to {}", reaction_id);
    }

    let mut options = GapFillOptions::default();
    if let Some(path) = &cli.penalties {
        options.penalties = read_penalties(path)
            .with_context(|| format!("Failed to load penalties: {}", path.display()))?;
        log::info!("Using {} reaction penalties", options.penalties.len());
    }
    if cli.independent {
        options.strategy = GapFillStrategy::Independent;
    }
    if options.strategy == GapFillStrategy::Independent && options.processes < 2 {
        options.processes = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
    }

    log::info!("Gap filling for {}...", cli.media.join(", "));
    let report = multi_gap_fill(
        &mut model,
        &universe,
        &cli.media,
        &media_db,
        &options,
        spent_model.as_ref(),
    )?;
    println!("{}", report);

    let output = cli.output_path();
    log::info!("Saving model to {}...", output.display());
    model
        .write_json(&output, cli.flavor())
        .with_context(|| format!("Failed to save model: {}", output.display()))?;
    log::info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_flags_apply_to_reading() {
        let cli = Cli::try_parse_from(["gapfill", "draft.json", "-m", "M9,LB", "--fbc2"]).unwrap();
        assert_eq!(cli.requested_flavor(), Some(Flavor::Fbc2));
        assert_eq!(cli.media, vec!["M9", "LB"]);
        let cli = Cli::try_parse_from(["gapfill", "draft.json", "-m", "M9"]).unwrap();
        assert_eq!(cli.requested_flavor(), None);
        assert_eq!(cli.flavor(), Flavor::default());
        assert!(Cli::try_parse_from(["gapfill", "d.json", "-m", "M9", "--cobra", "--fbc2"]).is_err());
    }

    #[test]
    fn penalties_flag() {
        let cli = Cli::try_parse_from([
            "gapfill",
            "draft.json",
            "-m",
            "M9",
            "--penalties",
            "scores.tsv",
        ])
        .unwrap();
        assert_eq!(cli.penalties, Some(PathBuf::from("scores.tsv")));
        assert_eq!(cli.output_path(), PathBuf::from("draft_gapfill.json"));
    }
}
