use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use evodrive::simulation::params::Params;
use evodrive::simulation::trainer::{GenerationSummary, TickOutcome, Trainer};
use evodrive::storage::{JsonFileStore, NetworkStore, RunMetadata};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "evodrive",
    version,
    about = "Train self-driving cars by neuroevolution"
)]
struct Cli {
    /// JSON parameter file; missing fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the seed network, run statistics and archive.
    #[arg(short, long, default_value = "evodrive-data")]
    store: PathBuf,

    /// Generations to run before exiting.
    #[arg(short, long, default_value_t = 10)]
    generations: u32,

    /// Ticks after which a generation is ended even if cars are still driving.
    #[arg(long, default_value_t = 5_000)]
    max_ticks: u64,

    /// Override the population size.
    #[arg(long)]
    population: Option<usize>,

    /// Override the mutation rate.
    #[arg(long)]
    mutation_rate: Option<f32>,

    /// Override the max speed of training cars.
    #[arg(long)]
    max_speed: Option<f32>,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Discard the stored seed network and statistics before starting.
    #[arg(long)]
    fresh: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let params = load_params(&cli)?;
    let mut store = JsonFileStore::open(&cli.store)
        .with_context(|| format!("opening store at {}", cli.store.display()))?;
    if cli.fresh {
        store.discard().context("discarding stored network")?;
    }

    let mut context = store.load_context();
    context.best_network = store.load_network();
    info!(
        generation = context.generation,
        seeded = context.best_network.is_some(),
        population = params.training.population_size,
        "Starting evodrive training"
    );

    let min_save_fitness = params.training.min_save_fitness;
    let mut trainer = Trainer::new(params, context);

    for _ in 0..cli.generations {
        let summary = run_generation(&mut trainer, cli.max_ticks);
        persist(&mut store, &summary, min_save_fitness)?;
        store
            .save_context(trainer.context())
            .context("saving training context")?;
    }

    info!(
        generation = trainer.generation(),
        best_ever_fitness = trainer.context().best_ever_fitness,
        best_ever_distance = trainer.context().best_ever_distance,
        "Training finished"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_params(cli: &Cli) -> Result<Params> {
    let mut params = match &cli.config {
        Some(path) => Params::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Params::default(),
    };

    if let Some(population) = cli.population {
        params.training.population_size = population;
    }
    if let Some(rate) = cli.mutation_rate {
        params.training.mutation_rate = rate;
    }
    if let Some(speed) = cli.max_speed {
        params.training.max_speed_override = Some(speed);
    }
    if cli.seed.is_some() {
        params.training.seed = cli.seed;
    }
    params.training.auto_advance = true;

    params.validate().context("invalid parameters")?;
    Ok(params)
}

/// Runs ticks until the population is exhausted or the tick cap forces an advance.
fn run_generation(trainer: &mut Trainer, max_ticks: u64) -> GenerationSummary {
    loop {
        match trainer.step() {
            TickOutcome::Advanced(summary) => return summary,
            TickOutcome::Exhausted => return trainer.next_generation(),
            TickOutcome::Running { alive } => {
                if trainer.tick() >= max_ticks {
                    warn!(alive, ticks = trainer.tick(), "generation hit the tick cap");
                    return trainer.next_generation();
                }
            }
        }
    }
}

fn persist(
    store: &mut JsonFileStore,
    summary: &GenerationSummary,
    min_save_fitness: f32,
) -> Result<()> {
    let Some(network) = &summary.network else {
        return Ok(());
    };
    if summary.best_fitness > min_save_fitness {
        store
            .save_network(network, &RunMetadata::from_summary(summary))
            .context("saving best network")?;
    }
    Ok(())
}
