//! Flap Gym headless driver
//!
//! Evaluates randomly weighted linear controllers, one episode per run.
//! No learning happens here; this exercises the environment end to end.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use flap_gym::sim::{Controller, Observation, SpriteSheet};
use flap_gym::{EvalOptions, SimConfig, eval};

#[derive(Parser)]
#[command(name = "flap-gym")]
#[command(version)]
#[command(about = "Headless side-scrolling flap environment for evolving controllers")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Controllers per episode
    #[arg(short, long, default_value = "50")]
    population: usize,

    /// Number of episodes to run
    #[arg(short, long, default_value = "1")]
    episodes: u32,

    /// Stop an episode after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Simulation config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print one JSON snapshot per tick to stdout
    #[arg(long)]
    trace: bool,
}

/// tanh(w . obs + b)
#[derive(Debug, Clone)]
struct LinearController {
    weights: [f32; 3],
    bias: f32,
}

impl LinearController {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // Inputs are in pixels, so keep weights small enough not to saturate
        Self {
            weights: std::array::from_fn(|_| rng.random_range(-0.05..0.05)),
            bias: rng.random_range(-1.0..1.0),
        }
    }
}

impl Controller for LinearController {
    fn activate(&mut self, observation: &Observation) -> f32 {
        let x = observation.to_array();
        let sum: f32 = self.weights.iter().zip(x).map(|(w, v)| w * v).sum();
        (sum + self.bias).tanh()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Flap Gym starting (seed {})", cli.seed);

    let config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    let sprites = Arc::new(SpriteSheet::procedural());
    let options = EvalOptions {
        max_ticks: cli.max_ticks,
        ..Default::default()
    };

    let mut rng = Pcg32::seed_from_u64(cli.seed);
    let stdout = io::stdout();

    for run in 0..cli.episodes {
        let controllers: Vec<LinearController> = (0..cli.population)
            .map(|_| LinearController::random(&mut rng))
            .collect();
        let mut fitness = vec![0.0_f32; controllers.len()];
        let episode_rng = Pcg32::seed_from_u64(rng.random());

        let mut out = stdout.lock();
        let mut trace_error = None;
        let summary = eval::evaluate_with(
            controllers.into_iter().zip(fitness.iter_mut()),
            Arc::clone(&sprites),
            config.clone(),
            episode_rng,
            &options,
            |episode, _| {
                if !cli.trace || trace_error.is_some() {
                    return;
                }
                let written = serde_json::to_writer(&mut out, &episode.snapshot())
                    .map_err(anyhow::Error::from)
                    .and_then(|()| writeln!(out).map_err(anyhow::Error::from));
                if let Err(e) = written {
                    trace_error = Some(e);
                }
            },
        );
        if let Some(e) = trace_error {
            return Err(e).context("writing trace");
        }

        let best = fitness
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, f)| (i, *f));
        log::info!(
            "Run {}: score {}, {} ticks ({:?}), best agent {:?}",
            run + 1,
            summary.score,
            summary.ticks,
            summary.reason,
            best
        );
    }

    Ok(())
}
