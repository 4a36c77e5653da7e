//! Logistics network simulator - command line driver.
//!
//! Illustrative binary: assembles a graph, seeds spawn/order events from a
//! single seed, drives the engine, and optionally streams a live summary or
//! exports the processed-event log to CSV. The core crate exposes nothing
//! beyond [`logi_sim::engine::Engine::step`]/`run`; the loop and any
//! rendering live here.

use clap::Parser;
use logi_sim::delay::DelayModel;
use logi_sim::engine::Engine;
use logi_sim::graph::Graph;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logi-sim")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Discrete-event simulator of a logistics network")]
struct Cli {
    /// Run the simulation. Currently the only mode; accepted for symmetry
    /// with a future non-simulation subcommand, and implied when absent.
    #[arg(long)]
    simulate: bool,

    /// Build the graph from a TSPLIB coordinate file instead of randomly.
    #[arg(long)]
    tsplib: Option<PathBuf>,

    /// Node count for a randomly generated graph.
    #[arg(long, default_value_t = Graph::DEFAULT_RANDOM_NODES)]
    num_nodes: usize,

    /// Neighbour count for the k-nearest-neighbour graph. Defaults to
    /// `Graph::DEFAULT_RANDOM_K` for a random graph or
    /// `Graph::DEFAULT_TSPLIB_K` when `--tsplib` is given, if left unset.
    #[arg(long)]
    k_neighbors: Option<usize>,

    /// Number of trucks to spawn at t=0.
    #[arg(long, default_value_t = 3)]
    num_trucks: usize,

    /// Number of orders to create over the run horizon.
    #[arg(long, default_value_t = 10)]
    num_orders: usize,

    /// Run horizon in minutes.
    #[arg(long, default_value_t = 1440.0)]
    horizon: f64,

    /// Seed for every RNG the run touches: graph randomization, truck/order
    /// generation, and the delay model.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the processed-event log to this CSV path after the run.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stream a one-line-per-event summary to stdout while the run
    /// progresses, instead of calling `run` once.
    #[arg(long)]
    live: bool,

    /// Verbose logging (equivalent to RUST_LOG=info if unset).
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.verbose {
        log::info!("verbose mode requested; set RUST_LOG for finer control");
    }
    let _ = cli.simulate;

    let mut master_rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let graph_seed: u64 = master_rng.gen();
    let events_seed: u64 = master_rng.gen();
    let delay_seed: u64 = master_rng.gen();

    let mut graph_rng = ChaCha8Rng::seed_from_u64(graph_seed);
    let graph = match &cli.tsplib {
        Some(path) => {
            let k = cli.k_neighbors.unwrap_or(Graph::DEFAULT_TSPLIB_K);
            Graph::build_from_tsplib(path, k, (45.0, 55.0), (14.0, 24.0), &mut graph_rng)
        }
        None => {
            let k = cli.k_neighbors.unwrap_or(Graph::DEFAULT_RANDOM_K);
            Graph::build_random(cli.num_nodes, k, &mut graph_rng)
        }
    };
    let graph = match graph {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to build graph: {e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "graph built: {} nodes, {} directed edges, connected={}",
        graph.len(),
        graph.edge_count(),
        graph.is_connected()
    );

    let mut events_rng = ChaCha8Rng::seed_from_u64(events_seed);
    let delay_model = DelayModel::new(ChaCha8Rng::seed_from_u64(delay_seed));
    let mut engine = Engine::new(graph, delay_model);

    let node_ids: Vec<String> = engine.graph().node_ids().map(String::from).collect();

    for i in 1..=cli.num_trucks {
        let start = node_ids[events_rng.gen_range(0..node_ids.len())].clone();
        engine.spawn_truck(format!("T{i}"), start, 0.0);
    }

    log::info!("seeding {} orders over horizon {}", cli.num_orders, cli.horizon);
    for i in 1..=cli.num_orders {
        let origin = node_ids[events_rng.gen_range(0..node_ids.len())].clone();
        let mut destination = node_ids[events_rng.gen_range(0..node_ids.len())].clone();
        while destination == origin {
            destination = node_ids[events_rng.gen_range(0..node_ids.len())].clone();
        }
        let creation_time = events_rng.gen_range(0.0..cli.horizon);
        engine.create_order(format!("O{i}"), origin, destination, creation_time);
    }

    if cli.live {
        while engine.current_time() < cli.horizon {
            if !engine.step() {
                break;
            }
            let event = engine.processed_events().last().unwrap();
            println!("{:>10.1} {:<8} {:<8} {}", event.time, event.truck_id, event.node_id, event.kind.label());
        }
    } else {
        engine.run(cli.horizon);
    }

    println!(
        "run complete: {} events processed, {} orders tracked",
        engine.processed_events().len(),
        engine.orders().len()
    );

    if let Some(path) = &cli.output {
        if let Err(e) = logi_sim::output::export_events_csv(engine.processed_events(), path) {
            eprintln!("failed to export events: {e}");
            std::process::exit(1);
        }
        log::info!("wrote {} events to {}", engine.processed_events().len(), path.display());
    }
}
