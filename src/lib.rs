//! logi-sim: a discrete-event simulator of a logistics network.
//!
//! A fleet of trucks ferries orders across a sparse k-nearest-neighbour
//! graph of warehouses, hubs, ports, inspection points, and customers,
//! subject to node service queues, stochastic travel/service times, and
//! mandatory driver rest. Virtual time advances by popping events from a
//! priority queue; the engine owns every mutable piece of state.
//!
//! # Example
//!
//! ```no_run
//! use logi_sim::delay::DelayModel;
//! use logi_sim::engine::Engine;
//! use logi_sim::graph::Graph;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let graph = Graph::build_random(15, 3, &mut rng).unwrap();
//! let delay_model = DelayModel::new(ChaCha8Rng::seed_from_u64(42));
//! let mut engine = Engine::new(graph, delay_model);
//!
//! engine.spawn_truck("T1", "N1", 0.0);
//! engine.create_order("O1", "N1", "N5", 0.0);
//! engine.run(1440.0);
//!
//! println!("processed {} events", engine.processed_events().len());
//! ```

pub mod delay;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod graph;
pub mod output;
pub mod scheduler;
pub mod state;
pub mod tsplib;

pub use engine::Engine;
pub use error::{Result, SimError};
pub use graph::Graph;
