// Library exports for the Tron engine
// This allows the server binary, the replay tool and the integration tests to use the core engine

pub mod config;
pub mod debug_logger;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod pathfinding;
pub mod predictor;
pub mod reachability;
pub mod replay;
pub mod session;
pub mod simple_profiler;
pub mod types;
