//! Home battery storage simulator over recorded grid import/export data.

pub mod battery;
pub mod config;
pub mod error;
/// Record loading, synthetic data, and output writers.
pub mod io;
/// Simulation engine, policy windows, and run totals.
pub mod sim;
