/// Four-step battery engine and order-checked simulator.
pub mod engine;
pub mod summary;
pub mod types;
/// Hour-of-day policy windows.
pub mod window;

pub use engine::{BatterySimulator, simulate};
pub use summary::SimulationSummary;
pub use types::{EnergyRecord, PolicyWindows, SimulationState};
pub use window::TimeWindowSet;
