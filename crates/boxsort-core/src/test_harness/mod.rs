//! Simulated participants for whole-session testing

pub mod simulator;

pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation};
