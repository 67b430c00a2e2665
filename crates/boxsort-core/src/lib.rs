//! boxsort core
//!
//! Experiment flow and data core for the box-sorting HRI study. The host
//! (game engine) reports events; the core tracks every box, decides what the
//! robot says and produces the experiment log.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use boxsort_core::prelude::*;
//!
//! let config = ExperimentConfig::default()
//!     .with_participant("P07")
//!     .with_condition(Condition::Cooperation)
//!     .with_seed(7);
//! let mut session = ExperimentSession::new(config, Box::new(CsvFileLog::create("data.csv")?))?;
//!
//! let commands = session.handle(Event::NextBoxPressed, 3.0);
//! let commands = session.tick(3.5);
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod event;
pub mod types;

// Session components
pub mod datalog;
pub mod finalization;
pub mod flow;
pub mod prompt;
pub mod scene;
pub mod schedule;
pub mod session;
pub mod spawner;
pub mod store;

// Test harness
pub mod test_harness;

// Re-exports
pub use error::*;
pub use types::*;

/// Commonly used types
pub mod prelude {
    pub use crate::config::{CooldownConfig, ExperimentConfig, FlowConfig};
    pub use crate::datalog::{CsvFileLog, LogRow, LogSink, MemoryLog, SessionLabels};
    pub use crate::error::{ConfigError, LogError, PromptError, ScheduleError, SessionError};
    pub use crate::event::{Command, Event, PromptDisplay};
    pub use crate::flow::{CycleReport, EndShiftStage, FlowCoordinator};
    pub use crate::prompt::{PromptCatalog, PromptKind, PromptState, PromptStateMachine, PromptTiming};
    pub use crate::schedule::ColorSchedule;
    pub use crate::session::ExperimentSession;
    pub use crate::store::{BoxRecord, BoxRecordStore};
    pub use crate::types::{Answer, Area, BoxColor, BoxId, Condition, Placement};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
