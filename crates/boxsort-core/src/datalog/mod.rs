//! Experiment log
//!
//! Row model, row formatting and the sink port the flow core writes to:
//! - `LogRow`: one finalized box or the end-of-shift answer
//! - `LogSink`: buffered append with explicit flush
//! - `MemoryLog`: shared in-memory sink for tests and the simulator
//! - `CsvFileLog`: append-only semicolon-delimited file

mod file;

pub use file::CsvFileLog;

use crate::error::LogError;
use crate::store::{BoxRecord, HistoryEntry};
use crate::types::{Answer, BoxColor, BoxId, Condition, Placement};
use indexmap::IndexSet;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Column header, written once when a log file is created
pub const HEADER: &str = "ParticipantID;Condition;BoxID;Color;SpawnTime;PickupTime;HesitationTime;PlacementHistory;CorrectlySorted;EndStatement";

/// End statement for boxes finalized before any end-of-shift answer
pub const NO_END_PROMPT: &str = "No end prompt";

/// Participant and condition stamped on every row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionLabels {
    pub participant_id: String,
    pub condition: Condition,
}

impl SessionLabels {
    pub fn new(participant_id: impl Into<String>, condition: Condition) -> Self {
        Self {
            participant_id: participant_id.into(),
            condition,
        }
    }
}

/// Completed row for one finalized box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxRow {
    pub participant_id: String,
    pub condition: Condition,
    pub box_id: BoxId,
    pub color: BoxColor,
    pub spawn_time: f64,
    pub pickup_time: f64,
    pub hesitation_time: f64,
    pub placement_history: String,
    pub correct: bool,
    pub end_statement: String,
}

impl BoxRow {
    /// Snapshot a record at finalization time
    #[must_use]
    pub fn from_record(labels: &SessionLabels, record: &BoxRecord, answer: Option<Answer>) -> Self {
        Self {
            participant_id: labels.participant_id.clone(),
            condition: labels.condition,
            box_id: record.id(),
            color: record.color(),
            spawn_time: record.spawn_time().unwrap_or(0.0),
            pickup_time: record.pickup_time().unwrap_or(0.0),
            hesitation_time: record.hesitation_time().unwrap_or(0.0),
            placement_history: format_history(record.history()),
            correct: record.was_correct(),
            end_statement: answer.map_or_else(|| NO_END_PROMPT.to_string(), |a| a.to_string()),
        }
    }
}

/// The single end-of-shift answer row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndRow {
    pub participant_id: String,
    pub condition: Condition,
    /// Seconds between the last next-box request and the answer
    pub response_time: f64,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LogRow {
    Box(BoxRow),
    End(EndRow),
}

impl LogRow {
    /// Render as one delimited line, without the trailing newline
    #[must_use]
    pub fn to_line(&self) -> String {
        match self {
            LogRow::Box(row) => format!(
                "{};{};{};{};{:.2};{:.2};{:.2};\"{}\";{};{}",
                sanitize(&row.participant_id),
                row.condition,
                row.box_id,
                row.color,
                row.spawn_time,
                row.pickup_time,
                row.hesitation_time,
                sanitize(&row.placement_history),
                if row.correct { "Yes" } else { "" },
                sanitize(&row.end_statement),
            ),
            LogRow::End(row) => format!(
                "{};{};END;NA;0.00;0.00;0.00;\"(None)\";{:.2};{}",
                sanitize(&row.participant_id),
                row.condition,
                row.response_time,
                row.answer,
            ),
        }
    }

    #[must_use]
    pub fn box_id(&self) -> Option<BoxId> {
        match self {
            LogRow::Box(row) => Some(row.box_id),
            LogRow::End(_) => None,
        }
    }
}

/// `[t: Tag], [t: Tag]` with duplicate entries dropped, `None` when empty
#[must_use]
pub fn format_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "None".to_string();
    }
    let distinct: IndexSet<(u64, Placement)> = history
        .iter()
        .map(|entry| (entry.time.to_bits(), entry.placement))
        .collect();
    distinct
        .into_iter()
        .map(|(bits, placement)| format!("[{:.2}: {placement}]", f64::from_bits(bits)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sanitize(field: &str) -> String {
    field.replace('"', "'")
}

/// Destination for experiment log rows
#[cfg_attr(test, mockall::automock)]
pub trait LogSink {
    /// Buffer a row
    fn append(&mut self, row: LogRow);

    /// Persist buffered rows
    fn flush(&mut self) -> Result<(), LogError>;
}

#[derive(Debug, Default)]
struct MemoryLogState {
    pending: Vec<LogRow>,
    flushed: Vec<LogRow>,
    flushes: usize,
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    state: Rc<RefCell<MemoryLogState>>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row appended so far, flushed or not
    #[must_use]
    pub fn rows(&self) -> Vec<LogRow> {
        let state = self.state.borrow();
        state
            .flushed
            .iter()
            .chain(state.pending.iter())
            .cloned()
            .collect()
    }

    /// Rows persisted by a flush
    #[must_use]
    pub fn flushed_rows(&self) -> Vec<LogRow> {
        self.state.borrow().flushed.clone()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.state.borrow().flushes
    }

    /// Box rows only
    #[must_use]
    pub fn box_rows(&self) -> Vec<BoxRow> {
        self.rows()
            .into_iter()
            .filter_map(|row| match row {
                LogRow::Box(row) => Some(row),
                LogRow::End(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn end_rows(&self) -> Vec<EndRow> {
        self.rows()
            .into_iter()
            .filter_map(|row| match row {
                LogRow::End(row) => Some(row),
                LogRow::Box(_) => None,
            })
            .collect()
    }

    /// Rendered lines of every row
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.rows().iter().map(LogRow::to_line).collect()
    }
}

impl LogSink for MemoryLog {
    fn append(&mut self, row: LogRow) {
        self.state.borrow_mut().pending.push(row);
    }

    fn flush(&mut self) -> Result<(), LogError> {
        let mut state = self.state.borrow_mut();
        let pending = std::mem::take(&mut state.pending);
        state.flushed.extend(pending);
        state.flushes += 1;
        Ok(())
    }
}
