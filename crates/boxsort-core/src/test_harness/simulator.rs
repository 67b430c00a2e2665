//! Session simulator
//!
//! A seeded participant plays whole sessions against an in-memory log:
//! presses next, picks the box up, drops it somewhere, sometimes presses the
//! compressor button and answers the leftover question.
//!
//! Invariants checked per session:
//! - Every spawned box is finalized exactly once with exactly one row
//! - No placement history repeats a tag back to back
//! - Hesitation equals next request minus pickup
//! - At most one end-of-shift row, nothing left unflushed
//! - The session ends

use crate::config::ExperimentConfig;
use crate::datalog::MemoryLog;
use crate::event::{Command, Event, PromptDisplay};
use crate::session::ExperimentSession;
use crate::types::{Answer, Area, BoxColor, BoxId, Placement};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Sessions to play
    pub sessions: u64,
    /// Probability of dropping a plain box into its own bin
    pub accuracy: f64,
    /// Probability of pressing the compressor button after using it
    pub compressor_press_probability: f64,
    /// Simulated seconds between ticks
    pub tick: f64,
    /// Give up on a session after this long
    pub max_session_secs: f64,
    pub stop_on_first_violation: bool,
    /// Session template; each session gets its own seed
    pub experiment: ExperimentConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sessions: 20,
            accuracy: 0.85,
            compressor_press_probability: 0.5,
            tick: 0.25,
            max_session_secs: 3600.0,
            stop_on_first_violation: false,
            experiment: ExperimentConfig::default().with_participant("SIM"),
        }
    }
}

impl SimulatorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sessions(mut self, sessions: u64) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_experiment(mut self, experiment: ExperimentConfig) -> Self {
        self.experiment = experiment;
        self
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Violation {
    /// Session could not be constructed
    SetupFailed { session: u64, error: String },
    /// No `EndSession` within the time limit
    SessionDidNotEnd { session: u64, elapsed: f64 },
    BoxNotFinalized { session: u64, box_id: BoxId },
    RowCountMismatch { session: u64, box_id: BoxId, rows: usize },
    RepeatedHistoryTag {
        session: u64,
        box_id: BoxId,
        placement: Placement,
    },
    HesitationMismatch {
        session: u64,
        box_id: BoxId,
        expected: f64,
        actual: f64,
    },
    FinalizedCountMismatch {
        session: u64,
        finalized: usize,
        spawned: usize,
    },
    MultipleEndRows { session: u64, count: usize },
    UnflushedRows { session: u64, pending: usize },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub sessions_run: u64,
    pub sessions_ended: u64,
    pub boxes_spawned: u64,
    pub boxes_finalized: u64,
    pub correctly_sorted: u64,
    pub prompts_shown: u64,
    pub questions_asked: u64,
    pub answers_agree: u64,
    pub answers_disagree: u64,
    pub compressor_presses: u64,
    pub log_rows: u64,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let stats = &self.stats;
        let mut report = String::new();
        report.push_str("=== boxsort Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!(
            "Sessions: {} run, {} ended\n",
            stats.sessions_run, stats.sessions_ended
        ));
        report.push_str(&format!("Boxes Spawned: {}\n", stats.boxes_spawned));
        report.push_str(&format!("Boxes Finalized: {}\n", stats.boxes_finalized));
        report.push_str(&format!("Correctly Sorted: {}\n", stats.correctly_sorted));
        report.push_str(&format!("Prompts Shown: {}\n", stats.prompts_shown));
        report.push_str(&format!(
            "Leftover Questions: {} (agree {}, disagree {})\n",
            stats.questions_asked, stats.answers_agree, stats.answers_disagree
        ));
        report.push_str(&format!("Compressor Presses: {}\n", stats.compressor_presses));
        report.push_str(&format!("Log Rows: {}\n\n", stats.log_rows));

        if self.passed() {
            report.push_str("Result: PASSED\n");
        } else {
            report.push_str(&format!("Result: FAILED ({} violations)\n", self.violations.len()));
            for violation in &self.violations {
                report.push_str(&format!("  - {violation:?}\n"));
            }
        }
        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Run the simulator
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for session in 0..config.sessions {
        let found = run_session(session, &config, &mut rng, &mut stats);
        let failed = !found.is_empty();
        violations.extend(found);
        if failed && config.stop_on_first_violation {
            break;
        }
    }

    tracing::info!(
        sessions = stats.sessions_run,
        violations = violations.len(),
        "simulation finished"
    );
    SimulatorReport {
        config,
        stats,
        violations,
    }
}

#[derive(Debug, Clone, Copy)]
enum Intent {
    PressNext,
    PickUp(BoxId),
    Place(BoxId),
    PressCompressor,
    Answer,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    at: f64,
    intent: Intent,
}

struct Participant<'a> {
    config: &'a SimulatorConfig,
    rng: &'a mut StdRng,
    agenda: Vec<Scheduled>,
    spawned: IndexMap<BoxId, BoxColor>,
}

impl Participant<'_> {
    fn schedule(&mut self, at: f64, intent: Intent) {
        self.agenda.push(Scheduled { at, intent });
    }

    fn schedule_after(&mut self, now: f64, min: f64, max: f64, intent: Intent) {
        let delay = self.rng.random_range(min..max);
        self.schedule(now + delay, intent);
    }

    fn next_pending(&self) -> bool {
        self.agenda
            .iter()
            .any(|s| matches!(s.intent, Intent::PressNext))
    }

    fn take_due(&mut self, now: f64) -> Vec<Scheduled> {
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            self.agenda.drain(..).partition(|s| s.at <= now);
        self.agenda = rest;
        due.sort_by(|a, b| a.at.total_cmp(&b.at));
        due
    }

    fn choose_area(&mut self, color: BoxColor) -> Area {
        if let Some(target) = color.target_area() {
            if self.rng.random_bool(self.config.accuracy.clamp(0.0, 1.0)) {
                return target;
            }
        }
        let options: &[Area] = if color.is_ambiguous() {
            &[Area::Table, Area::YellowDrawer, Area::Compressor]
        } else {
            &Area::ALL
        };
        options[self.rng.random_range(0..options.len())]
    }

    fn observe(&mut self, commands: &[Command], now: f64, stats: &mut SimulatorStats) {
        for command in commands {
            match command {
                Command::SpawnBox { id, color } => {
                    stats.boxes_spawned += 1;
                    self.spawned.insert(*id, *color);
                    self.schedule_after(now, 0.5, 3.0, Intent::PickUp(*id));
                }
                Command::ShowPrompt {
                    display: PromptDisplay::Blocking,
                    ..
                } => {
                    stats.questions_asked += 1;
                    self.schedule_after(now, 1.0, 3.0, Intent::Answer);
                }
                Command::ShowPrompt { .. } => stats.prompts_shown += 1,
                _ => {}
            }
        }
    }
}

fn run_session(
    index: u64,
    config: &SimulatorConfig,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
) -> Vec<Violation> {
    let experiment = config
        .experiment
        .clone()
        .with_seed(config.seed.wrapping_add(index));
    let first_press = experiment.timing.start_delay + 1.0;
    let log = MemoryLog::new();
    let mut session = match ExperimentSession::new(experiment, Box::new(log.clone())) {
        Ok(session) => session,
        Err(err) => {
            return vec![Violation::SetupFailed {
                session: index,
                error: err.to_string(),
            }]
        }
    };
    stats.sessions_run += 1;

    let mut participant = Participant {
        config,
        rng,
        agenda: Vec::new(),
        spawned: IndexMap::new(),
    };
    participant.schedule(first_press, Intent::PressNext);

    let mut now = 0.0;
    while !session.is_ended() && now <= config.max_session_secs {
        now += config.tick;
        let commands = session.tick(now);
        participant.observe(&commands, now, stats);

        for scheduled in participant.take_due(now) {
            let event = match scheduled.intent {
                Intent::PressNext => {
                    if !session.next_button_ready(now) {
                        participant.schedule(now + 1.0, Intent::PressNext);
                        continue;
                    }
                    Event::NextBoxPressed
                }
                Intent::PickUp(id) => {
                    participant.schedule_after(now, 1.0, 4.0, Intent::Place(id));
                    Event::BoxPickedUp(id)
                }
                Intent::Place(id) => {
                    let color = participant.spawned.get(&id).copied().unwrap_or(BoxColor::Red);
                    let area = participant.choose_area(color);
                    if area == Area::Compressor
                        && participant
                            .rng
                            .random_bool(config.compressor_press_probability.clamp(0.0, 1.0))
                    {
                        participant.schedule_after(now, 0.5, 2.0, Intent::PressCompressor);
                    }
                    if !participant.next_pending() {
                        participant.schedule_after(now, 0.5, 2.0, Intent::PressNext);
                    }
                    Event::BoxEnteredArea { id, area }
                }
                Intent::PressCompressor => {
                    if !session.compressor_button_ready(now) {
                        continue;
                    }
                    stats.compressor_presses += 1;
                    Event::CompressorButtonPressed
                }
                Intent::Answer => {
                    let answer = Answer::from_yes(participant.rng.random_bool(0.5));
                    match answer {
                        Answer::Agree => stats.answers_agree += 1,
                        Answer::Disagree => stats.answers_disagree += 1,
                    }
                    Event::Answered(answer)
                }
            };
            let commands = session.handle(event, now);
            participant.observe(&commands, now, stats);
        }
    }

    check_session(index, &session, &log, &participant.spawned, now, stats)
}

fn check_session(
    index: u64,
    session: &ExperimentSession,
    log: &MemoryLog,
    spawned: &IndexMap<BoxId, BoxColor>,
    elapsed: f64,
    stats: &mut SimulatorStats,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let flow = session.flow();
    let rows = log.rows();
    stats.log_rows += rows.len() as u64;
    stats.boxes_finalized += flow.tracker().finalized_count() as u64;

    if session.is_ended() {
        stats.sessions_ended += 1;
    } else {
        violations.push(Violation::SessionDidNotEnd {
            session: index,
            elapsed,
        });
    }

    for &box_id in spawned.keys() {
        if !flow.tracker().is_finalized(box_id) {
            violations.push(Violation::BoxNotFinalized {
                session: index,
                box_id,
            });
        }
        let count = rows.iter().filter(|row| row.box_id() == Some(box_id)).count();
        if count != 1 {
            violations.push(Violation::RowCountMismatch {
                session: index,
                box_id,
                rows: count,
            });
        }
    }

    for record in flow.store().iter() {
        if record.was_correct() {
            stats.correctly_sorted += 1;
        }
        if let Some(pair) = record
            .history()
            .windows(2)
            .find(|pair| pair[0].placement == pair[1].placement)
        {
            violations.push(Violation::RepeatedHistoryTag {
                session: index,
                box_id: record.id(),
                placement: pair[1].placement,
            });
        }
        if let (Some(actual), Some(next), Some(pickup)) = (
            record.hesitation_time(),
            record.next_request_time(),
            record.pickup_absolute_time(),
        ) {
            let expected = next - pickup;
            if (actual - expected).abs() > 1e-9 {
                violations.push(Violation::HesitationMismatch {
                    session: index,
                    box_id: record.id(),
                    expected,
                    actual,
                });
            }
        }
    }

    if flow.tracker().finalized_count() != spawned.len() {
        violations.push(Violation::FinalizedCountMismatch {
            session: index,
            finalized: flow.tracker().finalized_count(),
            spawned: spawned.len(),
        });
    }
    let end_rows = log.end_rows().len();
    if end_rows > 1 {
        violations.push(Violation::MultipleEndRows {
            session: index,
            count: end_rows,
        });
    }
    if log.pending_len() > 0 {
        violations.push(Violation::UnflushedRows {
            session: index,
            pending: log.pending_len(),
        });
    }
    violations
}
