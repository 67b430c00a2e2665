//! Testing utilities for the boxsort workspace
//!
//! Shared session fixtures and a clock-driving harness.

#![allow(missing_docs)]

use boxsort_core::config::ExperimentConfig;
use boxsort_core::datalog::MemoryLog;
use boxsort_core::event::{Command, Event, PromptDisplay};
use boxsort_core::schedule::ColorSchedule;
use boxsort_core::session::ExperimentSession;
use boxsort_core::types::{Answer, Area, BoxColor, BoxId, Condition};

/// Default test config: fixed participant, seeded, cooperation
pub fn test_config() -> ExperimentConfig {
    ExperimentConfig::default()
        .with_participant("P01")
        .with_condition(Condition::Cooperation)
        .with_seed(11)
}

pub fn fixed_schedule(colors: &[BoxColor]) -> ColorSchedule {
    ColorSchedule::from_colors(colors.to_vec()).unwrap()
}

/// Session over a fixed schedule with an in-memory log, plus a clock
pub struct SessionHarness {
    pub session: ExperimentSession,
    pub log: MemoryLog,
    /// Every command emitted so far
    pub commands: Vec<Command>,
    now: f64,
}

impl SessionHarness {
    pub fn new(colors: &[BoxColor]) -> Self {
        Self::with_config(test_config(), colors)
    }

    pub fn with_config(config: ExperimentConfig, colors: &[BoxColor]) -> Self {
        let log = MemoryLog::new();
        let session =
            ExperimentSession::with_schedule(config, fixed_schedule(colors), Box::new(log.clone()));
        Self {
            session,
            log,
            commands: Vec::new(),
            now: 0.0,
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Tick in 0.1 s steps up to `time`
    pub fn advance_to(&mut self, time: f64) -> &mut Self {
        while self.now + 0.1 <= time + 1e-9 {
            self.now += 0.1;
            let out = self.session.tick(self.now);
            self.commands.extend(out);
        }
        if time >= self.now - 1e-6 {
            self.now = time;
        }
        let out = self.session.tick(self.now);
        self.commands.extend(out);
        self
    }

    /// Send an event at the current time; returns the commands it produced
    pub fn send(&mut self, event: Event) -> Vec<Command> {
        let out = self.session.handle(event, self.now);
        self.commands.extend(out.iter().cloned());
        out
    }

    pub fn press_next(&mut self) -> Vec<Command> {
        self.send(Event::NextBoxPressed)
    }

    pub fn pick_up(&mut self, id: u32) -> Vec<Command> {
        self.send(Event::BoxPickedUp(BoxId(id)))
    }

    pub fn enter(&mut self, id: u32, area: Area) -> Vec<Command> {
        self.send(Event::BoxEnteredArea { id: BoxId(id), area })
    }

    pub fn exit(&mut self, id: u32, area: Area) -> Vec<Command> {
        self.send(Event::BoxExitedArea { id: BoxId(id), area })
    }

    pub fn answer(&mut self, yes: bool) -> Vec<Command> {
        self.send(Event::Answered(Answer::from_yes(yes)))
    }

    /// Texts of every prompt shown so far, in order
    pub fn shown_texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::ShowPrompt { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn blocking_prompts(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| {
                matches!(
                    cmd,
                    Command::ShowPrompt {
                        display: PromptDisplay::Blocking,
                        ..
                    }
                )
            })
            .count()
    }

    pub fn spawned(&self) -> Vec<BoxId> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::SpawnBox { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn ended(&self) -> bool {
        self.commands.contains(&Command::EndSession)
    }
}
