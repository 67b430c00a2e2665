//! Experiment session
//!
//! Single entry point for the host. Routes events to the flow coordinator,
//! applies button cooldowns and runs the delayed actions:
//! - start message shortly after the session starts
//! - compressor finalization shortly after the button press

use crate::config::{CooldownConfig, ExperimentConfig};
use crate::datalog::LogSink;
use crate::error::SessionError;
use crate::event::{Command, Event};
use crate::flow::FlowCoordinator;
use crate::prompt::PromptStateMachine;
use crate::schedule::ColorSchedule;
use crate::spawner::BoxSpawner;
use crate::types::Condition;

/// Drops triggers until `duration` seconds after the last accepted one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    duration: f64,
    ready_at: f64,
}

impl Cooldown {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ready_at: f64::NEG_INFINITY,
        }
    }

    /// Accept the trigger if the cooldown expired
    pub fn try_trigger(&mut self, now: f64) -> bool {
        if now < self.ready_at {
            return false;
        }
        self.ready_at = now + self.duration;
        true
    }

    #[must_use]
    pub fn is_ready(&self, now: f64) -> bool {
        now >= self.ready_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Ended,
}

pub struct ExperimentSession {
    condition: Condition,
    cooldowns: CooldownConfig,
    flow: FlowCoordinator,
    next_button: Cooldown,
    compressor_button: Cooldown,
    start_message_at: Option<f64>,
    compress_at: Option<f64>,
}

impl ExperimentSession {
    /// Validate the config and build a session with a generated schedule
    pub fn new(config: ExperimentConfig, log: Box<dyn LogSink>) -> Result<Self, SessionError> {
        config.validate()?;
        let schedule = match config.seed {
            Some(seed) => ColorSchedule::seeded(config.total_boxes, seed)?,
            None => ColorSchedule::generate(config.total_boxes, &mut rand::rng())?,
        };
        Ok(Self::with_schedule(config, schedule, log))
    }

    /// Build a session over an explicit schedule; the total is the schedule length
    #[must_use]
    pub fn with_schedule(
        config: ExperimentConfig,
        schedule: ColorSchedule,
        log: Box<dyn LogSink>,
    ) -> Self {
        let prompt_seed = config.seed.unwrap_or_else(rand::random);
        let prompts = PromptStateMachine::new(config.prompts.clone(), config.timing, prompt_seed);
        tracing::info!(
            participant = %config.participant_id,
            condition = %config.condition,
            boxes = schedule.len(),
            "session created"
        );
        let flow = FlowCoordinator::new(
            config.labels(),
            config.flow.clone(),
            BoxSpawner::new(schedule),
            prompts,
            log,
        );
        Self {
            condition: config.condition,
            cooldowns: config.cooldowns,
            flow,
            next_button: Cooldown::new(config.cooldowns.next_box),
            compressor_button: Cooldown::new(config.cooldowns.compressor),
            start_message_at: Some(config.timing.start_delay),
            compress_at: None,
        }
    }

    /// Handle one host event at session time `now`
    pub fn handle(&mut self, event: Event, now: f64) -> Vec<Command> {
        let mut out = Vec::new();
        if self.is_ended() {
            tracing::debug!(?event, "session ended; event dropped");
            return out;
        }
        self.advance(now, &mut out);
        if self.is_ended() {
            return out;
        }

        match event {
            Event::NextBoxPressed => {
                if !self.next_button.try_trigger(now) {
                    tracing::debug!("next-box press during cooldown ignored");
                    return out;
                }
                if let Some(clip) = self.flow.prompts().catalog().next_button_clip.clone() {
                    out.push(Command::PlayClip(clip));
                }
                self.flow.request_next(now, &mut out);
            }
            Event::CompressorButtonPressed => {
                if !self.compressor_button.try_trigger(now) {
                    tracing::debug!("compressor press during cooldown ignored");
                    return out;
                }
                if let Some(clip) = self.flow.prompts().catalog().compressor_clip.clone() {
                    out.push(Command::PlayClip(clip));
                }
                self.compress_at = Some(now + self.cooldowns.compressor_finalize_delay);
            }
            Event::BoxPickedUp(id) => self.flow.on_box_picked_up(id, now, &mut out),
            Event::AmbiguousBoxPicked(id) => self.flow.on_ambiguous_box_picked(id, now, &mut out),
            Event::BoxEnteredArea { id, area } => self.flow.on_area_entered(id, area),
            Event::BoxExitedArea { id, area } => self.flow.on_area_exited(id, area),
            Event::Answered(answer) => self.flow.on_answer(answer, now, &mut out),
        }
        out
    }

    /// Advance every deadline up to `now`
    pub fn tick(&mut self, now: f64) -> Vec<Command> {
        let mut out = Vec::new();
        if !self.is_ended() {
            self.advance(now, &mut out);
        }
        out
    }

    /// End the session immediately, flushing the log
    pub fn shutdown(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        self.flow.end_session(&mut out);
        out
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.flow.is_ended() {
            SessionStatus::Ended
        } else {
            SessionStatus::Running
        }
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.status() == SessionStatus::Ended
    }

    #[must_use]
    pub fn flow(&self) -> &FlowCoordinator {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut FlowCoordinator {
        &mut self.flow
    }

    /// Whether a next-box press at `now` would be accepted
    #[must_use]
    pub fn next_button_ready(&self, now: f64) -> bool {
        self.next_button.is_ready(now)
    }

    #[must_use]
    pub fn compressor_button_ready(&self, now: f64) -> bool {
        self.compressor_button.is_ready(now)
    }

    fn advance(&mut self, now: f64, out: &mut Vec<Command>) {
        if self.start_message_at.is_some_and(|at| now >= at) {
            self.start_message_at = None;
            let condition = self.condition;
            if let Err(err) = self.flow.prompts_mut().show_start_message(condition, now, out) {
                tracing::warn!(%err, "start message not shown");
            }
        }
        if self.compress_at.is_some_and(|at| now >= at) {
            self.compress_at = None;
            let report = self.flow.compress(now, out);
            tracing::debug!(finalized = report.finalized.len(), "compressor emptied");
        }
        self.flow.tick(now, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::MemoryLog;
    use crate::event::PromptDisplay;
    use crate::types::{Area, BoxColor, BoxId};

    fn session(colors: Vec<BoxColor>) -> (ExperimentSession, MemoryLog) {
        let log = MemoryLog::new();
        let config = ExperimentConfig::default().with_seed(5);
        let session = ExperimentSession::with_schedule(
            config,
            ColorSchedule::from_colors(colors).unwrap(),
            Box::new(log.clone()),
        );
        (session, log)
    }

    #[test]
    fn cooldown_drops_early_triggers() {
        let mut cooldown = Cooldown::new(10.0);
        assert!(cooldown.try_trigger(0.0));
        assert!(!cooldown.try_trigger(9.9));
        assert!(cooldown.try_trigger(10.0));
    }

    #[test]
    fn next_press_respects_cooldown() {
        let (mut session, _log) = session(vec![BoxColor::Red; 4]);
        let out = session.handle(Event::NextBoxPressed, 0.0);
        assert!(out.contains(&Command::SpawnBox {
            id: BoxId(0),
            color: BoxColor::Red
        }));
        let out = session.handle(Event::NextBoxPressed, 5.0);
        assert!(!out.iter().any(|c| matches!(c, Command::SpawnBox { .. } | Command::PlayClip(_))));
        let out = session.handle(Event::NextBoxPressed, 10.0);
        assert!(out.iter().any(|c| matches!(c, Command::SpawnBox { id: BoxId(1), .. })));
    }

    #[test]
    fn start_message_after_delay() {
        let (mut session, _log) = session(vec![BoxColor::Red; 4]);
        assert!(session.tick(1.9).is_empty());
        let out = session.tick(2.0);
        assert!(matches!(
            out.as_slice(),
            [Command::ShowPrompt {
                display: PromptDisplay::Timed(_),
                ..
            }]
        ));
        assert!(session.tick(3.0).is_empty());
    }

    #[test]
    fn compressor_button_finalizes_after_delay() {
        let (mut session, log) = session(vec![BoxColor::AmbiguousPink; 4]);
        session.handle(Event::NextBoxPressed, 0.0);
        session.handle(Event::BoxEnteredArea {
            id: BoxId(0),
            area: Area::Compressor,
        }, 3.0);

        let out = session.handle(Event::CompressorButtonPressed, 4.0);
        assert!(matches!(out.as_slice(), [Command::PlayClip(_)]));
        assert!(log.box_rows().is_empty());

        let out = session.tick(5.0);
        assert!(out.contains(&Command::DestroyBox(BoxId(0))));
        assert_eq!(log.box_rows().len(), 1);
        assert!(session.handle(Event::CompressorButtonPressed, 6.0).is_empty());
    }

    #[test]
    fn ended_session_ignores_events() {
        let (mut session, _log) = session(vec![BoxColor::Red; 4]);
        let out = session.shutdown();
        assert_eq!(out, vec![Command::EndSession]);
        assert!(session.is_ended());
        assert!(session.handle(Event::NextBoxPressed, 1.0).is_empty());
        assert!(session.tick(100.0).is_empty());
        assert!(session.shutdown().is_empty());
    }
}
