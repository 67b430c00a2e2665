//! Prompt state machine
//!
//! Decides what the robot is saying:
//! - Timed prompts replace each other and hide at their deadline
//! - A blocking yes/no prompt excludes every other prompt until answered
//! - Ambiguous-box suggestions are queued and shown one at a time
//! - Compliments never repeat back to back

mod catalog;

pub use catalog::{ClipId, PromptCatalog, PromptLine, PromptTiming};

use crate::error::PromptError;
use crate::event::{Command, PromptDisplay};
use crate::types::{Answer, BoxId, Condition};
use indexmap::IndexSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Idle,
    ShowingPrompt,
    WaitingForResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    None,
    Normal,
    Ambiguous,
}

/// What happened to an ambiguous-box pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguousOutcome {
    /// Suggestion shown immediately
    Shown,
    /// Another suggestion is showing; this one follows it
    Queued,
    /// Box triggered a suggestion before
    AlreadyTriggered,
    /// Every suggestion was already used
    Exhausted,
    /// The yes/no prompt is showing
    Blocked,
}

#[derive(Debug)]
pub struct PromptStateMachine {
    catalog: PromptCatalog,
    timing: PromptTiming,
    state: PromptState,
    kind: PromptKind,
    text: Option<String>,
    deadline: Option<f64>,
    triggered: IndexSet<BoxId>,
    ambiguous_shown: usize,
    pending_ambiguous: usize,
    last_compliment: Option<usize>,
    rng: StdRng,
}

impl PromptStateMachine {
    #[must_use]
    pub fn new(catalog: PromptCatalog, timing: PromptTiming, seed: u64) -> Self {
        Self {
            catalog,
            timing,
            state: PromptState::Idle,
            kind: PromptKind::None,
            text: None,
            deadline: None,
            triggered: IndexSet::new(),
            ambiguous_shown: 0,
            pending_ambiguous: 0,
            last_compliment: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn state(&self) -> PromptState {
        self.state
    }

    #[must_use]
    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Text currently on screen
    #[must_use]
    pub fn current_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// When the timed prompt on screen hides
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    #[must_use]
    pub fn pending_ambiguous(&self) -> usize {
        self.pending_ambiguous
    }

    #[must_use]
    pub fn ambiguous_shown(&self) -> usize {
        self.ambiguous_shown
    }

    #[must_use]
    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn timing(&self) -> &PromptTiming {
        &self.timing
    }

    /// Show a prompt for `duration` seconds, replacing any timed prompt.
    ///
    /// The replaced prompt's end handling does not run.
    pub fn show_timed(
        &mut self,
        line: PromptLine,
        duration: f64,
        kind: PromptKind,
        now: f64,
        out: &mut Vec<Command>,
    ) -> Result<(), PromptError> {
        if self.state == PromptState::WaitingForResponse {
            tracing::warn!(text = %line.text, "prompt rejected while awaiting a response");
            return Err(PromptError::AwaitingResponse);
        }
        if self.state == PromptState::ShowingPrompt {
            tracing::debug!(replaced = ?self.text, "prompt preempted");
        }

        self.state = PromptState::ShowingPrompt;
        self.kind = kind;
        self.deadline = Some(now + duration);
        self.text = Some(line.text.clone());
        out.push(Command::ShowPrompt {
            text: line.text,
            display: PromptDisplay::Timed(duration),
            clip: line.clip,
        });
        Ok(())
    }

    /// Show a line using the length-based duration rule
    pub fn show_line(
        &mut self,
        line: PromptLine,
        multiplier: f64,
        now: f64,
        out: &mut Vec<Command>,
    ) -> Result<(), PromptError> {
        let duration = self.timing.duration_for(&line.text, multiplier);
        self.show_timed(line, duration, PromptKind::Normal, now, out)
    }

    /// Show a yes/no prompt that stays until answered
    pub fn show_blocking_choice(
        &mut self,
        line: PromptLine,
        out: &mut Vec<Command>,
    ) -> Result<(), PromptError> {
        if self.state == PromptState::WaitingForResponse {
            tracing::warn!(text = %line.text, "yes/no prompt already showing");
            return Err(PromptError::AwaitingResponse);
        }

        self.state = PromptState::WaitingForResponse;
        self.kind = PromptKind::Normal;
        self.deadline = None;
        self.text = Some(line.text.clone());
        out.push(Command::ShowPrompt {
            text: line.text,
            display: PromptDisplay::Blocking,
            clip: line.clip,
        });
        Ok(())
    }

    /// Resolve the yes/no prompt
    pub fn answer(&mut self, answer: Answer, out: &mut Vec<Command>) -> Result<Answer, PromptError> {
        if self.state != PromptState::WaitingForResponse {
            tracing::warn!(%answer, "answer without a pending question ignored");
            return Err(PromptError::NoResponsePending);
        }
        self.clear();
        out.push(Command::HidePrompt);
        Ok(answer)
    }

    /// Hide the timed prompt once its deadline passed.
    ///
    /// Returns the kind of the prompt that ended.
    pub fn tick(&mut self, now: f64, out: &mut Vec<Command>) -> Option<PromptKind> {
        if self.state != PromptState::ShowingPrompt {
            return None;
        }
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        let ended = self.kind;
        self.clear();
        out.push(Command::HidePrompt);
        if ended == PromptKind::Ambiguous {
            self.continue_ambiguous_queue(now, out);
        }
        Some(ended)
    }

    /// An ambiguous box was picked up
    pub fn on_ambiguous_box_picked(
        &mut self,
        id: BoxId,
        now: f64,
        out: &mut Vec<Command>,
    ) -> AmbiguousOutcome {
        if !self.triggered.insert(id) {
            return AmbiguousOutcome::AlreadyTriggered;
        }
        if self.ambiguous_shown + self.pending_ambiguous >= self.catalog.ambiguous.len() {
            tracing::debug!(box_id = %id, "ambiguous suggestions exhausted");
            return AmbiguousOutcome::Exhausted;
        }
        match (self.state, self.kind) {
            (PromptState::WaitingForResponse, _) => {
                tracing::warn!(box_id = %id, "ambiguous suggestion dropped while awaiting a response");
                AmbiguousOutcome::Blocked
            }
            (PromptState::ShowingPrompt, PromptKind::Ambiguous) => {
                self.pending_ambiguous += 1;
                AmbiguousOutcome::Queued
            }
            _ => match self.show_next_ambiguous(now, out) {
                Ok(()) => AmbiguousOutcome::Shown,
                Err(_) => AmbiguousOutcome::Blocked,
            },
        }
    }

    /// Random encouragement, never the same line twice in a row
    pub fn show_compliment(&mut self, now: f64, out: &mut Vec<Command>) -> Result<(), PromptError> {
        let count = self.catalog.positive.len();
        if count == 0 {
            return Err(PromptError::EmptyCatalog("positive"));
        }
        let mut index = self.rng.random_range(0..count);
        if count > 1 {
            while Some(index) == self.last_compliment {
                index = self.rng.random_range(0..count);
            }
        }
        let line = self.catalog.positive[index].clone();
        self.show_line(line, 1.0, now, out)?;
        self.last_compliment = Some(index);
        Ok(())
    }

    /// Condition-specific greeting
    pub fn show_start_message(
        &mut self,
        condition: Condition,
        now: f64,
        out: &mut Vec<Command>,
    ) -> Result<(), PromptError> {
        let line = self.catalog.start_message(condition).clone();
        let multiplier = self.timing.start_multiplier;
        self.show_line(line, multiplier, now, out)
    }

    /// Fixed-duration end-of-shift message
    pub fn show_end_message(
        &mut self,
        line: PromptLine,
        now: f64,
        out: &mut Vec<Command>,
    ) -> Result<(), PromptError> {
        let duration = self.timing.end_message_duration;
        self.show_timed(line, duration, PromptKind::Normal, now, out)
    }

    fn show_next_ambiguous(&mut self, now: f64, out: &mut Vec<Command>) -> Result<(), PromptError> {
        let count = self.catalog.ambiguous.len();
        if count == 0 {
            return Err(PromptError::EmptyCatalog("ambiguous"));
        }
        let line = self.catalog.ambiguous[self.ambiguous_shown % count].clone();
        let duration = self.timing.ambiguous_duration;
        self.show_timed(line, duration, PromptKind::Ambiguous, now, out)?;
        self.ambiguous_shown += 1;
        Ok(())
    }

    fn continue_ambiguous_queue(&mut self, now: f64, out: &mut Vec<Command>) {
        if self.pending_ambiguous == 0 || self.ambiguous_shown >= self.catalog.ambiguous.len() {
            self.kind = PromptKind::None;
            return;
        }
        self.pending_ambiguous -= 1;
        if let Err(err) = self.show_next_ambiguous(now, out) {
            tracing::warn!(%err, "queued ambiguous suggestion not shown");
        }
    }

    fn clear(&mut self) {
        self.state = PromptState::Idle;
        self.kind = PromptKind::None;
        self.text = None;
        self.deadline = None;
    }
}
