//! End-of-shift sequence
//!
//! Pre-end message, then either the farewell (empty scene) or the yes/no
//! question about the leftover boxes followed by the farewell. Each stage
//! carries its own deadline so a preempted prompt cannot stall the sequence.

use crate::event::Command;
use crate::prompt::PromptStateMachine;
use crate::types::Answer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndShiftStage {
    NotStarted,
    PreEnd { until: f64 },
    AwaitingAnswer,
    Farewell { until: f64 },
    Finished,
}

/// Result of advancing the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndShiftStep {
    Idle,
    Advanced,
    /// Farewell finished; the session must end now
    Finished,
}

#[derive(Debug, Clone)]
pub struct EndShiftSequence {
    stage: EndShiftStage,
}

impl Default for EndShiftSequence {
    fn default() -> Self {
        Self {
            stage: EndShiftStage::NotStarted,
        }
    }
}

impl EndShiftSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stage(&self) -> EndShiftStage {
        self.stage
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.stage != EndShiftStage::NotStarted
    }

    /// Begin with the pre-end message. Runs only once per session.
    pub fn start(&mut self, prompts: &mut PromptStateMachine, now: f64, out: &mut Vec<Command>) -> bool {
        if self.is_started() {
            tracing::debug!("end of shift already started");
            return false;
        }
        let line = prompts.catalog().pre_end_shift.clone();
        if let Err(err) = prompts.show_end_message(line, now, out) {
            tracing::warn!(%err, "pre-end message not shown");
        }
        self.stage = EndShiftStage::PreEnd {
            until: now + prompts.timing().end_message_duration,
        };
        tracing::info!("end of shift started");
        true
    }

    /// Move past any stage whose deadline passed
    pub fn advance(
        &mut self,
        prompts: &mut PromptStateMachine,
        scene_empty: bool,
        now: f64,
        out: &mut Vec<Command>,
    ) -> EndShiftStep {
        match self.stage {
            EndShiftStage::PreEnd { until } if now >= until => {
                if scene_empty {
                    self.farewell(prompts, now, out);
                    return EndShiftStep::Advanced;
                }
                let line = prompts.catalog().discard_leftovers.clone();
                match prompts.show_blocking_choice(line, out) {
                    Ok(()) => self.stage = EndShiftStage::AwaitingAnswer,
                    Err(err) => {
                        tracing::warn!(%err, "leftover question not shown");
                        self.farewell(prompts, now, out);
                    }
                }
                EndShiftStep::Advanced
            }
            EndShiftStage::Farewell { until } if now >= until => {
                self.stage = EndShiftStage::Finished;
                EndShiftStep::Finished
            }
            _ => EndShiftStep::Idle,
        }
    }

    /// Resolve the leftover question. Returns the answer when it was accepted.
    pub fn on_answer(
        &mut self,
        prompts: &mut PromptStateMachine,
        answer: Answer,
        now: f64,
        out: &mut Vec<Command>,
    ) -> Option<Answer> {
        if self.stage != EndShiftStage::AwaitingAnswer {
            tracing::warn!(%answer, "answer outside the leftover question ignored");
            return None;
        }
        let answer = prompts.answer(answer, out).ok()?;
        self.farewell(prompts, now, out);
        Some(answer)
    }

    fn farewell(&mut self, prompts: &mut PromptStateMachine, now: f64, out: &mut Vec<Command>) {
        let line = prompts.catalog().end_shift.clone();
        if let Err(err) = prompts.show_end_message(line, now, out) {
            tracing::warn!(%err, "farewell not shown");
        }
        self.stage = EndShiftStage::Farewell {
            until: now + prompts.timing().end_message_duration,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PromptCatalog, PromptState, PromptTiming};

    fn prompts() -> PromptStateMachine {
        PromptStateMachine::new(PromptCatalog::default(), PromptTiming::default(), 1)
    }

    #[test]
    fn empty_scene_goes_straight_to_farewell() {
        let mut prompts = prompts();
        let mut seq = EndShiftSequence::new();
        let mut out = Vec::new();

        assert!(seq.start(&mut prompts, 10.0, &mut out));
        assert!(!seq.start(&mut prompts, 11.0, &mut out));
        assert_eq!(seq.advance(&mut prompts, true, 14.0, &mut out), EndShiftStep::Idle);
        assert_eq!(seq.advance(&mut prompts, true, 15.0, &mut out), EndShiftStep::Advanced);
        assert!(matches!(seq.stage(), EndShiftStage::Farewell { .. }));
        assert_eq!(seq.advance(&mut prompts, true, 20.0, &mut out), EndShiftStep::Finished);
        assert_eq!(seq.stage(), EndShiftStage::Finished);
    }

    #[test]
    fn leftovers_wait_for_an_answer() {
        let mut prompts = prompts();
        let mut seq = EndShiftSequence::new();
        let mut out = Vec::new();

        seq.start(&mut prompts, 0.0, &mut out);
        assert_eq!(seq.on_answer(&mut prompts, Answer::Agree, 1.0, &mut out), None);
        seq.advance(&mut prompts, false, 5.0, &mut out);
        assert_eq!(seq.stage(), EndShiftStage::AwaitingAnswer);
        assert_eq!(prompts.state(), PromptState::WaitingForResponse);

        assert_eq!(seq.advance(&mut prompts, false, 500.0, &mut out), EndShiftStep::Idle);
        assert_eq!(
            seq.on_answer(&mut prompts, Answer::Disagree, 501.0, &mut out),
            Some(Answer::Disagree)
        );
        assert_eq!(seq.stage(), EndShiftStage::Farewell { until: 506.0 });
        assert_eq!(seq.on_answer(&mut prompts, Answer::Agree, 502.0, &mut out), None);
    }
}
