//! Flow coordinator
//!
//! Runs the next-box cycle over the store, scene, tracker and prompts:
//! 1. Record the request time
//! 2. Log boxes still without a terminal placement
//! 3. Derive pending hesitation times
//! 4. Finalize boxes in the swept bins
//! 5. Record boxes resting on the floor, table, drawer or compressor
//! 6. Flush the log
//! 7. Compliment a correct placement
//! 8. Spawn the next box, or start the end of the shift

mod end_shift;

pub use end_shift::{EndShiftSequence, EndShiftStage, EndShiftStep};

use crate::config::FlowConfig;
use crate::datalog::{BoxRow, EndRow, LogRow, LogSink, SessionLabels};
use crate::event::Command;
use crate::finalization::{FinalizationTracker, FinalizeOutcome};
use crate::prompt::PromptStateMachine;
use crate::scene::Scene;
use crate::spawner::BoxSpawner;
use crate::store::BoxRecordStore;
use crate::types::{Answer, Area, BoxId, Placement};
use indexmap::IndexSet;
use std::cell::Cell;
use std::rc::Rc;

/// What one cycle or sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Boxes finalized, in order
    pub finalized: Vec<BoxId>,
    /// At least one finalized box was sorted correctly
    pub any_correct: bool,
    /// The finalized total was reached
    pub threshold_reached: bool,
    pub spawned: Option<BoxId>,
    /// All-boxes-handled ran during this cycle
    pub all_handled: bool,
}

impl CycleReport {
    fn merge(&mut self, other: CycleReport) {
        self.finalized.extend(other.finalized);
        self.any_correct |= other.any_correct;
        self.threshold_reached |= other.threshold_reached;
    }
}

pub struct FlowCoordinator {
    labels: SessionLabels,
    config: FlowConfig,
    store: BoxRecordStore,
    tracker: FinalizationTracker,
    scene: Scene,
    spawner: BoxSpawner,
    prompts: PromptStateMachine,
    log: Box<dyn LogSink>,
    end_shift: EndShiftSequence,
    end_answer: Option<Answer>,
    sorted: IndexSet<BoxId>,
    all_finalized: Rc<Cell<bool>>,
    ended: bool,
}

impl FlowCoordinator {
    #[must_use]
    pub fn new(
        labels: SessionLabels,
        config: FlowConfig,
        spawner: BoxSpawner,
        prompts: PromptStateMachine,
        log: Box<dyn LogSink>,
    ) -> Self {
        let all_finalized = Rc::new(Cell::new(false));
        let mut tracker = FinalizationTracker::new(spawner.total());
        let flag = Rc::clone(&all_finalized);
        tracker.subscribe(move |_| flag.set(true));

        Self {
            labels,
            config,
            store: BoxRecordStore::new(),
            tracker,
            scene: Scene::new(),
            spawner,
            prompts,
            log,
            end_shift: EndShiftSequence::new(),
            end_answer: None,
            sorted: IndexSet::new(),
            all_finalized,
            ended: false,
        }
    }

    /// The next-box cycle
    pub fn request_next(&mut self, now: f64, out: &mut Vec<Command>) -> CycleReport {
        let mut report = CycleReport::default();
        if self.ended {
            return report;
        }

        self.store.record_request(now);
        self.log_unresolved(now);
        self.store.derive_pending_hesitations(now);
        for area in self.config.swept_areas() {
            let sweep = self.sweep_area(area, now, out);
            report.merge(sweep);
        }
        self.settle_resting_boxes(now);
        self.flush_log();

        if report.any_correct {
            if let Err(err) = self.prompts.show_compliment(now, out) {
                tracing::warn!(%err, "compliment not shown");
            }
        }

        if self.all_finalized.get() || self.spawner.all_spawned() {
            self.all_boxes_handled(now, out);
            report.all_handled = true;
        } else {
            report.spawned = self.spawn_next(now, out);
            report.all_handled = report.spawned.is_none();
        }

        tracing::debug!(
            finalized = report.finalized.len(),
            any_correct = report.any_correct,
            spawned = ?report.spawned,
            "next-box cycle complete"
        );
        report
    }

    /// Spawn the next scheduled box; an exhausted schedule ends the shift
    pub fn spawn_next(&mut self, now: f64, out: &mut Vec<Command>) -> Option<BoxId> {
        let Some((id, color)) = self.spawner.spawn_next() else {
            self.all_boxes_handled(now, out);
            return None;
        };
        self.store.record_spawn(id, color, now);
        self.scene.insert(id, color);
        out.push(Command::SpawnBox { id, color });
        Some(id)
    }

    pub fn on_box_picked_up(&mut self, id: BoxId, now: f64, out: &mut Vec<Command>) {
        if !self.store.record_pickup(id, now) {
            return;
        }
        let ambiguous = self
            .store
            .try_get(id)
            .is_some_and(|record| record.color().is_ambiguous());
        if ambiguous {
            self.on_ambiguous_box_picked(id, now, out);
        }
    }

    pub fn on_ambiguous_box_picked(&mut self, id: BoxId, now: f64, out: &mut Vec<Command>) {
        if self.store.try_get(id).is_none() {
            tracing::warn!(box_id = %id, "ambiguous pickup for unknown box ignored");
            return;
        }
        let outcome = self.prompts.on_ambiguous_box_picked(id, now, out);
        tracing::debug!(box_id = %id, ?outcome, "ambiguous box picked");
    }

    pub fn on_area_entered(&mut self, id: BoxId, area: Area) {
        if !self.scene.enter(id, area) {
            tracing::warn!(box_id = %id, %area, "area entry for unknown box ignored");
        }
    }

    pub fn on_area_exited(&mut self, id: BoxId, area: Area) {
        if !self.scene.exit(id, area) {
            tracing::warn!(box_id = %id, %area, "area exit for unknown box ignored");
        }
    }

    /// Finalize the compressor's contents, as the compressor button does
    pub fn compress(&mut self, now: f64, out: &mut Vec<Command>) -> CycleReport {
        let mut report = self.sweep_area(Area::Compressor, now, out);
        self.flush_log();
        if self.all_finalized.get() {
            self.all_boxes_handled(now, out);
            report.all_handled = true;
        }
        report
    }

    /// Finalize every remaining box and start the end of the shift
    pub fn all_boxes_handled(&mut self, now: f64, out: &mut Vec<Command>) {
        self.finalize_remaining(now, out);
        self.flush_log();
        self.all_finalized.set(false);
        self.end_shift.start(&mut self.prompts, now, out);
    }

    /// Participant answered the leftover question
    pub fn on_answer(&mut self, answer: Answer, now: f64, out: &mut Vec<Command>) {
        let Some(answer) = self.end_shift.on_answer(&mut self.prompts, answer, now, out) else {
            return;
        };
        self.end_answer = Some(answer);
        self.log.append(LogRow::End(EndRow {
            participant_id: self.labels.participant_id.clone(),
            condition: self.labels.condition,
            response_time: now - self.store.last_request_time(),
            answer,
        }));
        self.flush_log();
        tracing::info!(%answer, "leftover question answered");
    }

    /// Advance prompt and end-of-shift deadlines
    pub fn tick(&mut self, now: f64, out: &mut Vec<Command>) {
        if self.ended {
            return;
        }
        self.prompts.tick(now, out);
        let step = self
            .end_shift
            .advance(&mut self.prompts, self.scene.is_empty(), now, out);
        if step == EndShiftStep::Finished {
            self.end_session(out);
        }
    }

    /// Flush the log and tell the host to end the session. Terminal.
    pub fn end_session(&mut self, out: &mut Vec<Command>) {
        if self.ended {
            return;
        }
        self.flush_log();
        self.ended = true;
        out.push(Command::EndSession);
        tracing::info!(
            finalized = self.tracker.finalized_count(),
            sorted = self.sorted.len(),
            "session ended"
        );
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn store(&self) -> &BoxRecordStore {
        &self.store
    }

    #[must_use]
    pub fn tracker(&self) -> &FinalizationTracker {
        &self.tracker
    }

    /// For registering all-handled listeners
    pub fn tracker_mut(&mut self) -> &mut FinalizationTracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn spawner(&self) -> &BoxSpawner {
        &self.spawner
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptStateMachine {
        &self.prompts
    }

    pub fn prompts_mut(&mut self) -> &mut PromptStateMachine {
        &mut self.prompts
    }

    #[must_use]
    pub fn end_shift_stage(&self) -> EndShiftStage {
        self.end_shift.stage()
    }

    #[must_use]
    pub fn end_answer(&self) -> Option<Answer> {
        self.end_answer
    }

    /// Boxes whose final placement is a colored bin
    #[must_use]
    pub fn sorted_count(&self) -> usize {
        self.sorted.len()
    }

    #[must_use]
    pub fn labels(&self) -> &SessionLabels {
        &self.labels
    }

    fn log_unresolved(&mut self, now: f64) {
        for (id, entry) in self.scene.iter() {
            if entry.placement.is_terminal() {
                continue;
            }
            if let Some(record) = self.store.try_get_mut(id) {
                record.record_placement(now, entry.placement);
            }
        }
    }

    fn sweep_area(&mut self, area: Area, now: f64, out: &mut Vec<Command>) -> CycleReport {
        let mut report = CycleReport::default();
        for id in self.scene.boxes_in(area) {
            self.store.record_next_request(id, now);
            let Some(record) = self.store.try_get_mut(id) else {
                tracing::warn!(box_id = %id, %area, "box in bin has no record");
                continue;
            };
            let correct = record.place_in_bin(area, now);
            if let Some(outcome) = self.finalize_box(id, out) {
                report.threshold_reached |= outcome.threshold_reached();
                if outcome.is_new() {
                    report.finalized.push(id);
                    report.any_correct |= correct;
                }
            }
            self.scene.remove(id);
            out.push(Command::DestroyBox(id));
        }
        report
    }

    fn settle_resting_boxes(&mut self, now: f64) {
        for (id, entry) in self.scene.iter() {
            let current = entry.placement;
            if !matches!(
                current,
                Placement::Floor | Placement::Table | Placement::YellowDrawer | Placement::Compressor
            ) {
                continue;
            }
            let Some(record) = self.store.try_get_mut(id) else {
                continue;
            };
            if record
                .last_placement()
                .is_some_and(|last| current.matches_logged(last))
            {
                continue;
            }
            record.set_final_placement_if_default(current);
            record.record_placement(now, history_tag(current));
            record.mark_incorrect();
        }
    }

    fn finalize_remaining(&mut self, now: f64, out: &mut Vec<Command>) {
        for area in self.config.swept_areas() {
            self.sweep_area(area, now, out);
        }

        for id in self.scene.ids() {
            let Some(current) = self.scene.get(id).map(|entry| entry.placement) else {
                continue;
            };
            let Some(record) = self.store.try_get_mut(id) else {
                tracing::warn!(box_id = %id, "remaining box has no record");
                continue;
            };
            if record.final_placement() == Placement::Other {
                let settled = if current.is_unresolved() {
                    Placement::Floor
                } else {
                    current
                };
                let logged = record
                    .last_placement()
                    .is_some_and(|last| settled.matches_logged(last));
                if !logged {
                    record.record_placement(now, history_tag(settled));
                }
                record.set_final_placement_if_default(settled);
            }
            self.finalize_box(id, out);
        }
    }

    fn finalize_box(&mut self, id: BoxId, out: &mut Vec<Command>) -> Option<FinalizeOutcome> {
        let Some(record) = self.store.try_get(id) else {
            tracing::warn!(box_id = %id, "finalize skipped for unknown box");
            return None;
        };
        let outcome = self.tracker.finalize(id);
        if outcome.is_new() {
            let row = BoxRow::from_record(&self.labels, record, self.end_answer);
            self.log.append(LogRow::Box(row));
            if record.final_placement().is_color_bin() && self.sorted.insert(id) {
                out.push(Command::SortedCount(self.sorted.len()));
            }
            tracing::debug!(box_id = %id, placement = %record.final_placement(), "box finalized");
        }
        Some(outcome)
    }

    fn flush_log(&mut self) {
        if let Err(err) = self.log.flush() {
            tracing::warn!(%err, "failed to flush experiment log");
        }
    }
}

/// Tag written to the history for a resting location
fn history_tag(placement: Placement) -> Placement {
    if placement == Placement::Compressor {
        Placement::CompressorWithoutButton
    } else {
        placement
    }
}
