use boxsort_core::config::CooldownConfig;
use boxsort_core::datalog::LogRow;
use boxsort_core::event::{Command, Event};
use boxsort_core::flow::EndShiftStage;
use boxsort_core::prompt::PromptCatalog;
use boxsort_core::types::{Answer, Area, BoxColor, BoxId, Placement};
use boxsort_test_utils::{test_config, SessionHarness};
use pretty_assertions::assert_eq;

fn fast_buttons() -> CooldownConfig {
    CooldownConfig {
        next_box: 0.5,
        ..CooldownConfig::default()
    }
}

#[test]
fn red_box_sorted_correctly() {
    let config = test_config().with_cooldowns(fast_buttons());
    let mut h = SessionHarness::with_config(
        config,
        &[BoxColor::Red, BoxColor::Green, BoxColor::Blue, BoxColor::Green],
    );

    h.press_next();
    h.advance_to(1.5);
    h.press_next();
    h.advance_to(2.0);
    h.pick_up(0);
    h.enter(0, Area::RedBin);
    h.advance_to(5.0);
    let out = h.press_next();

    assert!(out.contains(&Command::DestroyBox(BoxId(0))));
    let record = h.session.flow().store().try_get(BoxId(0)).unwrap();
    assert!(record.was_correct());
    assert_eq!(record.final_placement(), Placement::RedBin);

    let rows = h.log.box_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        LogRow::Box(rows[0].clone()).to_line(),
        "P01;Cooperation;0;Red;0.00;0.50;3.00;\"[1.50: SomewhereElse], [5.00: RedBin]\";Yes;No end prompt"
    );
    assert_eq!(h.log.pending_len(), 0);
}

#[test]
fn ambiguous_suggestions_play_one_at_a_time() {
    let config = test_config().with_cooldowns(fast_buttons());
    let mut h = SessionHarness::with_config(
        config,
        &[
            BoxColor::AmbiguousPink,
            BoxColor::AmbiguousCyan,
            BoxColor::AmbiguousPurple,
            BoxColor::AmbiguousPink,
        ],
    );
    for t in [3.0, 4.0, 5.0, 6.0] {
        h.advance_to(t);
        h.press_next();
    }

    h.advance_to(6.5);
    h.pick_up(0);
    h.advance_to(7.0);
    h.pick_up(1);
    h.advance_to(7.5);
    h.pick_up(2);
    h.advance_to(8.0);
    h.send(Event::AmbiguousBoxPicked(BoxId(0)));

    let catalog = PromptCatalog::default();
    let suggestions: Vec<String> = catalog.ambiguous.iter().map(|l| l.text.clone()).collect();
    let shown = |h: &SessionHarness| -> Vec<String> {
        h.shown_texts()
            .into_iter()
            .filter(|text| suggestions.contains(text))
            .collect()
    };

    h.advance_to(12.0);
    assert_eq!(shown(&h), suggestions[..1].to_vec());
    h.advance_to(13.0);
    assert_eq!(shown(&h), suggestions[..2].to_vec());

    h.pick_up(3);
    h.advance_to(30.0);
    assert_eq!(shown(&h), suggestions);
}

#[test]
fn empty_scene_skips_leftover_question() {
    let colors = [BoxColor::Red, BoxColor::Green, BoxColor::Blue, BoxColor::Red];
    let mut h = SessionHarness::new(&colors);

    let mut t = 3.0;
    for (id, color) in colors.iter().enumerate() {
        h.advance_to(t);
        h.press_next();
        h.advance_to(t + 1.0);
        let id = u32::try_from(id).unwrap();
        h.pick_up(id);
        h.enter(id, color.target_area().unwrap());
        t += 10.0;
    }
    h.advance_to(t);
    h.press_next();
    assert!(matches!(
        h.session.flow().end_shift_stage(),
        EndShiftStage::PreEnd { .. }
    ));

    h.advance_to(t + 11.0);
    assert!(h.ended());
    assert!(h.session.is_ended());
    assert_eq!(h.blocking_prompts(), 0);
    assert_eq!(h.log.box_rows().len(), 4);
    assert!(h.log.box_rows().iter().all(|row| row.correct));
    assert!(h.log.end_rows().is_empty());
    assert!(h.commands.contains(&Command::SortedCount(4)));

    let shown = h.shown_texts();
    let catalog = PromptCatalog::default();
    let pre_end = shown.iter().position(|s| *s == catalog.pre_end_shift.text).unwrap();
    let farewell = shown.iter().position(|s| *s == catalog.end_shift.text).unwrap();
    assert!(pre_end < farewell);
}

#[test]
fn leftovers_prompt_for_an_answer() {
    let colors = [BoxColor::Red, BoxColor::Green, BoxColor::Blue, BoxColor::Red];
    let mut h = SessionHarness::new(&colors);

    let mut t = 3.0;
    for id in 0..4 {
        h.advance_to(t);
        h.press_next();
        h.advance_to(t + 1.0);
        h.pick_up(id);
        h.enter(id, Area::Table);
        t += 10.0;
    }
    h.advance_to(t);
    h.press_next();
    h.advance_to(t + 5.0);
    assert_eq!(h.blocking_prompts(), 1);
    assert_eq!(
        h.session.flow().end_shift_stage(),
        EndShiftStage::AwaitingAnswer
    );

    h.advance_to(t + 60.0);
    assert!(!h.session.is_ended());

    h.answer(false);
    h.answer(true);
    let ends = h.log.end_rows();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].answer, Answer::Disagree);
    assert!((ends[0].response_time - 60.0).abs() < 1e-6);

    h.advance_to(t + 66.0);
    assert!(h.session.is_ended());
    let rows = h.log.box_rows();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert!(!row.correct);
        assert!(row.placement_history.contains("Table"));
    }
    assert_eq!(h.session.flow().sorted_count(), 0);
}

#[test]
fn wandering_box_lands_on_the_floor() {
    let mut h = SessionHarness::new(&[BoxColor::Blue]);
    h.advance_to(3.0);
    h.press_next();
    h.advance_to(4.0);
    h.pick_up(0);
    h.enter(0, Area::Table);
    h.exit(0, Area::Table);
    h.advance_to(13.0);
    h.press_next();

    let record = h.session.flow().store().try_get(BoxId(0)).unwrap();
    assert_eq!(record.final_placement(), Placement::Floor);
    let tags: Vec<Placement> = record.history().iter().map(|e| e.placement).collect();
    assert_eq!(tags, vec![Placement::Other, Placement::Floor]);
    assert_eq!(record.hesitation_time(), Some(9.0));
}

#[test]
fn ended_session_ignores_input() {
    let mut h = SessionHarness::new(&[BoxColor::Green]);
    h.advance_to(3.0);
    h.press_next();
    h.enter(0, Area::GreenBin);
    h.advance_to(13.0);
    h.press_next();
    h.advance_to(30.0);
    assert!(h.ended());

    let rows_before = h.log.rows().len();
    h.advance_to(45.0);
    assert!(h.press_next().is_empty());
    assert!(h.answer(true).is_empty());
    assert_eq!(h.log.rows().len(), rows_before);
    assert_eq!(
        h.commands
            .iter()
            .filter(|c| **c == Command::EndSession)
            .count(),
        1
    );
}

#[test]
fn compressor_button_logs_hesitation_of_picked_up_box() {
    let mut h = SessionHarness::new(&[
        BoxColor::AmbiguousPink,
        BoxColor::Red,
        BoxColor::Red,
        BoxColor::Red,
    ]);
    h.advance_to(3.0);
    h.press_next();
    h.advance_to(4.0);
    h.pick_up(0);
    h.enter(0, Area::Compressor);
    h.advance_to(6.0);
    h.send(Event::CompressorButtonPressed);
    h.advance_to(8.0);

    let rows = h.log.box_rows();
    assert_eq!(rows.len(), 1);
    let logged = rows[0].hesitation_time;
    assert!((2.95..3.15).contains(&logged), "hesitation {logged}");

    h.advance_to(14.0);
    h.press_next();
    let record = h.session.flow().store().try_get(BoxId(0)).unwrap();
    assert_eq!(record.hesitation_time(), Some(logged));
    assert_eq!(record.final_placement(), Placement::Compressor);
}
