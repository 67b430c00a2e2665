use boxsort_core::config::{ExperimentConfig, FlowConfig};
use boxsort_core::test_harness::{run_simulator, SimulatorConfig};
use boxsort_core::types::Condition;

#[test]
fn default_simulation_passes() {
    let report = run_simulator(SimulatorConfig::default().with_sessions(10));
    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stats.sessions_ended, 10);
    assert_eq!(report.stats.boxes_spawned, 160);
    assert!(report.stats.correctly_sorted > 0);
    assert!(report.generate_text().contains("PASSED"));
}

#[test]
fn simulation_passes_across_seeds_and_variants() {
    for seed in [1, 2, 3, 99, 12_345] {
        let experiment = ExperimentConfig::default()
            .with_participant("SIM")
            .with_condition(Condition::Cooperation)
            .with_total_boxes(8)
            .with_flow(FlowConfig::default().with_cycle_finalizes_compressor(seed % 2 == 0));
        let report = run_simulator(
            SimulatorConfig::default()
                .with_seed(seed)
                .with_sessions(4)
                .with_accuracy(0.5)
                .with_experiment(experiment),
        );
        assert!(report.passed(), "seed {seed}:\n{}", report.generate_text());
    }
}

#[test]
fn sloppy_participants_get_asked_about_leftovers() {
    let report = run_simulator(
        SimulatorConfig::default()
            .with_sessions(5)
            .with_accuracy(0.0),
    );
    assert!(report.passed(), "{}", report.generate_text());
    assert!(report.stats.questions_asked > 0);
    assert_eq!(
        report.stats.answers_agree + report.stats.answers_disagree,
        report.stats.questions_asked
    );
}

#[test]
fn report_serializes_to_json() {
    let report = run_simulator(SimulatorConfig::default().with_sessions(1));
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stats"]["sessions_run"], 1);
    assert!(value["violations"].as_array().unwrap().is_empty());
}
