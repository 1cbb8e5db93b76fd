use std::io::Write;
use std::thread;
use std::time::Duration;
use proptest::prelude::*;
use crate::cache::CacheState;
use crate::config::{MappingKind, PolicyKind, SimulationConfig};
use crate::error::SimulationError;
use crate::simulator::{simulate, AccessResult, NoObserver, Recorder, Simulator};
use crate::trace::{parse_trace, read_trace_file};
use crate::util::{config_for, looping_trace, synthetic_trace, MAPPINGS, POLICIES};

fn record(config: &SimulationConfig, trace: &[u64]) -> Recorder {
    let mut simulator = Simulator::new(config, Recorder::default()).unwrap();
    simulator.run(trace.iter().copied());
    simulator.into_observer()
}

fn single_set(policy: PolicyKind) -> SimulationConfig {
    config_for(2, 2, policy, MappingKind::SetAssociative)
}

#[test]
fn lifo_single_set_scenario() {
    let config = single_set(PolicyKind::Lifo);
    let recorder = record(&config, &[1, 2, 3, 1]);
    assert_eq!(recorder.outcomes(), vec![false, false, false, true]);
    let report = simulate(&config, &[1, 2, 3, 1]).unwrap();
    assert_eq!((report.hits, report.misses), (1, 3));
    assert_eq!(recorder.results[2].state, CacheState::Set { index: 0, entries: vec![1, 3] });
}

#[test]
fn arc_single_set_scenario() {
    let recorder = record(&single_set(PolicyKind::Arc), &[1, 2, 1, 3]);
    assert_eq!(recorder.outcomes(), vec![false, false, true, false]);
    assert_eq!(recorder.results[3].state.addresses(), vec![3, 1]);
}

#[test]
fn clock_single_set_scenario() {
    let config = single_set(PolicyKind::Clock);
    let recorder = record(&config, &[1, 2, 1, 3]);
    assert_eq!(recorder.outcomes(), vec![false, false, true, false]);
    assert_eq!(recorder.results[3].state.addresses(), vec![3, 2]);
    let report = simulate(&config, &[1, 2, 1, 3]).unwrap();
    assert_eq!((report.hits, report.misses), (1, 3));
}

#[test]
fn direct_mapped_repeat_is_a_hit() {
    let config = config_for(4, 2, PolicyKind::Lifo, MappingKind::DirectMapped);
    assert_eq!(record(&config, &[5, 5]).outcomes(), vec![false, true]);
    // 9 shares index 1 with 5
    assert_eq!(record(&config, &[5, 9, 5]).outcomes(), vec![false, false, false]);
    // 6 doesn't
    assert_eq!(record(&config, &[5, 6, 5]).outcomes(), vec![false, false, true]);
}

#[test]
fn direct_mapped_state_shows_every_slot() {
    let config = config_for(4, 2, PolicyKind::Arc, MappingKind::DirectMapped);
    let recorder = record(&config, &[1, 6]);
    let state = &recorder.results[1].state;
    assert_eq!(*state, CacheState::Slots(vec![None, Some(1), Some(6), None]));
    assert_eq!(state.to_string(), "[None, 1, 6, None]");
}

#[test]
fn direct_mapped_ignores_associativity() {
    let config = config_for(4, 0, PolicyKind::Lifo, MappingKind::DirectMapped);
    let validated = config.validate().unwrap();
    assert_eq!(validated.sets, 4);
    assert_eq!(validated.associativity, 1);
}

#[test]
fn sets_are_selected_by_modulo() {
    let config = config_for(4, 2, PolicyKind::Lifo, MappingKind::SetAssociative);
    let recorder = record(&config, &[0, 2, 4, 1, 4]);
    assert_eq!(recorder.outcomes(), vec![false, false, false, false, true]);
    assert_eq!(recorder.results[2].state, CacheState::Set { index: 0, entries: vec![0, 4] });
    assert_eq!(recorder.results[3].state, CacheState::Set { index: 1, entries: vec![1] });
}

#[test]
fn sets_are_created_on_first_reference() {
    let config = config_for(8, 2, PolicyKind::Clock, MappingKind::SetAssociative);
    let mut simulator = Simulator::new(&config, NoObserver).unwrap();
    assert_eq!(simulator.get_uninitialised_line_count(), 8);
    simulator.run([3, 7, 3]);
    assert_eq!(simulator.get_uninitialised_line_count(), 6);
}

#[test]
fn truncated_set_count_is_accepted() {
    let validated = config_for(5, 2, PolicyKind::Arc, MappingKind::SetAssociative).validate().unwrap();
    assert_eq!(validated.sets, 2);
}

#[test]
fn zero_sets_is_a_configuration_error() {
    let config = config_for(4, 8, PolicyKind::Lifo, MappingKind::SetAssociative);
    let mut accesses = 0;
    let result = Simulator::new(&config, |_: &AccessResult| accesses += 1);
    assert!(matches!(result, Err(SimulationError::Configuration(_))));
    assert_eq!(accesses, 0);
    assert!(matches!(simulate(&config, &[1, 2, 3]), Err(SimulationError::Configuration(_))));
}

#[test]
fn non_positive_sizes_are_validation_errors() {
    for (size, associativity) in [(0, 2), (-4, 2), (4, 0), (4, -1)] {
        let config = config_for(size, associativity, PolicyKind::Arc, MappingKind::SetAssociative);
        assert!(
            matches!(config.validate(), Err(SimulationError::Validation(_))),
            "size {size}, associativity {associativity}"
        );
    }
    let direct = config_for(0, 1, PolicyKind::Arc, MappingKind::DirectMapped);
    assert!(matches!(direct.validate(), Err(SimulationError::Validation(_))));
}

#[test]
fn unknown_identifiers_are_unsupported() {
    let mut config = SimulationConfig::default();
    config.policy = "LRU".to_string();
    assert!(matches!(config.validate(), Err(SimulationError::UnsupportedPolicy(_))));
    let mut config = SimulationConfig::default();
    config.mapping = "fully-associative".to_string();
    assert!(matches!(config.validate(), Err(SimulationError::UnsupportedPolicy(_))));
    // Identifiers are checked before sizes
    config.size = -1;
    assert!(matches!(config.validate(), Err(SimulationError::UnsupportedPolicy(_))));
}

#[test]
fn identifiers_are_case_insensitive() {
    assert_eq!("clock".parse::<PolicyKind>().unwrap(), PolicyKind::Clock);
    assert_eq!(" Arc ".parse::<PolicyKind>().unwrap(), PolicyKind::Arc);
    assert_eq!("Direct-Mapped".parse::<MappingKind>().unwrap(), MappingKind::DirectMapped);
    assert_eq!("set".parse::<MappingKind>().unwrap(), MappingKind::SetAssociative);
}

#[test]
fn config_defaults_from_json() {
    let config = SimulationConfig::from_json(r#"{"size": 8, "policy": "clock"}"#.as_bytes()).unwrap();
    assert_eq!(config.associativity, 2);
    assert_eq!(config.mapping, "set-associative");
    let validated = config.validate().unwrap();
    assert_eq!(validated.policy, PolicyKind::Clock);
    assert_eq!(validated.sets, 4);
    assert!(matches!(SimulationConfig::from_json("{".as_bytes()), Err(SimulationError::Json(_))));
    assert_eq!(SimulationConfig::default().validate().unwrap().policy, PolicyKind::Lifo);
}

#[test]
fn non_integer_sizes_in_json_are_validation_errors() {
    for document in [r#"{"size": "4"}"#, r#"{"size": 4.5}"#, r#"{"associativity": true}"#] {
        assert!(
            matches!(SimulationConfig::from_json(document.as_bytes()), Err(SimulationError::Validation(_))),
            "{document}"
        );
    }
    let config = SimulationConfig::from_json(r#"{"size": -2}"#.as_bytes()).unwrap();
    assert!(matches!(config.validate(), Err(SimulationError::Validation(_))));
}

#[test]
fn observer_time_is_not_simulation_time() {
    let config = config_for(4, 2, PolicyKind::Lifo, MappingKind::SetAssociative);
    let pause = Duration::from_millis(40);
    let mut simulator = Simulator::new(&config, |_: &AccessResult| thread::sleep(pause)).unwrap();
    simulator.run([1, 2, 3]);
    assert!(*simulator.get_execution_time() < pause, "{:?}", simulator.get_execution_time());
}

#[test]
fn empty_trace_reports_zero() {
    for policy in POLICIES {
        for mapping in MAPPINGS {
            let report = simulate(&config_for(4, 2, policy, mapping), &[]).unwrap();
            assert_eq!((report.hits, report.misses, report.total_accesses), (0, 0, 0));
            assert_eq!(report.hit_ratio, 0.0);
            assert_eq!(report.miss_ratio, 0.0);
        }
    }
}

#[test]
fn ratios_are_fractions_of_total() {
    let config = config_for(4, 2, PolicyKind::Lifo, MappingKind::DirectMapped);
    let report = simulate(&config, &[1, 1, 1, 1]).unwrap();
    assert_eq!((report.hits, report.misses), (3, 1));
    assert_eq!(report.hit_ratio, 0.75);
    assert_eq!(report.miss_ratio, 0.25);
    assert_eq!(
        report.to_string(),
        "Total accesses: 4\nHits: 3\nMisses: 1\nHit Ratio: 75.00%\nMiss Ratio: 25.00%"
    );
}

#[test]
fn observer_sees_accesses_in_order() {
    let config = config_for(4, 4, PolicyKind::Arc, MappingKind::SetAssociative);
    let mut seen = Vec::new();
    let mut simulator = Simulator::new(&config, |r: &AccessResult| seen.push((r.address, r.hit))).unwrap();
    simulator.run([4, 8, 4]);
    drop(simulator);
    assert_eq!(seen, vec![(4, false), (8, false), (4, true)]);
}

#[test]
fn stepwise_access_matches_run() {
    let config = config_for(6, 3, PolicyKind::Clock, MappingKind::SetAssociative);
    let trace = synthetic_trace(200, 20, 7);
    let mut stepped = Simulator::new(&config, NoObserver).unwrap();
    // Stop half way, as a cancelling caller would
    for address in &trace[..100] {
        stepped.access(*address);
    }
    assert_eq!(stepped.stats().total(), 100);
    stepped.run(trace[100..].iter().copied());
    assert_eq!(stepped.report(), simulate(&config, &trace).unwrap());
}

#[test]
fn access_result_display() {
    let result = AccessResult {
        address: 5,
        hit: true,
        state: CacheState::Set { index: 1, entries: vec![1, 5] },
    };
    assert_eq!(result.to_string(), "Access 5: HIT\nCache State: [1, 5]");
}

#[test]
fn looping_trace_defeats_lifo_but_not_a_larger_cache() {
    let trace = looping_trace(100, 4);
    let small = simulate(&config_for(2, 2, PolicyKind::Lifo, MappingKind::SetAssociative), &trace).unwrap();
    let large = simulate(&config_for(4, 4, PolicyKind::Lifo, MappingKind::SetAssociative), &trace).unwrap();
    assert_eq!(large.misses, 4);
    assert!(small.hits < large.hits);
}

#[test]
fn report_serialises_config() {
    let report = simulate(&config_for(4, 2, PolicyKind::Clock, MappingKind::SetAssociative), &[1]).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains(r#""policy":"CLOCK""#));
    assert!(json.contains(r#""mapping":"set-associative""#));
}

#[test]
fn trace_separators() {
    assert_eq!(parse_trace("1,2,3").unwrap(), vec![1, 2, 3]);
    assert_eq!(parse_trace(" 1, 2\n3\t0x1f ,").unwrap(), vec![1, 2, 3, 31]);
    assert_eq!(parse_trace("").unwrap(), Vec::<u64>::new());
    assert_eq!(parse_trace(" \n ").unwrap(), Vec::<u64>::new());
}

#[test]
fn malformed_traces_are_validation_errors() {
    assert!(matches!(parse_trace("1,-2,3"), Err(SimulationError::Validation(_))));
    assert!(matches!(parse_trace("1,two,3"), Err(SimulationError::Validation(_))));
    assert!(matches!(parse_trace("1.5"), Err(SimulationError::Validation(_))));
    assert!(matches!(parse_trace("0xZZ"), Err(SimulationError::Validation(_))));
}

#[test]
fn trace_files_are_parsed() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "10\n11\n10")?;
    file.flush()?;
    assert_eq!(read_trace_file(file.path())?, vec![10, 11, 10]);
    let empty = tempfile::NamedTempFile::new()?;
    assert_eq!(read_trace_file(empty.path())?, Vec::<u64>::new());
    assert!(matches!(read_trace_file("/nonexistent/trace.txt"), Err(SimulationError::Io(_))));
    Ok(())
}

proptest! {
    #[test]
    fn hits_and_misses_cover_every_access(
        trace in prop::collection::vec(0u64..64, 0..200),
        size in 1i64..16,
        associativity in 1i64..16,
        policy in prop::sample::select(POLICIES.to_vec()),
        mapping in prop::sample::select(MAPPINGS.to_vec()),
    ) {
        let config = config_for(size, associativity, policy, mapping);
        prop_assume!(config.validate().is_ok());
        let first = record(&config, &trace);
        let report = simulate(&config, &trace).unwrap();
        prop_assert_eq!(report.hits + report.misses, trace.len() as u64);
        prop_assert_eq!(first.results.len(), trace.len());
        // A fresh simulator replays identically
        let second = record(&config, &trace);
        prop_assert_eq!(first.results, second.results);
    }
}
