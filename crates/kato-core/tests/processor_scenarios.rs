//! Black-box scenarios driving the public `Processor` surface end to
//! end, against the bundled SQLite-backed collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;

use kato_core::config::{ProcessorConfig, RankSortAlgo};
use kato_core::kb::{KnowledgeBase, SqliteAnnService, SqliteBackend};
use kato_core::processor::{Observation, Processor};
use kato_core::stm::StmMode;

fn processor_with_config(kb_id: &str, config: ProcessorConfig) -> Processor {
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let ann = Arc::new(SqliteAnnService::new(backend.clone()));
    let kb = Arc::new(KnowledgeBase::new(backend.clone(), backend, ann));
    Processor::new(kb, kb_id.to_string(), config, 768)
}

fn obs(strings: &[&str]) -> Observation {
    Observation {
        strings: strings.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn obs_with_emotive(strings: &[&str], key: &str, value: f32) -> Observation {
    let mut emotives = BTreeMap::new();
    emotives.insert(key.to_string(), value);
    Observation {
        strings: strings.iter().map(|s| s.to_string()).collect(),
        emotives,
        ..Default::default()
    }
}

#[test]
fn basic_prediction_splits_past_present_future_with_correct_metrics() {
    let mut p = processor_with_config(
        "demoA",
        ProcessorConfig {
            recall_threshold: 0.1,
            ..Default::default()
        },
    );

    p.observe(obs(&["coffee", "morning"])).unwrap();
    p.observe(obs(&["commute", "train"])).unwrap();
    p.observe(obs(&["arrive", "work"])).unwrap();
    let name = p.learn().unwrap();
    assert!(name.is_some());

    p.clear_stm();
    p.observe(obs(&["commute", "train"])).unwrap();

    let predictions = p.get_predictions().unwrap();
    assert_eq!(predictions.len(), 1);
    let pred = &predictions[0];
    assert_eq!(pred.name, name.unwrap());
    assert_eq!(pred.past, vec![vec!["coffee".to_string(), "morning".to_string()]]);
    assert_eq!(pred.present, vec![vec!["commute".to_string(), "train".to_string()]]);
    assert_eq!(pred.future, vec![vec!["arrive".to_string(), "work".to_string()]]);
    assert!(pred.missing.is_empty());
    assert!(pred.extras.is_empty());
    assert_eq!(pred.metrics.evidence, 1.0 / 3.0);
    assert_eq!(pred.metrics.confidence, 1.0);
    assert_eq!(pred.metrics.snr, 1.0);
    assert_eq!(pred.metrics.fragmentation, 0);
}

#[test]
fn relearning_the_same_sequence_is_content_addressed_dedup() {
    let mut p = processor_with_config("demoB", ProcessorConfig::default());

    p.observe(obs(&["a"])).unwrap();
    p.observe(obs(&["b"])).unwrap();
    p.observe(obs(&["c"])).unwrap();
    let n1 = p.learn().unwrap().unwrap();

    p.clear_stm();
    p.observe(obs(&["a"])).unwrap();
    p.observe(obs(&["b"])).unwrap();
    p.observe(obs(&["c"])).unwrap();
    let n2 = p.learn().unwrap().unwrap();

    assert_eq!(n1, n2);
    let pattern = p.get_pattern(n1.trim_start_matches("PTRN|")).unwrap();
    assert_eq!(pattern.freq, 2);
}

#[test]
fn emotives_window_keeps_only_the_last_persistence_snapshots() {
    let mut p = processor_with_config(
        "demoC",
        ProcessorConfig {
            persistence: 3,
            ..Default::default()
        },
    );

    let mut name = None;
    for value in [0.1_f32, 0.2, 0.3, 0.4, 0.5] {
        p.clear_stm();
        p.observe(obs_with_emotive(&["a"], "x", value)).unwrap();
        p.observe(obs(&["b"])).unwrap();
        name = p.learn().unwrap();
    }

    let pattern = p.get_pattern(name.unwrap().trim_start_matches("PTRN|")).unwrap();
    assert_eq!(pattern.freq, 5);
    assert_eq!(pattern.emotives_window.len(), 3);
    let values: Vec<f32> = pattern
        .emotives_window
        .iter()
        .map(|snapshot| snapshot["x"])
        .collect();
    assert_eq!(values, vec![0.3, 0.4, 0.5]);
}

#[test]
fn auto_learn_in_rolling_mode_learns_one_pattern_per_observation_past_the_window() {
    let mut p = processor_with_config(
        "demoD",
        ProcessorConfig {
            max_pattern_length: 3,
            stm_mode: StmMode::Rolling,
            ..Default::default()
        },
    );

    for letter in ["a", "b", "c", "d", "e"] {
        p.observe(obs(&[letter])).unwrap();
    }

    assert_eq!(p.get_status().unwrap().pattern_count, 3);
    assert_eq!(p.get_stm().len(), 2);
}

#[test]
fn separate_kb_ids_are_fully_isolated() {
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let ann = Arc::new(SqliteAnnService::new(backend.clone()));
    let kb = Arc::new(KnowledgeBase::new(backend.clone(), backend, ann));

    let mut tenant1 = Processor::new(kb.clone(), "tenant1".to_string(), ProcessorConfig::default(), 768);
    tenant1.observe(obs(&["a", "b"])).unwrap();
    tenant1.learn().unwrap();

    let mut tenant2 = Processor::new(kb, "tenant2".to_string(), ProcessorConfig::default(), 768);
    tenant2.observe(obs(&["a", "b"])).unwrap();

    assert_eq!(tenant2.get_status().unwrap().pattern_count, 0);
    assert!(tenant2.get_predictions().unwrap().is_empty());
}

#[test]
fn ranking_by_similarity_breaks_ties_on_frequency() {
    let mut p = processor_with_config(
        "demoF",
        ProcessorConfig {
            recall_threshold: 0.0,
            rank_sort_algo: RankSortAlgo::Similarity,
            ..Default::default()
        },
    );

    // Two patterns sharing a long common prefix (high similarity against
    // the shared STM) but diverging in their final event, learned with
    // different frequencies.
    let prefix = ["m1", "m2", "m3", "m4"];
    for _ in 0..5 {
        p.clear_stm();
        for step in prefix {
            p.observe(obs(&[step])).unwrap();
        }
        p.observe(obs(&["future-a"])).unwrap();
        p.learn().unwrap();
    }
    for _ in 0..2 {
        p.clear_stm();
        for step in prefix {
            p.observe(obs(&[step])).unwrap();
        }
        p.observe(obs(&["future-b"])).unwrap();
        p.learn().unwrap();
    }

    p.clear_stm();
    for step in prefix {
        p.observe(obs(&[step])).unwrap();
    }

    let predictions = p.get_predictions().unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].metrics.similarity, predictions[1].metrics.similarity);
    assert!(predictions[0].frequency > predictions[1].frequency);
}
