mod common;

use common::{conversation_from, steady_exchange, text_message, T0};
use pretty_assertions::assert_eq;

use chatmap::{analyze, AnalysisConfig};

#[test]
fn analysis_is_byte_identical_across_runs() {
    let conv = steady_exchange(30, 20);
    let config = AnalysisConfig::default();

    let first = serde_json::to_vec(&analyze(&conv, &config)).unwrap();
    let second = serde_json::to_vec(&analyze(&conv, &config)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn chronological_invariant_holds_after_decoding() {
    let conv = steady_exchange(10, 10);
    assert!(conv
        .messages
        .windows(2)
        .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    let indexes: Vec<usize> = conv.messages.iter().map(|m| m.index).collect();
    assert_eq!(indexes, (0..conv.messages.len()).collect::<Vec<_>>());
}

#[test]
fn per_person_totals_conserve_the_metadata_count() {
    let conv = steady_exchange(14, 9);
    let analysis = analyze(&conv, &AnalysisConfig::default());

    let engagement = analysis.engagement.expect("engagement present");
    let sum: usize = engagement.per_person.iter().map(|p| p.total_messages).sum();
    assert_eq!(sum, conv.metadata.total_messages);
}

#[test]
fn steady_exchange_produces_the_full_bundle_set() {
    let conv = steady_exchange(60, 30);
    let analysis = analyze(&conv, &AnalysisConfig::default());

    assert!(analysis.timing.is_some());
    assert!(analysis.engagement.is_some());
    assert!(analysis.patterns.is_some());
    assert!(analysis.trends.is_some());
    assert!(analysis.heatmap.is_some());
    assert!(analysis.bids.is_some());
    assert!(analysis.chronotype.is_some());
    assert!(analysis.response_distribution.is_some());
    assert!(analysis.reciprocity.is_some());
    assert!(analysis.rankings.is_some());
    assert!(analysis.milestones.is_some());
    assert!(analysis.viral.is_some());
    // Two participants: the network bundle stays absent.
    assert!(analysis.network.is_none());
}

#[test]
fn timing_outlier_shows_as_slowest_but_not_in_trimmed_mean() {
    let mut messages = Vec::new();
    // Forty quick exchanges...
    for i in 0..40i64 {
        messages.push(text_message("Anna", "ping?", T0 + i * 7_200_000));
        messages.push(text_message(
            "Bartek",
            "pong, all good here",
            T0 + i * 7_200_000 + 60_000,
        ));
    }
    // ...then one reply after a 5-hour gap (still within the session window).
    messages.push(text_message("Anna", "hello again?", T0 + 41 * 7_200_000));
    messages.push(text_message(
        "Bartek",
        "sorry, fell asleep",
        T0 + 41 * 7_200_000 + 5 * 3_600_000,
    ));
    let conv = conversation_from(messages);

    let analysis = analyze(&conv, &AnalysisConfig::default());
    let timing = analysis.timing.expect("timing present");
    let bartek = timing.person("Bartek").expect("Bartek timed");

    assert_eq!(bartek.slowest_response_ms, 5.0 * 3_600_000.0);
    assert!(bartek.trimmed_mean_ms < 120_000.0);
    assert!(bartek.p95_ms < 120_000.0);
}

#[test]
fn empty_like_conversations_still_succeed() {
    let conv = conversation_from(vec![text_message("Anna", "hello", T0)]);
    let analysis = analyze(&conv, &AnalysisConfig::default());

    assert_eq!(analysis.metadata.total_messages, 1);
    assert!(analysis.timing.is_none());
    assert!(analysis.bids.is_none());
    assert!(analysis.engagement.is_some());
}
