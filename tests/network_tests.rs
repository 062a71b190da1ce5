mod common;

use common::{text_message, T0};

use chatmap::{accumulate, analyze, AnalysisConfig, Platform};
use chatmap::decoders::finalize;
use chatmap::derivers::network;

#[test]
fn two_person_conversations_carry_no_network_bundle() {
    let messages = vec![
        text_message("Anna", "hey", T0),
        text_message("Bartek", "hi", T0 + 1_000),
    ];
    let conv = finalize(Platform::Telegram, "t".into(), vec![], messages, 1).unwrap();
    let analysis = analyze(&conv, &AnalysisConfig::default());
    assert!(analysis.network.is_none());
}

#[test]
fn fully_mutually_replying_group_reaches_density_one() {
    // Round-robin so every ordered pair appears as (responder, sender).
    let people = ["Anna", "Bartek", "Celina"];
    let mut messages = Vec::new();
    for round in 0..6i64 {
        for (i, person) in people.iter().enumerate() {
            let ts = T0 + round * 600_000 + i as i64 * 60_000;
            messages.push(text_message(person, "group things", ts));
        }
    }
    let conv = finalize(Platform::Telegram, "group".into(), vec![], messages, 1).unwrap();
    let acc = accumulate(&conv, &AnalysisConfig::default());
    let graph = network::derive(&acc).expect("network for a 3-person group");

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
    assert!((graph.density - 1.0).abs() < 1e-9);
}

#[test]
fn hub_and_spoke_group_has_partial_density() {
    // Bartek and Celina only ever talk to Anna, never to each other.
    let mut messages = Vec::new();
    for round in 0..10i64 {
        let base = T0 + round * 600_000;
        messages.push(text_message("Anna", "checking in", base));
        messages.push(text_message("Bartek", "here", base + 60_000));
        messages.push(text_message("Anna", "and you?", base + 120_000));
        messages.push(text_message("Celina", "also here", base + 180_000));
    }
    let conv = finalize(Platform::Telegram, "group".into(), vec![], messages, 1).unwrap();
    let acc = accumulate(&conv, &AnalysisConfig::default());
    let graph = network::derive(&acc).expect("network present");

    assert_eq!(graph.most_connected, "Anna");
    assert!((graph.density - (2.0 / 3.0)).abs() < 1e-9);
}
