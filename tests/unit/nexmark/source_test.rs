//! Tests for the Nexmark source across execution modes

use super::super::common::test_config;
use futures::StreamExt;
use std::collections::BTreeMap;
use velomark::velomark::engine::types::{ExecutionMode, MAX_WATERMARK};
use velomark::velomark::nexmark::event::{Event, EventKind, TimestampedEvent};
use velomark::velomark::nexmark::generator::{EventGenerator, FIRST_AUCTION_ID, FIRST_PERSON_ID};
use velomark::velomark::nexmark::source::{EventSource, NexmarkSource, SourceMessage};

/// Read a streaming feed until every partition reported the final watermark
async fn drain_streaming(events: u64, generators: usize) -> (usize, Vec<TimestampedEvent>) {
    let feed = NexmarkSource::new()
        .open(&test_config(events, generators), ExecutionMode::Streaming)
        .unwrap();
    assert_eq!(feed.expected_events, events);

    let partitions = feed.partitions;
    let mut stream = feed.stream;
    let mut finished = 0;
    let mut delivered = Vec::new();
    while finished < partitions {
        match stream.next().await {
            Some(SourceMessage::Event(event)) => delivered.push(event),
            Some(SourceMessage::Watermark { watermark, .. }) if watermark == MAX_WATERMARK => {
                finished += 1
            }
            Some(SourceMessage::Watermark { .. }) => {}
            None => panic!("streaming feed ended"),
        }
    }
    (partitions, delivered)
}

#[tokio::test]
async fn test_streaming_delivers_every_event_once() {
    let (partitions, mut delivered) = drain_streaming(2000, 4).await;
    assert_eq!(partitions, 4);

    delivered.sort_by_key(|e| e.event_number);
    let expected: Vec<_> = EventGenerator::new(&test_config(2000, 4)).events().collect();
    assert_eq!(delivered, expected);
}

#[tokio::test]
async fn test_streaming_reorders_within_partitions() {
    let (_, delivered) = drain_streaming(2000, 1).await;
    let out_of_order = delivered
        .windows(2)
        .filter(|pair| pair[1].event_number < pair[0].event_number)
        .count();
    assert!(out_of_order > 0, "held-back events should arrive late");
}

#[tokio::test]
async fn test_batch_feed_matches_materialized_sequence() {
    let config = test_config(700, 3);
    let feed = NexmarkSource::new()
        .open(&config, ExecutionMode::Batch)
        .unwrap();
    assert_eq!(feed.partitions, 1);
    assert_eq!(feed.expected_events, 700);

    let events: Vec<_> = feed
        .stream
        .filter_map(|message| async move {
            match message {
                SourceMessage::Event(event) => Some(event),
                SourceMessage::Watermark { .. } => None,
            }
        })
        .collect()
        .await;
    assert_eq!(events, NexmarkSource::materialize(&config).unwrap());
}

#[test]
fn test_event_mix_and_id_ranges() {
    let config = test_config(5000, 4);
    let mut kinds: BTreeMap<EventKind, u64> = BTreeMap::new();
    for e in EventGenerator::new(&config).events() {
        *kinds.entry(e.event.kind()).or_insert(0) += 1;
        match e.event {
            Event::Person(p) => assert!(p.id >= FIRST_PERSON_ID),
            Event::Auction(a) => {
                assert!(a.id >= FIRST_AUCTION_ID);
                assert!(a.seller >= FIRST_PERSON_ID);
                assert!(a.expires > a.date_time);
            }
            Event::Bid(b) => assert!(b.auction >= FIRST_AUCTION_ID),
        }
    }

    assert_eq!(kinds[&EventKind::Person], 100);
    assert_eq!(kinds[&EventKind::Auction], 300);
    assert_eq!(kinds[&EventKind::Bid], 4600);
}

#[test]
fn test_timestamps_spread_by_generator_count() {
    let one = test_config(10, 1);
    let four = test_config(10, 4);
    assert_eq!(one.timestamp_for_event(1) - one.timestamp_for_event(0), 1);
    assert_eq!(four.timestamp_for_event(1) - four.timestamp_for_event(0), 4);
}
