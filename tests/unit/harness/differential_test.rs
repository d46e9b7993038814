//! Differential tests: queries checked against their models
//!
//! Every registered case must pass in both modes, deliberately wrong queries
//! must be caught, and repeated runs must agree.

use super::super::common::{test_config, MutatedQuery, RestampedQuery, WrongRateQuery1};
use std::sync::Arc;
use std::time::Duration;
use velomark::velomark::config::NexmarkConfig;
use velomark::velomark::engine::context::TokioExecutionContext;
use velomark::velomark::engine::runner::QueryRunner;
use velomark::velomark::engine::types::ExecutionMode;
use velomark::velomark::harness::registry::ScenarioRegistry;
use velomark::velomark::harness::scenario::{QueryScenario, ScenarioCase, ScenarioOutcome};
use velomark::velomark::harness::verdict::{FailureKind, Verdict};
use velomark::velomark::harness::verifier::Verifier;
use velomark::velomark::models::{BidCountModel, Query1Model, Query3Model, Query7Model};
use velomark::velomark::nexmark::event::{AuctionCount, Bid};
use velomark::velomark::queries::{BidCountPerAuction, Query1, Query3, Query7};

fn runner(name: &str) -> QueryRunner {
    QueryRunner::new(
        Arc::new(TokioExecutionContext::new(name)),
        Duration::from_secs(60),
    )
}

async fn execute(
    case: &dyn ScenarioCase,
    config: &NexmarkConfig,
    mode: ExecutionMode,
) -> ScenarioOutcome {
    case.execute(&runner(case.query_name()), config, mode, &Verifier::default())
        .await
}

fn assert_passed(outcome: &ScenarioOutcome, label: &str) {
    assert!(
        outcome.verdict.is_passed(),
        "{} failed: {:?}",
        label,
        outcome.verdict
    );
}

// ============================================================================
// Registered cases
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_registered_case_passes_in_both_modes() {
    let registry = ScenarioRegistry::nexmark().unwrap();

    for generators in [1, 4] {
        let config = test_config(3000, generators);
        // Known-broken markers are not consulted here: every case runs
        for entry in registry.entries() {
            for mode in ExecutionMode::ALL {
                let outcome = execute(entry.case.as_ref(), &config, mode).await;
                assert_passed(
                    &outcome,
                    &format!("{}/{} with {} generators", entry.name, mode, generators),
                );
            }
        }
    }
}

#[tokio::test]
async fn test_bid_count_passes_at_five_thousand_events() {
    let case = QueryScenario::new(BidCountPerAuction, BidCountModel);

    let single = test_config(5000, 1);
    for mode in ExecutionMode::ALL {
        let outcome = execute(&case, &single, mode).await;
        assert_passed(&outcome, &format!("BidCountPerAuction/{}", mode));
        assert!(outcome.observed_results > 0);
    }

    let parallel = test_config(5000, 4);
    let outcome = execute(&case, &parallel, ExecutionMode::Streaming).await;
    assert_passed(&outcome, "BidCountPerAuction/streaming with 4 generators");
}

#[tokio::test]
async fn test_repeated_execution_gives_same_verdict() {
    let case = QueryScenario::new(Query7, Query7Model);
    let config = test_config(2000, 2);

    let first = execute(&case, &config, ExecutionMode::Streaming).await;
    let second = execute(&case, &config, ExecutionMode::Streaming).await;
    assert_eq!(first, second);
    assert_passed(&first, "Query7/streaming");
}

// ============================================================================
// Mutants
// ============================================================================

#[tokio::test]
async fn test_off_by_one_bid_count_is_caught() {
    let mutant = MutatedQuery::new("OffByOneBidCount", BidCountPerAuction, |c: AuctionCount| {
        AuctionCount {
            count: c.count + 1,
            ..c
        }
    });
    let case = QueryScenario::new(mutant, BidCountModel);
    let config = test_config(2000, 2);

    for mode in ExecutionMode::ALL {
        let outcome = execute(&case, &config, mode).await;
        let failure = outcome
            .verdict
            .failure()
            .unwrap_or_else(|| panic!("mutant passed in {} mode", mode));
        assert_eq!(failure.kind, FailureKind::AssertionMismatch);

        let mismatch = failure.mismatch.as_ref().unwrap();
        assert!(mismatch.unexpected_total > 0);
        assert!(mismatch.notes.iter().any(|n| n.contains("counted")));
    }
}

#[tokio::test]
async fn test_bid_count_stamped_at_epoch_is_caught() {
    let mutant = RestampedQuery::new("EpochBidCount", BidCountPerAuction, 0);
    let case = QueryScenario::new(mutant, BidCountModel);
    let config = test_config(2000, 2);

    for mode in ExecutionMode::ALL {
        let outcome = execute(&case, &config, mode).await;
        let failure = outcome
            .verdict
            .failure()
            .unwrap_or_else(|| panic!("restamped counts passed in {} mode", mode));
        assert_eq!(failure.kind, FailureKind::AssertionMismatch);

        let mismatch = failure.mismatch.as_ref().unwrap();
        assert!(mismatch.unexpected_total > 0);
        assert!(mismatch.notes.iter().any(|n| n.contains("latest bid at")));
    }
}

#[tokio::test]
async fn test_query3_stamped_at_epoch_is_caught() {
    let mutant = RestampedQuery::new("EpochQuery3", Query3, 0);
    let case = QueryScenario::new(mutant, Query3Model);
    let config = test_config(5000, 1);

    for mode in ExecutionMode::ALL {
        let outcome = execute(&case, &config, mode).await;
        assert_eq!(
            outcome.verdict.failure_kind(),
            Some(FailureKind::AssertionMismatch),
            "restamped join passed in {} mode",
            mode
        );
        assert!(outcome.observed_results > 0);
    }
}

#[tokio::test]
async fn test_wrong_exchange_rate_is_caught() {
    let case = QueryScenario::new(WrongRateQuery1, Query1Model);
    let config = test_config(2000, 2);
    let verifier = Verifier::new(5);

    for mode in ExecutionMode::ALL {
        let outcome = case
            .execute(&runner("wrong-rate"), &config, mode, &verifier)
            .await;
        assert_eq!(outcome.verdict.failure_kind(), Some(FailureKind::AssertionMismatch));

        let mismatch = outcome.verdict.failure().unwrap().mismatch.clone().unwrap();
        assert!(mismatch.missing_total > 5);
        assert_eq!(mismatch.missing.len(), 5);
        assert!(mismatch.unexpected.len() <= 5);
        assert_eq!(mismatch.observed_count, outcome.observed_results);
    }
}

#[tokio::test]
async fn test_zeroed_prices_are_caught() {
    // Zeroes the price of bids from even bidder ids
    let mutant = MutatedQuery::new("ZeroedQuery1", Query1, |bid: Bid| {
        if bid.bidder % 2 == 0 {
            Bid { price: 0, ..bid }
        } else {
            bid
        }
    });
    let case = QueryScenario::new(mutant, Query1Model);
    let outcome = execute(&case, &test_config(1000, 1), ExecutionMode::Batch).await;
    assert!(outcome.verdict.is_failed());
}

// ============================================================================
// Invalid configuration
// ============================================================================

#[tokio::test]
async fn test_zero_events_is_invalid_configuration() {
    let registry = ScenarioRegistry::nexmark().unwrap();
    let config = test_config(0, 1);

    for entry in registry.entries() {
        for mode in ExecutionMode::ALL {
            let outcome = execute(entry.case.as_ref(), &config, mode).await;
            assert_eq!(
                outcome.verdict.failure_kind(),
                Some(FailureKind::InvalidConfiguration),
                "{}/{}",
                entry.name,
                mode
            );
            assert_eq!(outcome.observed_results, 0);
        }
    }
}

#[tokio::test]
async fn test_invalid_window_is_invalid_configuration() {
    let mut config = test_config(1000, 1);
    config.window_period_sec = 5;
    config.window_size_sec = 2;

    let case = QueryScenario::new(Query7, Query7Model);
    let outcome = execute(&case, &config, ExecutionMode::Batch).await;
    match outcome.verdict {
        Verdict::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::InvalidConfiguration);
            assert!(failure.message.contains("window"), "{}", failure.message);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}
