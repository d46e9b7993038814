//! Tests for QueryRunner
//!
//! Covers batch/streaming agreement of every query, job cleanup and how
//! failing, panicking and stalled jobs surface to the caller.

use super::super::common::{
    test_config, FailingQuery, PanickingQuery, StalledExecutionContext,
};
use std::sync::Arc;
use std::time::Duration;
use velomark::velomark::config::NexmarkConfig;
use velomark::velomark::engine::context::{ExecutionContext, TokioExecutionContext};
use velomark::velomark::engine::operator::QueryDefinition;
use velomark::velomark::engine::runner::QueryRunner;
use velomark::velomark::engine::types::{ExecutionMode, ResultValue, TimestampedResult};
use velomark::velomark::error::{HarnessError, HarnessResult};
use velomark::velomark::nexmark::source::NexmarkSource;
use velomark::velomark::queries::{BidCountPerAuction, Query1, Query2, Query3, Query5, Query7};

async fn run_sorted<T: ResultValue>(
    query: &dyn QueryDefinition<T>,
    config: &NexmarkConfig,
    mode: ExecutionMode,
) -> HarnessResult<Vec<TimestampedResult<T>>> {
    let runner = QueryRunner::new(
        Arc::new(TokioExecutionContext::new("runner-test")),
        Duration::from_secs(30),
    );
    let mut results = runner.run(query, &NexmarkSource::new(), config, mode).await?;
    results.sort();
    Ok(results)
}

/// Both modes must produce the same multiset, timestamps included
async fn assert_mode_invariant<T: ResultValue>(
    query: &dyn QueryDefinition<T>,
    config: &NexmarkConfig,
) -> usize {
    let batch = run_sorted(query, config, ExecutionMode::Batch).await.unwrap();
    let streaming = run_sorted(query, config, ExecutionMode::Streaming)
        .await
        .unwrap();
    assert_eq!(
        batch.len(),
        streaming.len(),
        "{}: batch and streaming result counts differ",
        query.name()
    );
    assert_eq!(batch, streaming, "{}: results differ between modes", query.name());
    batch.len()
}

// ============================================================================
// Mode invariance
// ============================================================================

#[tokio::test]
async fn test_query1_mode_invariant() {
    for generators in [1, 4] {
        let produced = assert_mode_invariant(&Query1, &test_config(3000, generators)).await;
        assert!(produced > 0);
    }
}

#[tokio::test]
async fn test_query2_mode_invariant() {
    for generators in [1, 4] {
        assert_mode_invariant(&Query2, &test_config(3000, generators)).await;
    }
}

#[tokio::test]
async fn test_query3_mode_invariant() {
    for generators in [1, 4] {
        assert_mode_invariant(&Query3, &test_config(3000, generators)).await;
    }
}

#[tokio::test]
async fn test_query5_mode_invariant() {
    for generators in [1, 4] {
        let produced = assert_mode_invariant(&Query5, &test_config(3000, generators)).await;
        assert!(produced > 0);
    }
}

#[tokio::test]
async fn test_query7_mode_invariant() {
    for generators in [1, 4] {
        let produced = assert_mode_invariant(&Query7, &test_config(3000, generators)).await;
        assert!(produced > 0);
    }
}

#[tokio::test]
async fn test_bid_count_mode_invariant() {
    for generators in [1, 4] {
        let produced =
            assert_mode_invariant(&BidCountPerAuction, &test_config(3000, generators)).await;
        assert!(produced > 0);
    }
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let config = test_config(2000, 3);
    let first = run_sorted(&Query7, &config, ExecutionMode::Streaming)
        .await
        .unwrap();
    let second = run_sorted(&Query7, &config, ExecutionMode::Streaming)
        .await
        .unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Job lifecycle
// ============================================================================

#[tokio::test]
async fn test_streaming_job_released_after_quiescence() {
    let context = Arc::new(TokioExecutionContext::new("release"));
    let runner = QueryRunner::new(context.clone(), Duration::from_secs(30));

    let results = runner
        .run(
            &Query1,
            &NexmarkSource::new(),
            &test_config(1000, 2),
            ExecutionMode::Streaming,
        )
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(context.active_jobs(), 0);
}

#[tokio::test]
async fn test_invalid_config_rejected_before_submit() {
    let context = Arc::new(TokioExecutionContext::new("invalid"));
    let runner = QueryRunner::new(context.clone(), Duration::from_secs(5));

    for mode in ExecutionMode::ALL {
        let err = runner
            .run(&Query1, &NexmarkSource::new(), &test_config(0, 1), mode)
            .await
            .unwrap_err();
        assert!(
            matches!(err, HarnessError::InvalidConfiguration { .. }),
            "unexpected error in {} mode: {:?}",
            mode,
            err
        );
    }
    assert_eq!(context.active_jobs(), 0);
}

#[tokio::test]
async fn test_oversized_delay_rejected_before_streaming() {
    let context = Arc::new(TokioExecutionContext::new("oversized-delay"));
    let runner = QueryRunner::new(context.clone(), Duration::from_secs(5));
    let mut config = test_config(500, 2);
    config.occasional_delay_ms = i64::MAX;

    let err = runner
        .run(&Query1, &NexmarkSource::new(), &config, ExecutionMode::Streaming)
        .await
        .unwrap_err();
    match err {
        HarnessError::InvalidConfiguration { field, .. } => {
            assert_eq!(field.as_deref(), Some("occasional_delay_ms"));
        }
        other => panic!("expected invalid configuration, got {:?}", other),
    }
    assert_eq!(context.active_jobs(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_operator_error_is_engine_failure() {
    let context = Arc::new(TokioExecutionContext::new("failing"));
    let runner = QueryRunner::new(context.clone(), Duration::from_secs(30));

    for mode in ExecutionMode::ALL {
        let err = runner
            .run(
                &FailingQuery { fail_after: 10 },
                &NexmarkSource::new(),
                &test_config(500, 2),
                mode,
            )
            .await
            .unwrap_err();
        match err {
            HarnessError::EngineFailure {
                message,
                query_name,
                ..
            } => {
                assert_eq!(query_name, "FailingQuery");
                assert!(message.contains("refusing event 10"), "{}", message);
            }
            other => panic!("expected engine failure in {} mode, got {:?}", mode, other),
        }
    }
    assert_eq!(context.active_jobs(), 0);
}

#[tokio::test]
async fn test_operator_panic_is_engine_failure() {
    let context = Arc::new(TokioExecutionContext::new("panicking"));
    let runner = QueryRunner::new(context.clone(), Duration::from_secs(30));

    for mode in ExecutionMode::ALL {
        let err = runner
            .run(
                &PanickingQuery,
                &NexmarkSource::new(),
                &test_config(500, 2),
                mode,
            )
            .await
            .unwrap_err();
        match err {
            HarnessError::EngineFailure { message, .. } => {
                assert!(message.contains("panicked"), "{}", message);
                assert!(message.contains("cannot handle bid"), "{}", message);
            }
            other => panic!("expected engine failure in {} mode, got {:?}", mode, other),
        }
    }
    assert_eq!(context.active_jobs(), 0);
}

#[tokio::test]
async fn test_stalled_context_times_out_and_releases_job() {
    let context = Arc::new(StalledExecutionContext::default());
    let runner = QueryRunner::new(context.clone(), Duration::from_millis(200));

    for mode in ExecutionMode::ALL {
        let err = runner
            .run(&Query1, &NexmarkSource::new(), &test_config(500, 1), mode)
            .await
            .unwrap_err();
        match err {
            HarnessError::Timeout {
                operation,
                timeout_ms,
                ..
            } => {
                let expected = match mode {
                    ExecutionMode::Batch => "await_completion",
                    ExecutionMode::Streaming => "await_quiescence",
                };
                assert_eq!(operation, expected);
                assert_eq!(timeout_ms, 200);
            }
            other => panic!("expected timeout in {} mode, got {:?}", mode, other),
        }
        assert_eq!(context.active_jobs(), 0);
    }
}
